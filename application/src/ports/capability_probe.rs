//! Accelerator capability probe port
//!
//! Answers one question: is a compatible accelerator present on this host?

use async_trait::async_trait;

/// Port for detecting a usable accelerator.
///
/// Implementations must never fail visibly: a missing probing tool, a spawn
/// error, a non-zero exit or a timeout all resolve to `false`.
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    async fn probe(&self) -> bool;
}

/// Probe with a fixed answer, for tests and `--no-gpu` style overrides.
pub struct FixedProbe(pub bool);

#[async_trait]
impl CapabilityProbe for FixedProbe {
    async fn probe(&self) -> bool {
        self.0
    }
}
