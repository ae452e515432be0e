//! Engine binary variant selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which build of the engine executable to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineVariant {
    /// Build with accelerator (GPU) offload support
    Accelerated,
    /// CPU-only build
    Baseline,
}

impl EngineVariant {
    /// Two-way switch: accelerated only when an accelerator is usable.
    pub fn select(has_accelerator: bool) -> Self {
        if has_accelerator {
            EngineVariant::Accelerated
        } else {
            EngineVariant::Baseline
        }
    }

    /// Directory name of this variant under the runtimes folder.
    pub fn dir_name(&self) -> &'static str {
        match self {
            EngineVariant::Accelerated => "gpu",
            EngineVariant::Baseline => "cpu",
        }
    }

    pub fn is_accelerated(&self) -> bool {
        matches!(self, EngineVariant::Accelerated)
    }
}

impl fmt::Display for EngineVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineVariant::Accelerated => write!(f, "accelerated"),
            EngineVariant::Baseline => write!(f, "baseline"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select() {
        assert_eq!(EngineVariant::select(true), EngineVariant::Accelerated);
        assert_eq!(EngineVariant::select(false), EngineVariant::Baseline);
    }

    #[test]
    fn test_dir_names() {
        assert_eq!(EngineVariant::Accelerated.dir_name(), "gpu");
        assert_eq!(EngineVariant::Baseline.dir_name(), "cpu");
    }
}
