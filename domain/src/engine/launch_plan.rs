//! Launch plan: variant, layer offload and the engine argument vector.
//!
//! The engine is always started with the same argument surface, in a fixed
//! order:
//!
//! ```text
//! -m <model> --threads N --ctx-size N --batch-size N --n-predict <ctx> --n-gpu-layers N [--flash-attn]
//! ```
//!
//! The prediction cap always mirrors the context size.

use super::load_request::LoadRequest;
use super::variant::EngineVariant;

/// Layer count meaning "offload as many layers as the accelerator holds".
pub const MAX_OFFLOAD_LAYERS: u32 = 999;

/// Compute how many layers the engine should offload.
///
/// - no usable accelerator (not requested, or not present): `0`
/// - accelerator with a positive requested count: that count
/// - accelerator with a zero count: [`MAX_OFFLOAD_LAYERS`]
pub fn effective_gpu_layers(request: &LoadRequest, has_accelerator: bool) -> u32 {
    if !(request.use_accelerator && has_accelerator) {
        return 0;
    }
    match u32::try_from(request.gpu_layer_count) {
        Ok(layers) if layers > 0 => layers,
        _ => MAX_OFFLOAD_LAYERS,
    }
}

/// Everything the launcher needs, minus where the executable lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub variant: EngineVariant,
    pub gpu_layers: u32,
    pub args: Vec<String>,
}

impl LaunchPlan {
    /// Resolve the plan for a request.
    ///
    /// `has_accelerator` is the probe result; it only matters when the
    /// request asked for acceleration.
    pub fn resolve(request: &LoadRequest, has_accelerator: bool) -> Self {
        let accelerated = request.use_accelerator && has_accelerator;
        let variant = EngineVariant::select(accelerated);
        let gpu_layers = effective_gpu_layers(request, has_accelerator);
        let args = build_args(request, gpu_layers);

        Self {
            variant,
            gpu_layers,
            args,
        }
    }

    /// Render the arguments as a single shell-like line for logs.
    pub fn display_args(&self) -> String {
        self.args.join(" ")
    }
}

fn build_args(request: &LoadRequest, gpu_layers: u32) -> Vec<String> {
    let mut args = vec![
        "-m".to_string(),
        request.model_path.to_string_lossy().into_owned(),
        "--threads".to_string(),
        request.thread_count.to_string(),
        "--ctx-size".to_string(),
        request.context_size.to_string(),
        "--batch-size".to_string(),
        request.batch_size.to_string(),
        "--n-predict".to_string(),
        request.context_size.to_string(),
        "--n-gpu-layers".to_string(),
        gpu_layers.to_string(),
    ];
    if request.use_flash_attention {
        args.push("--flash-attn".to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline_request() -> LoadRequest {
        LoadRequest::new("m.gguf")
            .with_threads(4)
            .with_gpu_layers(0)
            .with_context_size(2048)
            .with_batch_size(512)
    }

    #[test]
    fn test_baseline_plan_argument_vector() {
        let plan = LaunchPlan::resolve(&baseline_request(), false);
        assert_eq!(plan.variant, EngineVariant::Baseline);
        assert_eq!(
            plan.display_args(),
            "-m m.gguf --threads 4 --ctx-size 2048 --batch-size 512 --n-predict 2048 --n-gpu-layers 0"
        );
        assert!(!plan.args.iter().any(|a| a == "--flash-attn"));
    }

    #[test]
    fn test_flash_attention_flag_is_last() {
        let request = baseline_request().with_flash_attention(true);
        let plan = LaunchPlan::resolve(&request, false);
        assert_eq!(plan.args.last().map(String::as_str), Some("--flash-attn"));
    }

    #[test]
    fn test_accelerator_with_explicit_layers() {
        let request = baseline_request().with_accelerator(true).with_gpu_layers(35);
        let plan = LaunchPlan::resolve(&request, true);
        assert_eq!(plan.variant, EngineVariant::Accelerated);
        assert_eq!(plan.gpu_layers, 35);
    }

    #[test]
    fn test_accelerator_without_layers_uses_sentinel() {
        let request = baseline_request().with_accelerator(true);
        let plan = LaunchPlan::resolve(&request, true);
        assert_eq!(plan.gpu_layers, MAX_OFFLOAD_LAYERS);
        assert!(plan.display_args().contains("--n-gpu-layers 999"));
    }

    #[test]
    fn test_accelerator_requested_but_absent_forces_baseline() {
        let request = baseline_request().with_accelerator(true).with_gpu_layers(40);
        let plan = LaunchPlan::resolve(&request, false);
        assert_eq!(plan.variant, EngineVariant::Baseline);
        assert_eq!(plan.gpu_layers, 0);
    }

    #[test]
    fn test_accelerator_present_but_not_requested() {
        let request = baseline_request().with_gpu_layers(40);
        let plan = LaunchPlan::resolve(&request, true);
        assert_eq!(plan.variant, EngineVariant::Baseline);
        assert_eq!(plan.gpu_layers, 0);
    }

    #[test]
    fn test_prediction_cap_follows_context_size() {
        let request = baseline_request().with_context_size(8192);
        let plan = LaunchPlan::resolve(&request, false);
        let idx = plan.args.iter().position(|a| a == "--n-predict").unwrap();
        assert_eq!(plan.args[idx + 1], "8192");
    }
}
