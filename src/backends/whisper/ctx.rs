use anyhow::{Context, Result};
use whisper_rs::{WhisperContext, WhisperContextParameters};

use super::logging::init_whisper_logging;

/// Load a Whisper model onto `device` and return an initialized `WhisperContext`.
pub fn get_context(model_path: &str, device: usize, use_gpu: bool) -> Result<WhisperContext> {
    init_whisper_logging();

    let gpu_device = i32::try_from(device).context("device index out of range")?;

    let mut ctx_params = WhisperContextParameters::default();
    ctx_params.use_gpu(use_gpu);
    ctx_params.gpu_device(gpu_device);

    let ctx = WhisperContext::new_with_params(model_path, ctx_params)
        .with_context(|| format!("failed to load model from path: {model_path} (device {device})"))?;

    Ok(ctx)
}
