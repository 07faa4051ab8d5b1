use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use whisper_rs::WhisperContext;

use crate::{Error, Result};
use crate::model::{ModelLoader, Transcriber};
use crate::record::AudioRecord;

mod ctx;
mod logging;
mod segments;

use segments::transcribe_text;

/// Sample rate whisper.cpp expects its input at (Hz).
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Loads one whisper.cpp model per transcription worker.
#[derive(Debug, Clone)]
pub struct WhisperLoader {
    model_path: PathBuf,
    use_gpu: bool,
    threads: usize,
}

impl WhisperLoader {
    /// Validate the model path; nothing is loaded until a worker asks for it.
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.is_file() {
            return Err(Error::msg(format!(
                "whisper model not found at '{}'",
                model_path.display()
            )));
        }
        Ok(Self {
            model_path: model_path.to_path_buf(),
            use_gpu: true,
            threads: num_cpus::get(),
        })
    }

    /// Run on the CPU instead of binding each worker to an accelerator.
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }

    /// Inference threads per worker.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }
}

impl ModelLoader for WhisperLoader {
    type Model = WhisperTranscriber;

    fn load(&self, device: usize) -> Result<WhisperTranscriber> {
        let model_path = self
            .model_path
            .to_str()
            .ok_or_else(|| anyhow!("model path is not valid UTF-8: {}", self.model_path.display()))?;
        let ctx = ctx::get_context(model_path, device, self.use_gpu)?;
        Ok(WhisperTranscriber {
            ctx,
            threads: self.threads,
        })
    }
}

/// Transcriber backed by `whisper-rs` / `whisper.cpp`.
pub struct WhisperTranscriber {
    ctx: WhisperContext,
    threads: usize,
}

impl WhisperTranscriber {
    /// Access the underlying Whisper context.
    pub fn context(&self) -> &WhisperContext {
        &self.ctx
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&mut self, record: &AudioRecord, language: &str) -> Result<String> {
        if record.sample_rate != WHISPER_SAMPLE_RATE {
            return Err(Error::msg(format!(
                "expected {WHISPER_SAMPLE_RATE} Hz audio for '{}', got {} Hz",
                record.uuid, record.sample_rate
            )));
        }

        let samples = record.audio.to_mono();
        if samples.is_empty() {
            return Ok(String::new());
        }

        let text = transcribe_text(&self.ctx, language, self.threads, &samples)
            .with_context(|| format!("failed to transcribe '{}'", record.uuid))?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_is_rejected_before_any_worker_starts() {
        let err = WhisperLoader::new("/nonexistent/ggml-large-v3.bin").unwrap_err();
        assert!(err.to_string().contains("ggml-large-v3.bin"));
    }
}
