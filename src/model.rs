use crate::Result;
use crate::record::AudioRecord;

/// Perceptual quality predictor (MOS-like score).
///
/// An instance is owned by a single worker and bound to that worker's device, so methods take
/// `&mut self` and implementations need not be thread-safe.
pub trait QualityScorer {
    /// Score mono `f32` audio in `[-1.0, 1.0]` sampled at `sample_rate`.
    fn score(&mut self, audio: &[f32], sample_rate: u32) -> Result<f64>;
}

/// Speech-to-text model used to regenerate transcriptions.
pub trait Transcriber {
    /// Produce a transcription for `record`, constrained to `language` (e.g. `"ja"`).
    ///
    /// Implementations normalize the record's audio themselves (see
    /// [`crate::audio::AudioBuffer::to_mono`]) so passthrough implementations never pay for it.
    fn transcribe(&mut self, record: &AudioRecord, language: &str) -> Result<String>;
}

/// Builds one model instance per worker.
///
/// `load(device)` is called on the worker's own thread with the worker index, which is also
/// the accelerator index that worker is bound to. Closures of the shape
/// `Fn(usize) -> Result<M>` implement this trait, which keeps tests and ad-hoc wiring short.
pub trait ModelLoader: Sync {
    type Model;

    fn load(&self, device: usize) -> Result<Self::Model>;
}

impl<F, M> ModelLoader for F
where
    F: Fn(usize) -> Result<M> + Sync,
{
    type Model = M;

    fn load(&self, device: usize) -> Result<M> {
        self(device)
    }
}

/// Transcriber that returns the dataset's own transcription verbatim.
///
/// Used when transcription is skipped; it also serves as its own [`ModelLoader`], so no model
/// is ever loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Transcriber for Passthrough {
    fn transcribe(&mut self, record: &AudioRecord, _language: &str) -> Result<String> {
        Ok(record.text.clone())
    }
}

impl ModelLoader for Passthrough {
    type Model = Passthrough;

    fn load(&self, _device: usize) -> Result<Passthrough> {
        Ok(Passthrough)
    }
}
