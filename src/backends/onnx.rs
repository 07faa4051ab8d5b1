use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use ort::ep;
use ort::session::{Session, SessionInputValue};
use ort::tensor::TensorElementType;
use ort::value::{Tensor, ValueType};

use crate::model::{ModelLoader, QualityScorer};
use crate::{Error, Result};

/// Loads one ONNX quality model (e.g. an exported UTMOS predictor) per worker.
///
/// Expected model shape:
/// - first input: `f32` audio, `[batch=1, samples]`
/// - optional second input: the sample rate as an `int64`/`int32` scalar
/// - first output: the score (if it has several elements, e.g. per-frame, they are averaged)
#[derive(Debug, Clone)]
pub struct OnnxScorerLoader {
    model_path: PathBuf,
    use_gpu: bool,
}

impl OnnxScorerLoader {
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.is_file() {
            return Err(Error::msg(format!(
                "quality model not found at '{}'",
                model_path.display()
            )));
        }
        Ok(Self {
            model_path: model_path.to_path_buf(),
            use_gpu: true,
        })
    }

    /// Run on the CPU instead of binding each worker to a CUDA device.
    pub fn with_gpu(mut self, use_gpu: bool) -> Self {
        self.use_gpu = use_gpu;
        self
    }
}

impl ModelLoader for OnnxScorerLoader {
    type Model = OnnxScorer;

    fn load(&self, device: usize) -> Result<OnnxScorer> {
        let mut builder = Session::builder().context("failed to create ONNX Runtime session builder")?;

        if self.use_gpu {
            let device_id = i32::try_from(device).context("device index out of range")?;
            builder = builder
                .with_execution_providers([ep::CUDA::default().with_device_id(device_id).build()])
                .context("failed to register CUDA execution provider")?;
        }

        let session = builder.commit_from_file(&self.model_path).with_context(|| {
            format!(
                "failed to load quality model from '{}' (device {device})",
                self.model_path.display()
            )
        })?;

        let sample_rate_input = sample_rate_input(&session)?;
        Ok(OnnxScorer {
            session,
            sample_rate_input,
        })
    }
}

/// Quality scorer running on ONNX Runtime.
pub struct OnnxScorer {
    session: Session,
    sample_rate_input: Option<(String, TensorElementType)>,
}

impl QualityScorer for OnnxScorer {
    fn score(&mut self, audio: &[f32], sample_rate: u32) -> Result<f64> {
        if audio.is_empty() {
            return Err(Error::msg("cannot score an empty clip"));
        }

        let mut inputs: Vec<(String, SessionInputValue<'static>)> = Vec::with_capacity(2);

        let audio_name = self
            .session
            .inputs()
            .first()
            .map(|input| input.name().to_owned())
            .ok_or_else(|| anyhow!("quality model has no inputs"))?;
        let wav = Tensor::from_array(([1usize, audio.len()], audio.to_vec().into_boxed_slice()))
            .context("failed to build audio tensor ([1, samples])")?;
        inputs.push((audio_name, SessionInputValue::from(wav)));

        if let Some((name, ty)) = &self.sample_rate_input {
            let sr = match ty {
                TensorElementType::Int64 => SessionInputValue::from(
                    Tensor::from_array(((), vec![i64::from(sample_rate)].into_boxed_slice()))
                        .context("failed to build sample-rate tensor")?,
                ),
                _ => SessionInputValue::from(
                    Tensor::from_array(((), vec![sample_rate as i32].into_boxed_slice()))
                        .context("failed to build sample-rate tensor")?,
                ),
            };
            inputs.push((name.clone(), sr));
        }

        let outputs = self
            .session
            .run(inputs)
            .context("failed to run quality model")?;
        if outputs.len() == 0 {
            return Err(Error::msg("quality model produced no outputs"));
        }

        let (_, values) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("quality model output is not an f32 tensor")?;
        if values.is_empty() {
            return Err(Error::msg("quality model produced an empty score tensor"));
        }

        let mean = values.iter().map(|&v| v as f64).sum::<f64>() / values.len() as f64;
        Ok(mean)
    }
}

/// Find an integer scalar input that carries the sample rate, if the model has one.
fn sample_rate_input(session: &Session) -> Result<Option<(String, TensorElementType)>> {
    let inputs = session.inputs();
    if inputs.is_empty() {
        return Err(Error::msg("quality model has no inputs"));
    }

    for input in &inputs[1..] {
        if let ValueType::Tensor { ty, .. } = input.dtype() {
            if matches!(ty, TensorElementType::Int64 | TensorElementType::Int32) {
                return Ok(Some((input.name().to_owned(), *ty)));
            }
        }
    }
    Ok(None)
}
