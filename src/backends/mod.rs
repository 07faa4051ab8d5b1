/// Transcription backend (whisper.cpp).
#[cfg(feature = "whisper")]
pub mod whisper;

/// Quality-scoring backend (ONNX Runtime).
#[cfg(feature = "onnx")]
pub mod onnx;
