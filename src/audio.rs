//! Canonical audio representation.
//!
//! Dataset clips arrive as integer PCM or float samples, possibly with several interleaved
//! channels. Every consumer in the pipeline (SNR estimation, quality scoring, transcription)
//! wants the same thing: mono `f32` in `[-1.0, 1.0]`. [`AudioBuffer::to_mono`] is the single
//! place that conversion happens.

/// Raw sample storage, tagged by sample type.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    I16(Vec<i16>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl Samples {
    /// Number of individual samples (all channels).
    pub fn len(&self) -> usize {
        match self {
            Samples::I16(v) => v.len(),
            Samples::I32(v) => v.len(),
            Samples::F32(v) => v.len(),
            Samples::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to `f32`, scaling fixed-point types by their maximum magnitude.
    fn to_f32(&self) -> Vec<f32> {
        match self {
            Samples::I16(v) => v.iter().map(|&s| s as f32 / i16::MAX as f32).collect(),
            Samples::I32(v) => v
                .iter()
                .map(|&s| (s as f64 / i32::MAX as f64) as f32)
                .collect(),
            Samples::F32(v) => v.clone(),
            Samples::F64(v) => v.iter().map(|&s| s as f32).collect(),
        }
    }
}

/// A decoded clip: interleaved samples plus the channel count.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Samples,
    pub channels: usize,
}

impl AudioBuffer {
    /// A single-channel buffer.
    pub fn mono(samples: Samples) -> Self {
        Self {
            samples,
            channels: 1,
        }
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1)
    }

    /// Normalize into mono `f32` in `[-1.0, 1.0]`.
    ///
    /// Policy:
    /// - fixed-point samples are divided by the type's maximum value
    /// - channels are averaged with equal weight
    /// - results are clamped, so `i16::MIN` maps to `-1.0` rather than slightly below it
    ///
    /// Applying this to data that is already mono and in range returns it unchanged.
    pub fn to_mono(&self) -> Vec<f32> {
        let interleaved = self.samples.to_f32();
        let mut mono = downmix_to_mono(&interleaved, self.channels.max(1));
        for s in &mut mono {
            *s = s.clamp(-1.0, 1.0);
        }
        mono
    }
}

/// Downmix interleaved samples into mono by averaging channels.
///
/// A trailing partial frame is dropped.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_normalizes_to_empty() {
        let buf = AudioBuffer::mono(Samples::I16(Vec::new()));
        assert!(buf.to_mono().is_empty());

        let stereo = AudioBuffer {
            samples: Samples::F32(Vec::new()),
            channels: 2,
        };
        assert!(stereo.to_mono().is_empty());
    }

    #[test]
    fn i16_is_scaled_and_clamped() {
        let buf = AudioBuffer::mono(Samples::I16(vec![i16::MAX, 0, i16::MIN, 16384]));
        let mono = buf.to_mono();
        assert_eq!(mono[0], 1.0);
        assert_eq!(mono[1], 0.0);
        assert_eq!(mono[2], -1.0);
        assert!((mono[3] - 16384.0 / 32767.0).abs() < 1e-6);
    }

    #[test]
    fn i32_is_scaled_by_type_max() {
        let buf = AudioBuffer::mono(Samples::I32(vec![i32::MAX, i32::MAX / 2, i32::MIN]));
        let mono = buf.to_mono();
        assert_eq!(mono[0], 1.0);
        assert!((mono[1] - 0.5).abs() < 1e-6);
        assert_eq!(mono[2], -1.0);
    }

    #[test]
    fn stereo_is_averaged_per_frame() {
        // Two frames of stereo: (L=1, R=0.5), (L=-1, R=0) => mono: 0.75, -0.5
        let buf = AudioBuffer {
            samples: Samples::F32(vec![1.0, 0.5, -1.0, 0.0]),
            channels: 2,
        };
        assert_eq!(buf.frames(), 2);
        assert_eq!(buf.to_mono(), vec![0.75, -0.5]);
    }

    #[test]
    fn output_is_mono_and_bounded() {
        let buf = AudioBuffer {
            samples: Samples::F64(vec![3.0, 2.0, -7.5, -0.25, 0.1, 0.2]),
            channels: 2,
        };
        let mono = buf.to_mono();
        assert_eq!(mono.len(), 3);
        assert!(mono.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn normalizing_twice_is_a_no_op() {
        let input: Vec<f32> = (0..64).map(|i| ((i as f32) * 0.1).sin() * 0.9).collect();
        let once = AudioBuffer::mono(Samples::F32(input.clone())).to_mono();
        let twice = AudioBuffer::mono(Samples::F32(once.clone())).to_mono();
        assert_eq!(once, input);
        assert_eq!(twice, once);
    }
}
