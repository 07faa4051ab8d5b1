use std::io::{Read, Seek};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec};

use crate::audio::{AudioBuffer, Samples};
use crate::{Error, Result};

/// Load a WAV file into an [`AudioBuffer`] and report its sample rate.
pub fn load_wav(path: impl AsRef<Path>) -> Result<(AudioBuffer, u32)> {
    let path = path.as_ref();
    let reader = WavReader::open(path).map_err(|source| Error::Wav {
        path: path.to_path_buf(),
        source,
    })?;
    read_wav(reader).map_err(|source| Error::Wav {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode every sample from `reader`, keeping channels interleaved.
///
/// What we return:
/// - 8/16-bit integer PCM as `i16` (8-bit is widened to the 16-bit range)
/// - 24/32-bit integer PCM as `i32` (24-bit is widened to the 32-bit range)
/// - 32-bit float as `f32`
///
/// Scaling to `[-1.0, 1.0]` is left to [`AudioBuffer::to_mono`].
fn read_wav<R>(mut reader: WavReader<R>) -> std::result::Result<(AudioBuffer, u32), hound::Error>
where
    R: Read + Seek,
{
    let spec: WavSpec = reader.spec();

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => Samples::F32(
            reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()?,
        ),
        (SampleFormat::Int, bits) if bits <= 16 => {
            let shift = 16 - bits;
            Samples::I16(
                reader
                    .samples::<i16>()
                    .map(|s| s.map(|s| s << shift))
                    .collect::<std::result::Result<_, _>>()?,
            )
        }
        (SampleFormat::Int, bits) => {
            let shift = 32u16.saturating_sub(bits);
            Samples::I32(
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|s| s << shift))
                    .collect::<std::result::Result<_, _>>()?,
            )
        }
    };

    let audio = AudioBuffer {
        samples,
        channels: usize::from(spec.channels),
    };
    Ok((audio, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use hound::WavWriter;

    use super::*;

    fn encode(spec: WavSpec, write: impl FnOnce(&mut WavWriter<&mut Cursor<Vec<u8>>>)) -> Cursor<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = WavWriter::new(&mut buf, spec).expect("writer");
            write(&mut writer);
            writer.finalize().expect("finalize");
        }
        buf.set_position(0);
        buf
    }

    #[test]
    fn reads_i16_stereo() -> anyhow::Result<()> {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let data = encode(spec, |w| {
            for s in [i16::MAX, 0, -16384, 16384] {
                w.write_sample(s).expect("sample");
            }
        });

        let (audio, rate) = read_wav(WavReader::new(data)?)?;
        assert_eq!(rate, 22_050);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frames(), 2);
        assert_eq!(audio.samples, Samples::I16(vec![i16::MAX, 0, -16384, 16384]));
        Ok(())
    }

    #[test]
    fn widens_24_bit_to_full_i32_range() -> anyhow::Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 24,
            sample_format: SampleFormat::Int,
        };
        let data = encode(spec, |w| {
            w.write_sample((1i32 << 23) - 1).expect("sample");
        });

        let (audio, _) = read_wav(WavReader::new(data)?)?;
        let mono = audio.to_mono();
        assert!((mono[0] - 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn reads_float() -> anyhow::Result<()> {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let data = encode(spec, |w| {
            w.write_sample(0.25f32).expect("sample");
            w.write_sample(-0.5f32).expect("sample");
        });

        let (audio, _) = read_wav(WavReader::new(data)?)?;
        assert_eq!(audio.samples, Samples::F32(vec![0.25, -0.5]));
        Ok(())
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_wav("/definitely/not/here.wav").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.wav"));
    }
}
