use std::path::PathBuf;

use crate::{Error, Result};

/// Options that control a cleansing run.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - tests can run several configurations side by side in one process
///
/// A `Config` is read once and passed by reference into every stage; nothing mutates it
/// after a run starts.
#[derive(Debug, Clone)]
pub struct Config {
    /// First dataset index to process (inclusive).
    pub start: usize,

    /// Last dataset index to process (exclusive). `None` processes to the end of the dataset.
    pub end: Option<usize>,

    /// Minimum WADA SNR (dB) a clip needs to survive the first stage.
    pub snr_threshold: f64,

    /// Minimum perceptual quality score a clip needs to survive the second stage.
    pub score_threshold: f64,

    /// Number of dataset items loaded and processed per batch.
    pub batch_size: usize,

    /// Output directory for manifests, JSON dumps and copied audio.
    pub data_dir: PathBuf,

    /// Reuse the source transcription instead of running a transcription model.
    pub skip_transcription: bool,

    /// Dataset variant name (e.g. `ja000`).
    pub dataset_name: String,

    /// Language code the transcription model is constrained to.
    pub language: String,

    /// Speaker column written into every manifest line.
    pub speaker_tag: String,

    /// Language column written into every manifest line.
    pub language_tag: String,

    /// Worker count for CPU-bound stages.
    pub cpu_workers: usize,

    /// Accelerator count; one worker per device for model-bound stages.
    pub devices: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            snr_threshold: 100.0,
            score_threshold: 3.0,
            batch_size: 100_000,
            data_dir: PathBuf::from("data"),
            skip_transcription: false,
            dataset_name: "ja000".to_owned(),
            language: "ja".to_owned(),
            speaker_tag: "yodasja".to_owned(),
            language_tag: "JP".to_owned(),
            cpu_workers: num_cpus::get(),
            devices: 1,
        }
    }
}

impl Config {
    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch size must be at least 1".to_owned()));
        }
        if self.cpu_workers == 0 {
            return Err(Error::Config("cpu worker count must be at least 1".to_owned()));
        }
        if self.devices == 0 {
            return Err(Error::Config("device count must be at least 1".to_owned()));
        }
        if let Some(end) = self.end.filter(|&end| end < self.start) {
            return Err(Error::Config(format!(
                "end index {end} is before start index {}",
                self.start
            )));
        }
        if self.snr_threshold.is_nan() || self.score_threshold.is_nan() {
            return Err(Error::Config("thresholds must be numbers".to_owned()));
        }
        for (name, tag) in [
            ("speaker tag", &self.speaker_tag),
            ("language tag", &self.language_tag),
        ] {
            if tag.is_empty() || tag.contains(['|', '\n']) {
                return Err(Error::Config(format!(
                    "{name} must be non-empty and free of '|' and newlines"
                )));
            }
        }
        Ok(())
    }

    /// Directory that receives copied audio files.
    pub fn raw_dir(&self) -> PathBuf {
        self.data_dir.join("raw")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.snr_threshold, 100.0);
        assert_eq!(cfg.score_threshold, 3.0);
        assert_eq!(cfg.raw_dir(), PathBuf::from("data").join("raw"));
    }

    #[test]
    fn zero_devices_is_rejected() {
        let cfg = Config {
            devices: 0,
            ..Config::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("device count"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let cfg = Config {
            start: 10,
            end: Some(5),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn pipe_in_tag_is_rejected() {
        let cfg = Config {
            speaker_tag: "a|b".to_owned(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
