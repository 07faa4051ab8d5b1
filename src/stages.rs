//! Per-partition worker functions for the three pipeline stages.
//!
//! Each function processes one partition on one worker and is driven by
//! [`crate::runner::run_partitioned`]. Error policy differs by stage:
//! - SNR: pure computation; degenerate clips are filtered, never raised.
//! - quality: a failing item is logged and dropped; the partition keeps going.
//! - transcription: a failing item aborts the partition (and therefore the batch).

use tracing::{debug, warn};

use crate::Result;
use crate::config::Config;
use crate::model::{ModelLoader, QualityScorer, Transcriber};
use crate::record::{AcceptedRecord, AudioRecord, ResultRecord, ScoredRecord};
use crate::snr::wada_snr;

/// Keep records whose SNR is defined and at least `cfg.snr_threshold`.
pub fn snr_partition(records: Vec<AudioRecord>, cfg: &Config) -> Result<Vec<ScoredRecord>> {
    let mut out = Vec::new();
    for record in records {
        let snr = wada_snr(&record.audio.to_mono());
        if snr.is_nan() || snr < cfg.snr_threshold {
            continue;
        }
        out.push(ScoredRecord { record, snr });
    }
    Ok(out)
}

/// Score records on `device` and keep those at or above `cfg.score_threshold`.
pub fn quality_partition<L>(
    device: usize,
    records: Vec<ScoredRecord>,
    loader: &L,
    cfg: &Config,
) -> Result<Vec<AcceptedRecord>>
where
    L: ModelLoader + ?Sized,
    L::Model: QualityScorer,
{
    let mut scorer = loader.load(device)?;
    debug!(device, items = records.len(), "quality scorer loaded");

    let mut out = Vec::new();
    for ScoredRecord { record, snr } in records {
        if snr.is_nan() {
            continue;
        }

        let audio = record.audio.to_mono();
        let score = match scorer.score(&audio, record.sample_rate) {
            Ok(score) => score,
            Err(err) => {
                warn!(
                    device,
                    id = %record.id,
                    uuid = %record.uuid,
                    path = %record.path.display(),
                    error = %err,
                    "quality scoring failed; dropping clip"
                );
                continue;
            }
        };

        if score >= cfg.score_threshold {
            out.push(AcceptedRecord { record, snr, score });
        }
    }
    Ok(out)
}

/// Transcribe accepted records on `device`.
pub fn transcribe_partition<L>(
    device: usize,
    records: Vec<AcceptedRecord>,
    loader: &L,
    cfg: &Config,
) -> Result<Vec<ResultRecord>>
where
    L: ModelLoader + ?Sized,
    L::Model: Transcriber,
{
    let mut transcriber = loader.load(device)?;
    debug!(device, items = records.len(), "transcriber loaded");

    let mut out = Vec::with_capacity(records.len());
    for accepted in records {
        let text = transcriber.transcribe(&accepted.record, &cfg.language)?;
        out.push(ResultRecord::new(accepted, text));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use std::path::PathBuf;

    use super::*;
    use crate::Error;
    use crate::audio::{AudioBuffer, Samples};
    use crate::model::Passthrough;

    fn record(id: usize, samples: Vec<f32>) -> AudioRecord {
        AudioRecord {
            id: format!("clip-{id}"),
            uuid: format!("utt-{id}"),
            audio: AudioBuffer::mono(Samples::F32(samples)),
            sample_rate: 16_000,
            text: format!("text {id}"),
            path: PathBuf::from(format!("/src/{id}.wav")),
        }
    }

    fn plucked() -> Vec<f32> {
        (0..4_000)
            .map(|n| {
                let tone = (2.0 * PI * 440.0 * n as f64 / 16_000.0).sin();
                (tone * (-3.0 * (n % 1600) as f64 / 1600.0).exp()) as f32
            })
            .collect()
    }

    /// Scores a clip by its first sample: 0.4 -> 4.0.
    struct FirstSampleScorer;

    impl QualityScorer for FirstSampleScorer {
        fn score(&mut self, audio: &[f32], _sample_rate: u32) -> Result<f64> {
            let first = audio.first().ok_or_else(|| Error::msg("empty clip"))?;
            Ok((*first as f64 * 10.0).round())
        }
    }

    fn scored(id: usize, first: f32) -> ScoredRecord {
        ScoredRecord {
            record: record(id, vec![first, 0.0]),
            snr: 20.0,
        }
    }

    fn loader(_device: usize) -> Result<FirstSampleScorer> {
        Ok(FirstSampleScorer)
    }

    #[test]
    fn snr_stage_drops_silent_and_low_snr_clips() -> anyhow::Result<()> {
        let cfg = Config {
            snr_threshold: 5.0,
            ..Config::default()
        };
        let records = vec![
            record(0, plucked()),
            record(1, vec![0.0; 512]),
            record(2, Vec::new()),
            record(3, vec![0.5; 512]),
        ];

        let out = snr_partition(records, &cfg)?;
        let ids: Vec<&str> = out.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["clip-0"]);
        assert!(out[0].snr >= 5.0);
        Ok(())
    }

    #[test]
    fn quality_stage_applies_threshold_inclusively() -> anyhow::Result<()> {
        let cfg = Config {
            score_threshold: 3.0,
            ..Config::default()
        };
        let records = vec![scored(0, 0.2), scored(1, 0.3), scored(2, 0.45)];

        let out = quality_partition(0, records, &loader, &cfg)?;
        let kept: Vec<(&str, f64)> = out
            .iter()
            .map(|r| (r.record.id.as_str(), r.score))
            .collect();
        assert_eq!(kept, vec![("clip-1", 3.0), ("clip-2", 4.0)]);
        assert!(out.iter().all(|r| r.snr == 20.0));
        Ok(())
    }

    #[test]
    fn quality_stage_drops_failing_items_and_continues() -> anyhow::Result<()> {
        let cfg = Config::default();
        let mut broken = scored(1, 0.0);
        broken.record.audio = AudioBuffer::mono(Samples::F32(Vec::new()));
        let records = vec![scored(0, 0.9), broken, scored(2, 0.8)];

        let out = quality_partition(0, records, &loader, &cfg)?;
        let ids: Vec<&str> = out.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, vec!["clip-0", "clip-2"]);
        Ok(())
    }

    #[test]
    fn quality_stage_skips_undefined_snr() -> anyhow::Result<()> {
        let mut undefined = scored(0, 0.9);
        undefined.snr = f64::NAN;
        let out = quality_partition(0, vec![undefined], &loader, &Config::default())?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn quality_stage_binds_worker_device() -> anyhow::Result<()> {
        let seen = std::sync::Mutex::new(Vec::new());
        let recording = |device: usize| -> Result<FirstSampleScorer> {
            seen.lock().map_err(|_| Error::msg("poisoned"))?.push(device);
            Ok(FirstSampleScorer)
        };
        quality_partition(3, vec![scored(0, 0.9)], &recording, &Config::default())?;
        assert_eq!(*seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?, vec![3]);
        Ok(())
    }

    #[test]
    fn quality_stage_fails_when_model_cannot_load() {
        let failing = |_device: usize| -> Result<FirstSampleScorer> { Err(Error::msg("no weights")) };
        let err = quality_partition(0, vec![scored(0, 0.9)], &failing, &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("no weights"));
    }

    fn accepted(id: usize) -> AcceptedRecord {
        AcceptedRecord {
            record: record(id, vec![0.1, 0.2]),
            snr: 42.0,
            score: 3.5,
        }
    }

    #[test]
    fn passthrough_reuses_source_text() -> anyhow::Result<()> {
        let out = transcribe_partition(0, vec![accepted(0), accepted(1)], &Passthrough, &Config::default())?;
        assert_eq!(out.len(), 2);
        for r in &out {
            assert_eq!(r.transcription, r.source_transcription);
            assert_eq!(r.snr, 42.0);
            assert_eq!(r.score, 3.5);
        }
        assert_eq!(out[1].uuid, "utt-1");
        assert_eq!(out[1].path, PathBuf::from("/src/1.wav"));
        Ok(())
    }

    struct Shouting {
        fail_on: Option<String>,
    }

    impl Transcriber for Shouting {
        fn transcribe(&mut self, record: &AudioRecord, language: &str) -> Result<String> {
            if self.fail_on.as_deref() == Some(record.id.as_str()) {
                return Err(Error::msg("decoder crashed"));
            }
            Ok(format!("[{language}] {}", record.text.to_uppercase()))
        }
    }

    #[test]
    fn model_transcription_uses_configured_language() -> anyhow::Result<()> {
        let cfg = Config {
            language: "en".to_owned(),
            ..Config::default()
        };
        let shouting = |_device: usize| -> Result<Shouting> { Ok(Shouting { fail_on: None }) };
        let out = transcribe_partition(0, vec![accepted(7)], &shouting, &cfg)?;
        assert_eq!(out[0].transcription, "[en] TEXT 7");
        assert_eq!(out[0].source_transcription, "text 7");
        Ok(())
    }

    #[test]
    fn transcription_error_aborts_partition() {
        let shouting = |_device: usize| -> Result<Shouting> {
            Ok(Shouting {
                fail_on: Some("clip-1".to_owned()),
            })
        };
        let err = transcribe_partition(
            0,
            vec![accepted(0), accepted(1), accepted(2)],
            &shouting,
            &Config::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("decoder crashed"));
    }
}
