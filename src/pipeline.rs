//! Batch orchestration: SNR → quality → transcription, then write the batch's outputs.
//!
//! A [`Pipeline`] owns the immutable run configuration and the two model loaders. One call to
//! [`Pipeline::run_batch`] pushes a batch of records through all three stages (each fanned out
//! with [`run_partitioned`]) and writes:
//! - `<data_dir>/raw/<uuid>.wav` for every surviving clip
//! - `<data_dir>/esd_<first>-<last>.list`
//! - `<data_dir>/results_<first>-<last>.json`
//!
//! Stages never overlap: each one is fully joined before the next starts.

use std::collections::HashSet;
use std::fs;
use std::time::Instant;

use tracing::info;

use crate::config::Config;
use crate::manifest::{batch_manifest_name, batch_results_name, write_manifest, write_results_json};
use crate::model::{ModelLoader, Passthrough, QualityScorer, Transcriber};
use crate::record::{AudioRecord, ResultRecord};
use crate::runner::run_partitioned;
use crate::stages::{quality_partition, snr_partition, transcribe_partition};
use crate::{Error, Result};

/// Inclusive dataset index range a batch covers; used to name its output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub first: usize,
    pub last: usize,
}

/// Survivor counts for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub loaded: usize,
    pub passed_snr: usize,
    pub passed_quality: usize,
    pub written: usize,
}

/// The three-stage cleansing pipeline.
pub struct Pipeline<Q, T = Passthrough> {
    config: Config,
    scorer: Q,
    transcriber: T,
}

impl<Q, T> Pipeline<Q, T>
where
    Q: ModelLoader,
    Q::Model: QualityScorer,
    T: ModelLoader,
    T::Model: Transcriber,
{
    /// Build a pipeline. The configuration is validated once here.
    ///
    /// When `config.skip_transcription` is set, `transcriber` is never loaded and source
    /// transcriptions are passed through.
    pub fn new(config: Config, scorer: Q, transcriber: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer,
            transcriber,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every stage over one batch and write its output files.
    pub fn run_batch(&self, records: Vec<AudioRecord>, range: BatchRange) -> Result<(Vec<ResultRecord>, BatchReport)> {
        ensure_unique_uuids(&records)?;

        let cfg = &self.config;
        let mut report = BatchReport {
            loaded: records.len(),
            ..BatchReport::default()
        };

        let started = Instant::now();
        let scored = run_partitioned("snr", records, cfg.cpu_workers, |_, part| {
            snr_partition(part, cfg)
        })?;
        report.passed_snr = scored.len();
        info!(
            stage = "snr",
            elapsed_secs = started.elapsed().as_secs_f64(),
            kept = scored.len(),
            of = report.loaded,
            "stage finished"
        );

        let started = Instant::now();
        let accepted = run_partitioned("quality", scored, cfg.devices, |device, part| {
            quality_partition(device, part, &self.scorer, cfg)
        })?;
        report.passed_quality = accepted.len();
        info!(
            stage = "quality",
            elapsed_secs = started.elapsed().as_secs_f64(),
            kept = accepted.len(),
            of = report.passed_snr,
            "stage finished"
        );

        let started = Instant::now();
        let results = if cfg.skip_transcription {
            run_partitioned("transcribe", accepted, cfg.devices, |device, part| {
                transcribe_partition(device, part, &Passthrough, cfg)
            })?
        } else {
            run_partitioned("transcribe", accepted, cfg.devices, |device, part| {
                transcribe_partition(device, part, &self.transcriber, cfg)
            })?
        };
        info!(
            stage = "transcribe",
            elapsed_secs = started.elapsed().as_secs_f64(),
            passthrough = cfg.skip_transcription,
            results = results.len(),
            "stage finished"
        );

        self.write_outputs(&results, range)?;
        report.written = results.len();

        Ok((results, report))
    }

    fn write_outputs(&self, results: &[ResultRecord], range: BatchRange) -> Result<()> {
        let cfg = &self.config;
        let raw_dir = cfg.raw_dir();
        fs::create_dir_all(&raw_dir)
            .map_err(|err| Error::io("failed to create audio directory", &raw_dir, err))?;

        let manifest_path = cfg.data_dir.join(batch_manifest_name(range.first, range.last));
        write_manifest(&manifest_path, results, cfg)?;

        for result in results {
            let dst = raw_dir.join(result.audio_file_name());
            fs::copy(&result.path, &dst)
                .map_err(|err| Error::io("failed to copy audio", &result.path, err))?;
        }

        let results_path = cfg.data_dir.join(batch_results_name(range.first, range.last));
        write_results_json(&results_path, results)?;

        info!(
            manifest = %manifest_path.display(),
            results = %results_path.display(),
            clips = results.len(),
            "batch outputs written"
        );
        Ok(())
    }
}

fn ensure_unique_uuids(records: &[AudioRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.uuid.as_str()) {
            return Err(Error::DuplicateRecord(record.uuid.clone()));
        }
    }
    Ok(())
}
