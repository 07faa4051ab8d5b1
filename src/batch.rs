//! Batch driver: walk the dataset range batch by batch, then merge the manifests.

use std::fs;
use std::ops::Range;
use std::path::PathBuf;

use tracing::info;

use crate::dataset::DatasetSource;
use crate::manifest::merge_manifests;
use crate::model::{ModelLoader, QualityScorer, Transcriber};
use crate::pipeline::{BatchRange, BatchReport, Pipeline};
use crate::{Error, Result};

/// Totals across a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub totals: BatchReport,
    pub merged_manifest: PathBuf,
}

/// Split `start..end` into contiguous, non-overlapping ranges of at most `batch_size` items.
pub fn plan_batches(start: usize, end: usize, batch_size: usize) -> Vec<Range<usize>> {
    debug_assert!(batch_size > 0, "batch size must be non-zero");

    (start..end)
        .step_by(batch_size.max(1))
        .map(|s| s..(s + batch_size).min(end))
        .collect()
}

/// Process `dataset` according to the pipeline's configuration.
///
/// Batches run strictly one after another; parallelism lives inside each batch's stages. A
/// failing batch aborts the run, leaving earlier batches' files on disk. After the last batch
/// every per-batch manifest in `data_dir` is merged into `esd.list`.
pub fn run<D, Q, T>(dataset: &D, pipeline: &Pipeline<Q, T>) -> Result<RunSummary>
where
    D: DatasetSource + ?Sized,
    Q: ModelLoader,
    Q::Model: QualityScorer,
    T: ModelLoader,
    T::Model: Transcriber,
{
    let cfg = pipeline.config();
    let end = cfg.end.unwrap_or(dataset.len()).min(dataset.len());

    fs::create_dir_all(&cfg.data_dir)
        .map_err(|err| Error::io("failed to create output directory", &cfg.data_dir, err))?;

    info!(
        dataset = %cfg.dataset_name,
        items = dataset.len(),
        start = cfg.start,
        end,
        data_dir = %cfg.data_dir.display(),
        skip_transcription = cfg.skip_transcription,
        "starting run"
    );

    let mut summary = RunSummary::default();
    for range in plan_batches(cfg.start, end, cfg.batch_size) {
        let batch = BatchRange {
            first: range.start,
            last: range.end - 1,
        };
        info!(first = batch.first, last = batch.last, "processing batch");

        let records = dataset.load(range)?;
        let (_, report) = pipeline.run_batch(records, batch)?;

        summary.batches += 1;
        summary.totals.loaded += report.loaded;
        summary.totals.passed_snr += report.passed_snr;
        summary.totals.passed_quality += report.passed_quality;
        summary.totals.written += report.written;
    }

    summary.merged_manifest = merge_manifests(&cfg.data_dir)?;
    info!(
        batches = summary.batches,
        written = summary.totals.written,
        merged = %summary.merged_manifest.display(),
        "all batch manifests merged"
    );

    Ok(summary)
}
