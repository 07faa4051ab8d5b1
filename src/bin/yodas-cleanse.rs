use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use yodas_cleanse::backends::onnx::OnnxScorerLoader;
use yodas_cleanse::backends::whisper::WhisperLoader;
use yodas_cleanse::{
    Config, DatasetSource, JsonlDataset, ModelLoader, Passthrough, Pipeline, QualityScorer,
    RunSummary, Transcriber, init_logging, run,
};

#[derive(Parser, Debug)]
#[command(name = "yodas-cleanse")]
#[command(about = "Filter and re-transcribe a speech corpus into TTS training data")]
struct Params {
    /// First dataset index to process (inclusive).
    #[arg(long = "start", default_value_t = 0)]
    start: usize,

    /// Last dataset index to process (exclusive). Defaults to the dataset length.
    #[arg(long = "end")]
    end: Option<usize>,

    /// Minimum WADA SNR (dB) a clip needs to be kept.
    #[arg(long = "snr-threshold", default_value_t = 100.0)]
    snr_threshold: f64,

    /// Minimum predicted quality score a clip needs to be kept.
    #[arg(long = "score-threshold", default_value_t = 3.0)]
    score_threshold: f64,

    /// Dataset items per batch.
    #[arg(long = "batch-size", default_value_t = 100_000)]
    batch_size: usize,

    /// Output directory.
    #[arg(long = "data-dir", default_value = "data")]
    data_dir: PathBuf,

    /// Keep the dataset's own transcriptions instead of running Whisper.
    #[arg(long = "skip-transcription", default_value_t = false)]
    skip_transcription: bool,

    /// Dataset variant to read (a directory under `--dataset-root`).
    #[arg(long = "dataset-name", default_value = "ja000")]
    dataset_name: String,

    /// Directory holding dataset variants.
    #[arg(long = "dataset-root", default_value = ".")]
    dataset_root: PathBuf,

    /// Language the transcription model is constrained to.
    #[arg(long = "language", default_value = "ja")]
    language: String,

    /// Speaker column of the manifest.
    #[arg(long = "speaker-tag", default_value = "yodasja")]
    speaker_tag: String,

    /// Language column of the manifest.
    #[arg(long = "language-tag", default_value = "JP")]
    language_tag: String,

    /// Worker count for the SNR stage. Defaults to the number of CPUs.
    #[arg(long = "cpu-workers")]
    cpu_workers: Option<usize>,

    /// Accelerator count; one model worker is started per device.
    #[arg(long = "devices", default_value_t = 1)]
    devices: usize,

    /// Path to the ONNX quality model.
    #[arg(short = 'q', long = "quality-model", required = true)]
    quality_model_path: PathBuf,

    /// Path to a whisper.cpp model file (e.g. `ggml-large-v3.bin`).
    #[arg(
        short = 'm',
        long = "whisper-model",
        required_unless_present = "skip_transcription"
    )]
    whisper_model_path: Option<PathBuf>,

    /// Run models on the CPU.
    #[arg(long = "cpu-only", default_value_t = false)]
    cpu_only: bool,
}

impl Params {
    fn config(&self) -> Config {
        let defaults = Config::default();
        Config {
            start: self.start,
            end: self.end,
            snr_threshold: self.snr_threshold,
            score_threshold: self.score_threshold,
            batch_size: self.batch_size,
            data_dir: self.data_dir.clone(),
            skip_transcription: self.skip_transcription,
            dataset_name: self.dataset_name.clone(),
            language: self.language.clone(),
            speaker_tag: self.speaker_tag.clone(),
            language_tag: self.language_tag.clone(),
            cpu_workers: self.cpu_workers.unwrap_or(defaults.cpu_workers),
            devices: self.devices,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let params = Params::parse();

    match run_cleanse(&params) {
        Ok(summary) => {
            info!(
                batches = summary.batches,
                loaded = summary.totals.loaded,
                written = summary.totals.written,
                manifest = %summary.merged_manifest.display(),
                "run complete"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = format!("{err:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run_cleanse(params: &Params) -> Result<RunSummary> {
    let config = params.config();
    let dataset = JsonlDataset::open(&params.dataset_root, &config.dataset_name)
        .context("failed to open dataset")?;

    let scorer = OnnxScorerLoader::new(&params.quality_model_path)?.with_gpu(!params.cpu_only);

    match &params.whisper_model_path {
        Some(path) if !config.skip_transcription => {
            let transcriber = WhisperLoader::new(path)?.with_gpu(!params.cpu_only);
            run_with(&dataset, config, scorer, transcriber)
        }
        _ => run_with(&dataset, config, scorer, Passthrough),
    }
}

fn run_with<Q, T>(dataset: &JsonlDataset, config: Config, scorer: Q, transcriber: T) -> Result<RunSummary>
where
    Q: ModelLoader,
    Q::Model: QualityScorer,
    T: ModelLoader,
    T::Model: Transcriber,
{
    info!(items = dataset.len(), "dataset opened");
    let pipeline = Pipeline::new(config, scorer, transcriber)?;
    Ok(run(dataset, &pipeline)?)
}
