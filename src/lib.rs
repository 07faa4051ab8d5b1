//! `yodas-cleanse`: batch cleansing of web-scraped speech corpora into TTS training data.
//!
//! This crate provides:
//! - Audio normalization and blind SNR estimation (WADA-SNR)
//! - A fan-out/fan-in stage runner that spreads work across CPU or accelerator workers
//! - Quality-scoring and transcription stages over pluggable model backends
//! - A batch driver that writes per-batch manifests, JSON dumps and audio copies, then merges
//!   the manifests
//!
//! Typical flow: open a [`dataset::JsonlDataset`], build a [`pipeline::Pipeline`] with a
//! [`config::Config`] and two model loaders, then call [`batch::run`].

// High-level API (most consumers should start here).
pub mod batch;
pub mod config;
pub mod pipeline;

// Records and the dataset they come from.
pub mod dataset;
pub mod record;
pub mod wav;

// Signal processing.
pub mod audio;
pub mod snr;

// Execution and the per-stage workers.
pub mod runner;
pub mod stages;

// Model interfaces and built-in backends.
pub mod backends;
pub mod model;

// Output files.
pub mod manifest;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

mod error;

pub use crate::batch::{RunSummary, run};
pub use crate::config::Config;
pub use crate::dataset::{DatasetSource, JsonlDataset};
pub use crate::error::{Error, Result};
pub use crate::model::{ModelLoader, Passthrough, QualityScorer, Transcriber};
pub use crate::pipeline::{BatchRange, BatchReport, Pipeline};
pub use crate::record::{AcceptedRecord, AudioRecord, ResultRecord, ScoredRecord};

#[cfg(feature = "logging")]
pub use crate::logging::init as init_logging;
