use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::audio::AudioBuffer;

/// One dataset clip as loaded from the source.
#[derive(Debug, Clone)]
pub struct AudioRecord {
    pub id: String,
    /// Utterance id; names the output audio file and must be unique within a batch.
    pub uuid: String,
    pub audio: AudioBuffer,
    pub sample_rate: u32,
    /// Transcription shipped with the dataset.
    pub text: String,
    /// Original audio file, copied verbatim into the output corpus.
    pub path: PathBuf,
}

/// A record that survived SNR filtering.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub record: AudioRecord,
    pub snr: f64,
}

/// A record that survived quality filtering.
#[derive(Debug, Clone)]
pub struct AcceptedRecord {
    pub record: AudioRecord,
    pub snr: f64,
    pub score: f64,
}

/// Final output unit, serialized into `results_<start>-<end>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: String,
    pub uuid: String,
    pub snr: f64,
    pub score: f64,
    pub transcription: String,
    pub source_transcription: String,
    pub path: PathBuf,
}

impl ResultRecord {
    pub fn new(accepted: AcceptedRecord, transcription: String) -> Self {
        let AcceptedRecord { record, snr, score } = accepted;
        Self {
            id: record.id,
            uuid: record.uuid,
            snr,
            score,
            transcription,
            source_transcription: record.text,
            path: record.path,
        }
    }

    /// File name of the copied audio inside `<data_dir>/raw`.
    pub fn audio_file_name(&self) -> String {
        format!("{}.wav", self.uuid)
    }
}
