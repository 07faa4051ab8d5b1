//! Dataset sources.
//!
//! The pipeline only needs two things from a corpus: how many items it has, and the records
//! in a contiguous index range. [`JsonlDataset`] serves a corpus laid out on local disk:
//!
//! ```text
//! <root>/<dataset_name>/index.jsonl     one JSON object per line
//! <root>/<dataset_name>/<audio files>   paths in the index are relative to this directory
//! ```
//!
//! Index lines carry the fields of the upstream speech-corpus schema:
//!
//! ```json
//! {"id": "abc", "utt_id": "abc-00001", "text": "こんにちは", "audio": {"path": "audio/abc-00001.wav"}}
//! ```

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::record::AudioRecord;
use crate::wav::load_wav;
use crate::{Error, Result};

/// A source of labeled audio records addressable by index.
pub trait DatasetSource {
    /// Total number of items.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load the records in `range` (end exclusive). Ranges past the end are truncated, the
    /// way slicing a split behaves.
    fn load(&self, range: Range<usize>) -> Result<Vec<AudioRecord>>;
}

#[derive(Debug, Clone, Deserialize)]
struct IndexEntry {
    id: String,
    utt_id: String,
    text: String,
    audio: IndexAudio,
}

#[derive(Debug, Clone, Deserialize)]
struct IndexAudio {
    path: PathBuf,
}

/// A corpus stored as a JSONL index plus WAV files.
///
/// The index is read once up front; audio is decoded lazily, one batch at a time.
#[derive(Debug)]
pub struct JsonlDataset {
    dir: PathBuf,
    entries: Vec<IndexEntry>,
}

impl JsonlDataset {
    /// Name of the index file inside a dataset directory.
    pub const INDEX_FILE: &'static str = "index.jsonl";

    /// Open `<root>/<name>/index.jsonl`.
    pub fn open(root: impl AsRef<Path>, name: &str) -> Result<Self> {
        let dir = root.as_ref().join(name);
        let index_path = dir.join(Self::INDEX_FILE);
        let text = fs::read_to_string(&index_path)
            .map_err(|err| Error::io("failed to read dataset index", &index_path, err))?;

        let mut entries = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: IndexEntry = serde_json::from_str(line).map_err(|err| {
                Error::msg(format!(
                    "invalid entry at {}:{}: {err}",
                    index_path.display(),
                    lineno + 1
                ))
            })?;
            entries.push(entry);
        }

        debug!(dataset = name, items = entries.len(), "dataset index loaded");
        Ok(Self { dir, entries })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.dir.join(path)
        }
    }
}

impl DatasetSource for JsonlDataset {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn load(&self, range: Range<usize>) -> Result<Vec<AudioRecord>> {
        let end = range.end.min(self.entries.len());
        let start = range.start.min(end);

        self.entries[start..end]
            .iter()
            .map(|entry| {
                let path = self.resolve(&entry.audio.path);
                let (audio, sample_rate) = load_wav(&path)?;
                Ok(AudioRecord {
                    id: entry.id.clone(),
                    uuid: entry.utt_id.clone(),
                    audio,
                    sample_rate,
                    text: entry.text.clone(),
                    path,
                })
            })
            .collect()
    }
}
