//! Output files: the pipe-delimited manifest and the JSON result dump.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::record::ResultRecord;
use crate::{Error, Result};

/// Name of the merged manifest inside `data_dir`.
pub const MERGED_MANIFEST: &str = "esd.list";

/// Per-batch manifest name for the inclusive index range `first..=last`.
pub fn batch_manifest_name(first: usize, last: usize) -> String {
    format!("esd_{first}-{last}.list")
}

/// Per-batch JSON result dump name for the inclusive index range `first..=last`.
pub fn batch_results_name(first: usize, last: usize) -> String {
    format!("results_{first}-{last}.json")
}

/// Format one manifest line (without the trailing newline).
///
/// Layout: `<uuid>.wav|<speaker>|<language>|<transcription>`. Line breaks inside the
/// transcription are flattened to spaces so every record occupies exactly one line.
pub fn manifest_line(result: &ResultRecord, cfg: &Config) -> String {
    let text: String = result
        .transcription
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!(
        "{}|{}|{}|{}",
        result.audio_file_name(),
        cfg.speaker_tag,
        cfg.language_tag,
        text
    )
}

/// Write every result as one newline-terminated manifest line.
pub fn write_manifest(path: &Path, results: &[ResultRecord], cfg: &Config) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::io("failed to create manifest", path, err))?;
    let mut w = BufWriter::new(file);
    for result in results {
        writeln!(w, "{}", manifest_line(result, cfg))
            .map_err(|err| Error::io("failed to write manifest", path, err))?;
    }
    w.flush()
        .map_err(|err| Error::io("failed to write manifest", path, err))?;
    Ok(())
}

/// Write results as a pretty-printed UTF-8 JSON array (2-space indent, non-ASCII kept as-is).
pub fn write_results_json(path: &Path, results: &[ResultRecord]) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::io("failed to create results file", path, err))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut w, results)?;
    w.flush()
        .map_err(|err| Error::io("failed to write results file", path, err))?;
    Ok(())
}

/// Parse `esd_<first>-<last>.list` into `(first, last)`.
fn parse_batch_manifest_name(name: &str) -> Option<(usize, usize)> {
    let range = name.strip_prefix("esd_")?.strip_suffix(".list")?;
    let (first, last) = range.split_once('-')?;
    Some((first.parse().ok()?, last.parse().ok()?))
}

/// Per-batch manifests in `data_dir`, ordered by their index range.
pub fn batch_manifests(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(data_dir)
        .map_err(|err| Error::io("failed to list output directory", data_dir, err))?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| Error::io("failed to list output directory", data_dir, err))?;
        let name = entry.file_name();
        let Some(range) = name.to_str().and_then(parse_batch_manifest_name) else {
            continue;
        };
        found.push((range, entry.path()));
    }

    found.sort();
    Ok(found.into_iter().map(|(_, path)| path).collect())
}

/// Concatenate every per-batch manifest in `data_dir` into `esd.list`.
///
/// Contents are copied byte-for-byte in batch order. Returns the merged file's path.
pub fn merge_manifests(data_dir: &Path) -> Result<PathBuf> {
    let inputs = batch_manifests(data_dir)?;
    let merged_path = data_dir.join(MERGED_MANIFEST);

    let file = File::create(&merged_path)
        .map_err(|err| Error::io("failed to create merged manifest", &merged_path, err))?;
    let mut out = BufWriter::new(file);
    for input in &inputs {
        let bytes = fs::read(input).map_err(|err| Error::io("failed to read manifest", input, err))?;
        out.write_all(&bytes)
            .map_err(|err| Error::io("failed to write merged manifest", &merged_path, err))?;
    }
    out.flush()
        .map_err(|err| Error::io("failed to write merged manifest", &merged_path, err))?;

    Ok(merged_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(uuid: &str, text: &str) -> ResultRecord {
        ResultRecord {
            id: "vid".to_owned(),
            uuid: uuid.to_owned(),
            snr: 101.5,
            score: 3.25,
            transcription: text.to_owned(),
            source_transcription: "元のテキスト".to_owned(),
            path: PathBuf::from("/corpus/a.wav"),
        }
    }

    #[test]
    fn manifest_line_uses_fixed_layout() {
        let line = manifest_line(&result("utt-1", "こんにちは"), &Config::default());
        assert_eq!(line, "utt-1.wav|yodasja|JP|こんにちは");
    }

    #[test]
    fn manifest_line_flattens_newlines() {
        let line = manifest_line(&result("u", "一行目\n二行目\r\n"), &Config::default());
        assert_eq!(line, "u.wav|yodasja|JP|一行目 二行目  ");
    }

    #[test]
    fn batch_names_round_trip_through_parser() {
        assert_eq!(batch_manifest_name(0, 99), "esd_0-99.list");
        assert_eq!(batch_results_name(100, 199), "results_100-199.json");
        assert_eq!(parse_batch_manifest_name("esd_100-199.list"), Some((100, 199)));
        assert_eq!(parse_batch_manifest_name("esd.list"), None);
        assert_eq!(parse_batch_manifest_name("esd_a-b.list"), None);
        assert_eq!(parse_batch_manifest_name("results_0-9.json"), None);
    }

    #[test]
    fn results_json_is_pretty_and_keeps_non_ascii() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("results.json");
        write_results_json(&path, &[result("u1", "音声")])?;

        let text = fs::read_to_string(&path)?;
        assert!(text.contains("音声"));
        assert!(text.contains("\n  {"));
        let parsed: Vec<ResultRecord> = serde_json::from_str(&text)?;
        assert_eq!(parsed, vec![result("u1", "音声")]);
        Ok(())
    }

    #[test]
    fn empty_results_still_produce_valid_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let json = dir.path().join("r.json");
        let list = dir.path().join("e.list");
        write_results_json(&json, &[])?;
        write_manifest(&list, &[], &Config::default())?;
        assert_eq!(fs::read_to_string(json)?, "[]");
        assert_eq!(fs::read_to_string(list)?, "");
        Ok(())
    }

    #[test]
    fn merge_orders_batches_numerically() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("esd_1000-1999.list"), "c\n")?;
        fs::write(dir.path().join("esd_0-999.list"), "a\nb\n")?;
        fs::write(dir.path().join("esd_2000-2000.list"), "")?;
        fs::write(dir.path().join("results_0-999.json"), "[]")?;
        fs::write(dir.path().join(MERGED_MANIFEST), "stale\n")?;

        let merged = merge_manifests(dir.path())?;
        assert_eq!(fs::read_to_string(merged)?, "a\nb\nc\n");
        Ok(())
    }
}
