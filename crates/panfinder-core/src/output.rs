//! JSON output files
//!
//! Every file is written to `<name>.tmp` first and renamed once complete,
//! so a destination only exists when everything before it succeeded.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

/// Timestamp format for output names (`YYYYMMDDHHMMSSffffff`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%6f";

/// Current local time as a microsecond-resolution file name timestamp
pub fn timestamp() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// `{dir}/{prefix}{timestamp}.json`
pub fn timestamped_path(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{prefix}{}.json", timestamp()))
}

/// Serialize `value` as JSON to `path`, creating parent directories.
pub fn write_json<T>(path: &Path, value: &T) -> anyhow::Result<()>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create output directory {}", parent.display()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let file = File::create(&tmp_path)
        .with_context(|| format!("Cannot create {}", tmp_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)
        .with_context(|| format!("Cannot serialize {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Cannot write {}", tmp_path.display()))?;
    drop(writer);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Cannot move {} into place", tmp_path.display()))?;
    log::debug!("Wrote {}", path.display());
    Ok(())
}

/// First finished file in `dir` whose name contains `_{id}_`.
///
/// A missing directory has no files. Unfinished `.tmp` files don't count.
pub fn find_existing(dir: &Path, id: &str) -> anyhow::Result<Option<PathBuf>> {
    let pattern = format!(
        "{}/*_{}_*",
        glob::Pattern::escape(&dir.to_string_lossy()),
        glob::Pattern::escape(id)
    );
    let paths = glob::glob(&pattern).with_context(|| format!("Invalid pattern {pattern}"))?;
    for path in paths {
        let path = path.context("Cannot read output directory entry")?;
        if path.extension().is_some_and(|ext| ext == "tmp") {
            continue;
        }
        return Ok(Some(path));
    }
    Ok(None)
}

/// Remove stale .tmp files left in `dir` by an interrupted run
pub fn cleanup_tmp_files(dir: &Path) -> std::io::Result<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn timestamp_has_twenty_digits() {
        let ts = timestamp();
        assert_eq!(ts.len(), 20, "{ts}");
        assert!(ts.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn timestamped_path_shape() {
        let path = timestamped_path(Path::new("/data"), "oscars_pan_finder_desy_data_");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("oscars_pan_finder_desy_data_"));
        assert!(name.ends_with(".json"));
        assert_eq!(name.len(), "oscars_pan_finder_desy_data_".len() + 20 + 5);
    }

    #[test]
    fn write_json_creates_dirs_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        write_json(&path, &json!([{"document": {"doi": "x"}}])).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written[0]["document"]["doi"], "x");
        assert!(!dir.path().join("nested/out.json.tmp").exists());
    }

    #[test]
    fn find_existing_matches_delimited_id() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("esrf_document_1234_20240101120000000000.json"),
            "{}",
        )
        .unwrap();

        assert!(find_existing(dir.path(), "1234").unwrap().is_some());
        assert!(find_existing(dir.path(), "123").unwrap().is_none());
        assert!(find_existing(dir.path(), "234").unwrap().is_none());
    }

    #[test]
    fn find_existing_ignores_tmp_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("esrf_document_77_20240101120000000000.json.tmp"),
            "{",
        )
        .unwrap();
        assert!(find_existing(dir.path(), "77").unwrap().is_none());
    }

    #[test]
    fn find_existing_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_existing(&dir.path().join("absent"), "1").unwrap().is_none());
    }

    #[test]
    fn find_existing_escapes_glob_characters() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("esrf_document_a[1]_1.json"), "{}").unwrap();
        assert!(find_existing(dir.path(), "a[1]").unwrap().is_some());
        assert!(find_existing(dir.path(), "a1").unwrap().is_none());
    }

    #[test]
    fn cleanup_removes_only_tmp() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("b.json.tmp"), "{").unwrap();
        cleanup_tmp_files(dir.path()).unwrap();
        assert!(dir.path().join("a.json").exists());
        assert!(!dir.path().join("b.json.tmp").exists());
    }
}
