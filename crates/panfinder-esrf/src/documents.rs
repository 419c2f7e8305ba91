//! ESRF PaNOSC documents list
//!
//! The list written here is the input of the catalogue collector.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use panfinder_core::{
    CatalogRecord, FilterParam, HttpListing, ProgressContext, RunSummary, Stage, StageTracker,
    collect_all, fmt_num, timestamped_path, write_json,
};

use crate::config::{Config, DOCUMENTS_PREFIX};

const NAME: &str = "esrf";

/// One element of the documents file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoscEntry {
    pub panosc: CatalogRecord,
}

/// Read a documents file written by [`run`]
pub fn read_documents(path: &Path) -> anyhow::Result<Vec<PanoscEntry>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("{} is not a PaNOSC documents file", path.display()))
}

/// Collect every public ESRF PaNOSC document into one file
pub fn run(config: &Config, progress: &ProgressContext) -> anyhow::Result<RunSummary> {
    let mut stages = StageTracker::new(NAME, progress);
    let result = collect(config, &mut stages);
    stages.finish(result)
}

fn collect(config: &Config, stages: &mut StageTracker) -> anyhow::Result<RunSummary> {
    let start = Instant::now();

    log::info!("{NAME}: PaNOSC documents from {}", config.panosc_url);
    let listing = HttpListing::new(NAME, &config.panosc_url, "Documents", FilterParam::Filter);
    let documents = collect_all(&listing, config.batch_limit, config.count_check, stages)?;
    let records = documents.len();

    stages.enter(Stage::Writing);
    let entries: Vec<PanoscEntry> = documents
        .into_iter()
        .map(|panosc| PanoscEntry { panosc })
        .collect();
    let path = timestamped_path(&config.output_dir, DOCUMENTS_PREFIX);
    write_json(&path, &entries)?;
    log::info!(
        "{NAME}: wrote {} documents to {}",
        fmt_num(entries.len()),
        path.display()
    );

    let summary = RunSummary {
        records,
        entries: entries.len(),
        files: vec![path],
        elapsed: start.elapsed(),
        ..RunSummary::empty(NAME)
    };
    summary.log();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_documents_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        fs::write(
            &path,
            json!([{"panosc": {"pid": "1", "doi": "10.15151/ESRF-ES-1"}}]).to_string(),
        )
        .unwrap();

        let entries = read_documents(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].panosc["pid"], "1");
    }

    #[test]
    fn read_documents_rejects_other_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        fs::write(&path, r#"{"panosc": []}"#).unwrap();
        let err = read_documents(&path).unwrap_err();
        assert!(format!("{err:#}").contains("not a PaNOSC documents file"));

        assert!(read_documents(&dir.path().join("missing.json")).is_err());
    }
}
