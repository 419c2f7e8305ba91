//! ILL collector orchestration

use std::time::Instant;

use serde::Serialize;

use panfinder_core::{
    CatalogRecord, FilterParam, HttpListing, ProgressContext, RunSummary, Stage, StageTracker,
    collect_all, fmt_num, id_field, timestamped_path, write_json,
};

use crate::config::{Config, OUTPUT_PREFIX};
use crate::extract::IllDocument;
use crate::scrape::{DoiPages, ScrapeError};

const NAME: &str = "ill";

/// PaNOSC document with what its landing page adds
#[derive(Debug, Clone, Serialize)]
pub struct IllEntry {
    pub panosc: CatalogRecord,
    pub document: IllDocument,
}

/// A document dropped during enrichment
#[derive(Debug)]
pub struct FailedDocument {
    pub doi: Option<String>,
    pub error: ScrapeError,
}

/// Scrape every document's landing page.
///
/// A document whose page can't be fetched or extracted is dropped whole and
/// recorded in the returned failure list; the rest keep their order.
pub fn enrich_documents(
    documents: Vec<CatalogRecord>,
    pages: &DoiPages,
    mut tick: impl FnMut(),
) -> (Vec<IllEntry>, Vec<FailedDocument>) {
    let mut entries = Vec::with_capacity(documents.len());
    let mut failed = Vec::new();
    for panosc in documents {
        let doi = id_field(&panosc, "doi");
        let result = match doi.as_deref() {
            Some(doi) => pages.scrape(doi),
            None => Err(ScrapeError::MissingDoi),
        };
        match result {
            Ok(document) => entries.push(IllEntry { panosc, document }),
            Err(error) => {
                log::debug!("{NAME}: {} dropped: {error}", doi.as_deref().unwrap_or("?"));
                failed.push(FailedDocument { doi, error });
            }
        }
        tick();
    }
    (entries, failed)
}

/// Run the ILL collector
pub fn run(config: &Config, progress: &ProgressContext) -> anyhow::Result<RunSummary> {
    let mut stages = StageTracker::new(NAME, progress);
    let result = collect(config, progress, &mut stages);
    stages.finish(result)
}

fn collect(
    config: &Config,
    progress: &ProgressContext,
    stages: &mut StageTracker,
) -> anyhow::Result<RunSummary> {
    let start = Instant::now();

    log::info!("{NAME}: PaNOSC documents from {}", config.panosc_url);
    let listing = HttpListing::new(NAME, &config.panosc_url, "documents", FilterParam::Filter);
    let documents = collect_all(&listing, config.batch_limit, config.count_check, stages)?;
    let records = documents.len();

    stages.enter(Stage::Enriching);
    let pages = DoiPages::new(&config.doi_url);
    let bar = progress.record_bar(NAME, records);
    let (entries, failed) = enrich_documents(documents, &pages, || bar.inc(1));
    bar.finish_and_clear();

    if !failed.is_empty() {
        log::warn!(
            "{NAME}: {} documents without landing page data:",
            fmt_num(failed.len())
        );
        for failure in &failed {
            log::warn!("  {}", failure.doi.as_deref().unwrap_or("<no doi>"));
        }
    }

    stages.enter(Stage::Writing);
    let path = timestamped_path(&config.output_dir, OUTPUT_PREFIX);
    write_json(&path, &entries)?;
    log::info!(
        "{NAME}: wrote {} entries to {}",
        fmt_num(entries.len()),
        path.display()
    );

    let summary = RunSummary {
        records,
        entries: entries.len(),
        failed: failed.len(),
        files: vec![path],
        elapsed: start.elapsed(),
        ..RunSummary::empty(NAME)
    };
    summary.log();
    Ok(summary)
}
