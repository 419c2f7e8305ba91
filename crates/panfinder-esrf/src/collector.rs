//! ESRF catalogue collector: one file per PaNOSC document
//!
//! Re-runs are incremental. A document whose file already exists in the
//! output directory is skipped without any request.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;

use panfinder_core::{
    ProgressContext, RunSummary, Stage, StageTracker, cleanup_tmp_files, find_existing, fmt_num,
    id_field, timestamp, write_json,
};

use crate::catalogue::{CatalogueApi, enrich_document};
use crate::config::{Config, DOCUMENT_FILE_PREFIX};
use crate::documents::{PanoscEntry, read_documents};
use crate::session::SessionTokenProvider;

const NAME: &str = "esrf-catalogue";

/// How many of `total` documents a run handles; below 1 means all
pub fn documents_to_process(total: usize, requested: i64) -> usize {
    if requested < 1 {
        total
    } else {
        usize::try_from(requested).map_or(total, |n| n.min(total))
    }
}

/// Pid as used in file names; `/` can't appear in one
pub fn file_id(pid: &str) -> String {
    pid.replace('/', "_")
}

/// `{dir}/esrf_document_{pid}_{timestamp}.json`
pub fn document_path(dir: &Path, pid: &str) -> PathBuf {
    dir.join(format!(
        "{DOCUMENT_FILE_PREFIX}{}_{}.json",
        file_id(pid),
        timestamp()
    ))
}

/// Enrich the first `count` documents of `input` into the output directory
pub fn run<A, P>(
    config: &Config,
    input: &Path,
    count: i64,
    api: &A,
    tokens: &P,
    progress: &ProgressContext,
) -> anyhow::Result<RunSummary>
where
    A: CatalogueApi + ?Sized,
    P: SessionTokenProvider + ?Sized,
{
    let mut stages = StageTracker::new(NAME, progress);
    let result = collect(config, input, count, api, tokens, progress, &mut stages);
    stages.finish(result)
}

fn collect<A, P>(
    config: &Config,
    input: &Path,
    count: i64,
    api: &A,
    tokens: &P,
    progress: &ProgressContext,
    stages: &mut StageTracker,
) -> anyhow::Result<RunSummary>
where
    A: CatalogueApi + ?Sized,
    P: SessionTokenProvider + ?Sized,
{
    let start = Instant::now();

    stages.enter(Stage::Counting);
    let entries = read_documents(input)?;
    let total = documents_to_process(entries.len(), count);
    log::info!(
        "{NAME}: {} documents in {}, processing {}",
        fmt_num(entries.len()),
        input.display(),
        fmt_num(total)
    );

    cleanup_tmp_files(&config.output_dir)
        .with_context(|| format!("Cannot clean {}", config.output_dir.display()))?;

    let mut summary = RunSummary::empty(NAME);
    let mut session: Option<String> = None;
    let bar = progress.record_bar(NAME, total);

    for (index, PanoscEntry { panosc }) in entries.iter().take(total).enumerate() {
        let pid = id_field(panosc, "pid")
            .with_context(|| format!("document {} has no pid", index + 1))?;
        summary.records += 1;

        if let Some(existing) = find_existing(&config.output_dir, &file_id(&pid))? {
            log::debug!("{pid}: already retrieved as {}", existing.display());
            summary.skipped += 1;
            bar.inc(1);
            continue;
        }

        // The portal is only opened once something actually needs fetching
        if session.is_none() {
            log::info!("{NAME}: opening catalogue session");
            session = Some(tokens.session_token(&entries)?);
        }
        let token = session.as_deref().unwrap_or_default();

        stages.enter(Stage::Enriching);
        let entry = enrich_document(api, token, &pid, panosc.clone());
        if entry.has_fault() {
            summary.failed += 1;
        }

        stages.enter(Stage::Writing);
        let path = document_path(&config.output_dir, &pid);
        write_json(&path, &entry)?;
        summary.entries += 1;
        summary.files.push(path);
        bar.inc(1);
    }
    bar.finish_and_clear();

    summary.elapsed = start.elapsed();
    summary.log();
    Ok(summary)
}
