//! Collector orchestration for SciCat facilities

use std::time::Instant;

use anyhow::Context;

use panfinder_core::{
    ProgressContext, RunSummary, Stage, StageTracker, collect_all, fmt_num, timestamped_path,
    write_json,
};

use crate::api::{ScicatApi, panosc_documents, published_data};
use crate::config::Config;
use crate::enrich::{PanoscIndex, PanoscJoin, enrich_all};

/// Run the published data collector for `config.facility`
pub fn run(config: &Config, progress: &ProgressContext) -> anyhow::Result<RunSummary> {
    let mut stages = StageTracker::new(config.facility.name(), progress);
    let result = collect(config, progress, &mut stages);
    stages.finish(result)
}

fn collect(
    config: &Config,
    progress: &ProgressContext,
    stages: &mut StageTracker,
) -> anyhow::Result<RunSummary> {
    let start = Instant::now();
    let name = config.facility.name();

    // PaNOSC documents first so a bad join source fails before the long part
    let index = match &config.panosc {
        Some(source) => {
            log::info!("{name}: PaNOSC documents from {}", source.url);
            let listing = panosc_documents(&format!("{name} panosc"), &source.url);
            let documents =
                collect_all(&listing, config.batch_limit, source.count_check, stages)?;
            let index = PanoscIndex::from_documents(documents);
            log::info!("{name}: {} PaNOSC documents indexed", fmt_num(index.len()));
            Some((index, source.join_key.as_str()))
        }
        None => None,
    };
    let join = index
        .as_ref()
        .map(|(index, key)| PanoscJoin { index, key: *key });

    log::info!("{name}: published data from {}", config.catalog_url);
    let listing = published_data(name, &config.catalog_url);
    let documents = collect_all(&listing, config.batch_limit, config.count_check, stages)?;
    let records = documents.len();

    stages.enter(Stage::Enriching);
    let api = ScicatApi::new(&config.catalog_url);
    let bar = progress.record_bar(name, records);
    let entries = enrich_all(documents, &api, join.as_ref(), &bar)
        .with_context(|| format!("{name}: dataset lookup failed"))?;
    bar.finish_and_clear();
    let joined = entries.iter().filter(|e| e.panosc.is_some()).count();
    if join.is_some() {
        log::info!(
            "{name}: {} of {} documents joined to PaNOSC",
            fmt_num(joined),
            fmt_num(records)
        );
    }

    stages.enter(Stage::Writing);
    let path = timestamped_path(&config.output_dir, config.facility.output_prefix());
    write_json(&path, &entries)?;
    log::info!(
        "{name}: wrote {} entries to {}",
        fmt_num(entries.len()),
        path.display()
    );

    let summary = RunSummary {
        records,
        entries: entries.len(),
        files: vec![path],
        elapsed: start.elapsed(),
        ..RunSummary::empty(name)
    };
    summary.log();
    Ok(summary)
}
