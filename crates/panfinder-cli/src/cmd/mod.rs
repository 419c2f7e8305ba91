//! Subcommands

pub mod esrf;
pub mod ill;
pub mod scicat;

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};

use panfinder_core::RunSummary;
use panfinder_scicat::Facility;

use crate::config::Config;

fn table(title: &str) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new(title).fg(Color::Cyan),
            Cell::new("Value").fg(Color::Cyan),
        ]);
    table
}

/// End-of-run table on stderr
pub fn print_summary(title: &str, summary: &RunSummary) {
    let mut table = table(title);
    for (label, value) in summary.rows() {
        table.add_row(vec![Cell::new(label), Cell::new(value)]);
    }
    eprintln!("\n{table}");
}

/// `panfinder config`
pub fn show_config(config: &Config) {
    let http = config.http.http_config();
    let ill = config.ill();
    let esrf = config.esrf();

    let mut table = table("Setting");
    table.add_row(vec![
        "Data directory",
        &config.output.data_dir.display().to_string(),
    ]);
    table.add_row(vec![
        "Timeouts",
        &format!(
            "connect {}s, request {}s",
            http.connect_timeout.as_secs(),
            http.request_timeout.as_secs()
        ),
    ]);
    table.add_row(vec!["User agent", &http.user_agent]);

    for &facility in Facility::all() {
        let scicat = config.scicat(facility);
        let name = scicat.facility.name().to_uppercase();
        table.add_row(vec![format!("{name} catalog"), scicat.catalog_url.clone()]);
        table.add_row(vec![
            format!("{name} PaNOSC"),
            match &scicat.panosc {
                Some(p) => format!("{} (join on {})", p.url, p.join_key),
                None => "none".to_string(),
            },
        ]);
        table.add_row(vec![
            format!("{name} batch / count check"),
            format!("{} / {:?}", scicat.batch_limit, scicat.count_check),
        ]);
    }

    table.add_row(vec!["ILL PaNOSC", &ill.panosc_url]);
    table.add_row(vec!["ILL DOI pages", &ill.doi_url]);
    table.add_row(vec![
        "ILL batch / count check",
        &format!("{} / {:?}", ill.batch_limit, ill.count_check),
    ]);

    table.add_row(vec!["ESRF PaNOSC", &esrf.panosc_url]);
    table.add_row(vec!["ESRF ICAT+", &esrf.icat_plus_url]);
    table.add_row(vec!["ESRF portal", &esrf.portal_url]);
    table.add_row(vec![
        "ESRF batch / count check",
        &format!("{} / {:?}", esrf.batch_limit, esrf.count_check),
    ]);
    table.add_row(vec!["ESRF documents per run", &config.esrf.count.to_string()]);
    table.add_row(vec![
        "ESRF session token",
        if config.esrf.session_token.is_some() {
            "configured"
        } else {
            "not set"
        },
    ]);
    table.add_row(vec!["ESRF output", &esrf.output_dir.display().to_string()]);

    eprintln!("\n{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_table_covers_every_scicat_facility() {
        let config = Config::default();
        let urls: Vec<String> = Facility::all()
            .iter()
            .map(|&f| config.scicat(f).catalog_url)
            .collect();
        assert_eq!(
            urls,
            ["https://public-data.desy.de/api/v3", "https://scicat.maxiv.lu.se/api/v3"]
        );
        show_config(&config);
    }
}
