//! ILL collector configuration

use std::num::NonZeroUsize;
use std::path::PathBuf;

use panfinder_core::{CountCheck, DEFAULT_BATCH_LIMIT};

pub const PANOSC_URL: &str = "https://fairdata.ill.fr/fairdata/api";
/// DOI resolver; landing pages live at `{DOI_URL}{doi}`
pub const DOI_URL: &str = "https://doi.ill.fr/";
pub const OUTPUT_PREFIX: &str = "oscars_pan_finder_ill_data_";

/// Runtime configuration for the ILL collector
#[derive(Debug, Clone)]
pub struct Config {
    /// PaNOSC search API base URL
    pub panosc_url: String,
    /// DOI resolver root, with trailing slash
    pub doi_url: String,
    pub batch_limit: NonZeroUsize,
    pub count_check: CountCheck,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            panosc_url: PANOSC_URL.to_string(),
            doi_url: DOI_URL.to_string(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            count_check: CountCheck::Warn,
            output_dir: PathBuf::from("../data"),
        }
    }
}
