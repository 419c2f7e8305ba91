//! SciCat collector configuration

use std::num::NonZeroUsize;
use std::path::PathBuf;

use panfinder_core::{CountCheck, DEFAULT_BATCH_LIMIT};

use crate::state::Facility;

/// PaNOSC document listing joined onto catalog documents
#[derive(Debug, Clone)]
pub struct PanoscSource {
    /// PaNOSC search API base URL
    pub url: String,
    /// Catalog document field looked up in the PaNOSC pid index
    pub join_key: String,
    pub count_check: CountCheck,
}

/// Runtime configuration for one SciCat collector run
#[derive(Debug, Clone)]
pub struct Config {
    pub facility: Facility,
    /// SciCat API base URL (`.../api/v3`)
    pub catalog_url: String,
    pub panosc: Option<PanoscSource>,
    /// Listing page size
    pub batch_limit: NonZeroUsize,
    /// Published data count mismatch policy
    pub count_check: CountCheck,
    /// Directory receiving the output file
    pub output_dir: PathBuf,
}

impl Config {
    /// Facility defaults
    pub fn for_facility(facility: Facility) -> Self {
        Self {
            facility,
            catalog_url: facility.catalog_url().to_string(),
            panosc: facility.panosc_url().map(|url| PanoscSource {
                url: url.to_string(),
                join_key: facility.panosc_join_key().to_string(),
                count_check: CountCheck::Warn,
            }),
            batch_limit: DEFAULT_BATCH_LIMIT,
            count_check: facility.count_check(),
            output_dir: PathBuf::from("../data"),
        }
    }
}
