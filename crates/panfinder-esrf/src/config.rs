//! ESRF collector configuration

use std::num::NonZeroUsize;
use std::path::PathBuf;

use panfinder_core::{CountCheck, DEFAULT_BATCH_LIMIT};

/// PaNOSC search API
pub const PANOSC_URL: &str = "https://icatplus.esrf.fr/api";
/// ICAT+ root serving `catalogue/{token}/...` and `doi/{doi}/json-datacite`
pub const ICAT_PLUS_URL: &str = "https://icatplus.esrf.fr";
/// Data portal opened to obtain a catalogue session
pub const PORTAL_URL: &str = "https://data.esrf.fr";

pub const DOCUMENTS_PREFIX: &str = "oscars_pan_finder_esrf_panosc_documents_";
pub const DOCUMENT_FILE_PREFIX: &str = "esrf_document_";

/// Documents enriched per catalogue run when no count is given
pub const DEFAULT_DOCUMENT_COUNT: i64 = 5;

/// Runtime configuration shared by both ESRF collectors
#[derive(Debug, Clone)]
pub struct Config {
    pub panosc_url: String,
    pub icat_plus_url: String,
    pub portal_url: String,
    pub batch_limit: NonZeroUsize,
    /// Document count mismatch policy
    pub count_check: CountCheck,
    /// Directory for both the documents list and per-document files
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            panosc_url: PANOSC_URL.to_string(),
            icat_plus_url: ICAT_PLUS_URL.to_string(),
            portal_url: PORTAL_URL.to_string(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            count_check: CountCheck::Strict,
            output_dir: PathBuf::from("../data/esrf"),
        }
    }
}
