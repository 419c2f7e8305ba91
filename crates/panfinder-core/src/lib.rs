//! Panfinder Core - Common infrastructure for facility catalog collectors
//!
//! This crate provides the pieces every PaN-Finder collector is built from:
//! a blocking HTTP client, the count + paginate loop over catalog listings,
//! record field helpers, timestamped JSON output and run stage tracking.

pub mod error;
pub mod http;
pub mod logging;
pub mod output;
pub mod paginate;
pub mod progress;
pub mod record;
pub mod stage;
pub mod summary;

// Re-exports for convenience
pub use error::FetchError;
pub use http::{
    HttpConfig, SHARED_RUNTIME, endpoint, get_json, get_text, http_config,
    path_segment, set_http_config,
};
pub use logging::{IndicatifLogger, init_logging};
pub use output::{cleanup_tmp_files, find_existing, timestamp, timestamped_path, write_json};
pub use paginate::{
    CountCheck, Cursor, DEFAULT_BATCH_LIMIT, FilterParam, HttpListing, ListingSource, collect_all,
    paginate,
};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use record::{
    CatalogRecord, EXCLUDED_DOCUMENT_FIELDS, id_array, id_field, str_field, strip_fields,
};
pub use stage::{Stage, StageTracker};
pub use summary::RunSummary;
