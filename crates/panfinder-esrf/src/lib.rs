//! Panfinder ESRF - PaNOSC documents and ICAT+ catalogue enrichment
//!
//! Two collectors: `documents` lists every public PaNOSC document into one
//! file, `collector` enriches those documents one file each from the
//! DataCite and session-scoped catalogue endpoints.

pub mod catalogue;
pub mod collector;
pub mod config;
pub mod documents;
pub mod session;

pub use catalogue::{CatalogueApi, CatalogueEntry, HttpCatalogue, Lookup};
pub use config::Config;
pub use documents::{PanoscEntry, read_documents};
pub use session::{NoBrowser, SessionError, SessionTokenProvider, StaticToken};

#[cfg(feature = "browser")]
pub use session::BrowserTokenProvider;
