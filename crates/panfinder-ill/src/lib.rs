//! Panfinder ILL - PaNOSC documents enriched from DOI landing pages
//!
//! ILL's PaNOSC search API lists the published documents; details such as
//! proposal, instruments, authors and parameters only exist on the
//! `doi.ill.fr` landing page and are scraped from its HTML.

pub mod config;
pub mod extract;
pub mod runner;
pub mod scrape;

pub use config::Config;
pub use extract::{DocumentFieldExtractor, ExtractError, HtmlExtractor, IllDocument};
pub use runner::{FailedDocument, IllEntry, run};
pub use scrape::{DoiPages, ScrapeError};
