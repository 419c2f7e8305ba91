//! DOI landing page retrieval

use std::fmt;

use panfinder_core::{FetchError, get_text};

use crate::extract::{ExtractError, HtmlExtractor, IllDocument, extract_document};

/// Why a PaNOSC document produced no entry
#[derive(Debug)]
pub enum ScrapeError {
    /// PaNOSC document has no `doi`
    MissingDoi,
    Fetch(FetchError),
    Extract(ExtractError),
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDoi => write!(f, "document has no doi"),
            Self::Fetch(e) => write!(f, "landing page: {e}"),
            Self::Extract(e) => write!(f, "extraction: {e}"),
        }
    }
}

impl std::error::Error for ScrapeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingDoi => None,
            Self::Fetch(e) => Some(e),
            Self::Extract(e) => Some(e),
        }
    }
}

impl From<FetchError> for ScrapeError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl From<ExtractError> for ScrapeError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

/// Landing pages under a DOI resolver root
#[derive(Debug, Clone)]
pub struct DoiPages {
    base_url: String,
}

impl DoiPages {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }

    /// DOIs are appended as-is, their `/` included
    pub fn landing_url(&self, doi: &str) -> String {
        format!("{}{doi}", self.base_url)
    }

    /// Fetch and extract the landing page for `doi`
    pub fn scrape(&self, doi: &str) -> Result<IllDocument, ScrapeError> {
        let url = self.landing_url(doi);
        let page = get_text(&url, &[] as &[(&str, &str)])?;
        let extractor = HtmlExtractor::parse(&page, &self.base_url);
        Ok(extract_document(&url, &extractor)?)
    }
}
