//! Count + paginate over catalog listing endpoints.
//!
//! SciCat and PaNOSC listings take a JSON `{"skip":S,"limit":L}` object in
//! a single query parameter. The parameter is named `limits` on SciCat
//! `publisheddata` and `filter` on PaNOSC `documents`.

use std::fmt;
use std::num::NonZeroUsize;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::http::{endpoint, get_json};
use crate::progress::fmt_num;
use crate::record::CatalogRecord;
use crate::stage::{Stage, StageTracker};

/// Default listing page size
pub const DEFAULT_BATCH_LIMIT: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Position of the next page request.
///
/// Advances by the number of records the last page actually returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cursor {
    pub skip: usize,
    pub limit: usize,
}

impl Cursor {
    pub fn start(limit: NonZeroUsize) -> Self {
        Self {
            skip: 0,
            limit: limit.get(),
        }
    }

    /// Compact JSON form sent to the listing endpoint
    pub fn to_filter_json(&self) -> String {
        // Two integer fields: serialization can't fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Name of the query parameter carrying the pagination object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterParam {
    /// PaNOSC search API (`?filter=...`)
    Filter,
    /// SciCat published data (`?limits=...`)
    Limits,
}

impl FilterParam {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Limits => "limits",
        }
    }
}

impl fmt::Display for FilterParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do when the paginated total differs from the reported count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountCheck {
    /// Mismatch aborts the run
    Strict,
    /// Mismatch is logged and collection continues
    #[default]
    Warn,
}

impl CountCheck {
    pub fn verify(self, label: &str, expected: usize, collected: usize) -> anyhow::Result<()> {
        if expected == collected {
            log::info!("{label}: correct number of records collected ({})", fmt_num(collected));
            return Ok(());
        }
        match self {
            Self::Strict => anyhow::bail!(
                "{label}: collected {collected} records but count endpoint reported {expected}"
            ),
            Self::Warn => {
                log::warn!(
                    "{label}: collected {collected} records, count endpoint reported {expected}"
                );
                Ok(())
            }
        }
    }
}

/// A listing that can report its size and return pages of records
pub trait ListingSource {
    /// Short name for logs
    fn label(&self) -> &str;

    /// Total number of records the source reports
    fn count(&self) -> Result<usize, FetchError>;

    /// Records at `cursor.skip`, at most `cursor.limit` of them
    fn page(&self, cursor: Cursor) -> Result<Vec<CatalogRecord>, FetchError>;
}

/// Listing served over HTTP: `{base}/{path}` and `{base}/{path}/count`
#[derive(Debug, Clone)]
pub struct HttpListing {
    label: String,
    url: String,
    count_url: String,
    param: FilterParam,
}

impl HttpListing {
    pub fn new(label: impl Into<String>, base_url: &str, path: &str, param: FilterParam) -> Self {
        let url = endpoint(base_url, path);
        let count_url = endpoint(&url, "count");
        Self {
            label: label.into(),
            url,
            count_url,
            param,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn count_url(&self) -> &str {
        &self.count_url
    }
}

#[derive(Deserialize)]
struct CountResponse {
    count: usize,
}

impl ListingSource for HttpListing {
    fn label(&self) -> &str {
        &self.label
    }

    fn count(&self) -> Result<usize, FetchError> {
        let response: CountResponse =
            get_json(&self.count_url, &[] as &[(&str, &str)], "count response")?;
        Ok(response.count)
    }

    fn page(&self, cursor: Cursor) -> Result<Vec<CatalogRecord>, FetchError> {
        let query = [(self.param.as_str(), cursor.to_filter_json())];
        get_json(&self.url, &query, "listing page")
    }
}

/// Pull every record from `source`, `limit` at a time.
///
/// Stops on the first page whose length is not `limit`; a total that is an exact
/// multiple of `limit` costs one extra request returning an empty page.
/// `on_page` sees the cursor used and the page length after each request.
pub fn paginate<S>(
    source: &S,
    limit: NonZeroUsize,
    mut on_page: impl FnMut(Cursor, usize),
) -> Result<Vec<CatalogRecord>, FetchError>
where
    S: ListingSource + ?Sized,
{
    let mut records = Vec::new();
    let mut cursor = Cursor::start(limit);
    loop {
        let page = source.page(cursor)?;
        let returned = page.len();
        records.extend(page);
        on_page(cursor, returned);
        log::debug!(
            "{}: skip={} returned {returned} (total {})",
            source.label(),
            cursor.skip,
            records.len()
        );
        // Longer than asked means the filter was ignored
        if returned != cursor.limit {
            break;
        }
        cursor.skip += returned;
    }
    Ok(records)
}

/// Counting + Paginating stages for one listing.
///
/// A failed count request is fatal before any page is fetched; the
/// paginated total is then checked against the count with `check`.
pub fn collect_all<S>(
    source: &S,
    limit: NonZeroUsize,
    check: CountCheck,
    stages: &mut StageTracker,
) -> anyhow::Result<Vec<CatalogRecord>>
where
    S: ListingSource + ?Sized,
{
    let label = source.label().to_string();

    stages.enter(Stage::Counting);
    let expected = source
        .count()
        .with_context(|| format!("{label}: count request failed"))?;
    log::info!("{label}: {} records available", fmt_num(expected));

    stages.enter(Stage::Paginating);
    let line = stages.line().clone();
    let records = paginate(source, limit, |cursor, returned| {
        line.set_message(format!(
            "paginating {label}: {}/{}",
            fmt_num(cursor.skip + returned),
            fmt_num(expected)
        ));
    })
    .with_context(|| format!("{label}: pagination failed"))?;

    check.verify(&label, expected, records.len())?;
    Ok(records)
}
