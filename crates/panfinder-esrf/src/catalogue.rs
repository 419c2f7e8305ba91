//! Per-document catalogue enrichment
//!
//! Every sub-lookup stands alone: a failure turns into a placeholder string
//! in that slot and the rest of the entry is still filled in.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use panfinder_core::{CatalogRecord, FetchError, endpoint, get_json, str_field, strip_fields};

pub const ERROR_RETRIEVING: &str = "Error retrieving resource";
pub const NO_DOI: &str = "Not doi available";
pub const NO_SESSION_TOKEN: &str = "Session token not provided";
pub const NO_INVESTIGATION_ID: &str = "Investigation id not provided";

const INVESTIGATION_DROPPED: &[&str] = &["meta", "type"];
const DATASET_DROPPED: &[&str] = &["investigation", "meta"];
const PARAMETER_DROPPED: &[&str] = &["id", "datasetId"];

/// A lookup result, or the placeholder written in its place
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Lookup<T> {
    Found(T),
    Unavailable(&'static str),
}

impl<T> Lookup<T> {
    /// The lookup was attempted and failed
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Unavailable(msg) if *msg == ERROR_RETRIEVING)
    }

    pub fn found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }
}

/// Output of the catalogue collector for one PaNOSC document
#[derive(Debug, Clone, Serialize)]
pub struct CatalogueEntry {
    pub panosc: CatalogRecord,
    pub datacite: Lookup<Value>,
    pub catalogue: Lookup<CatalogRecord>,
    pub datasets: Lookup<Vec<CatalogRecord>>,
}

impl CatalogueEntry {
    pub fn has_fault(&self) -> bool {
        self.datacite.is_fault() || self.catalogue.is_fault() || self.datasets.is_fault()
    }
}

/// ICAT+ endpoints used for enrichment
pub trait CatalogueApi {
    /// DataCite JSON for a DOI
    fn datacite(&self, doi: &str) -> Result<Value, FetchError>;
    /// `investigation?ids={pid}`
    fn investigations(&self, token: &str, pid: &str) -> Result<Vec<Value>, FetchError>;
    /// Acquisition datasets of investigation `pid`, newest first
    fn datasets(&self, token: &str, pid: &str) -> Result<Vec<Value>, FetchError>;
}

/// ICAT+ over HTTP
#[derive(Debug, Clone)]
pub struct HttpCatalogue {
    base_url: String,
}

impl HttpCatalogue {
    pub fn new(icat_plus_url: &str) -> Self {
        Self {
            base_url: icat_plus_url.to_string(),
        }
    }

    pub fn datacite_url(&self, doi: &str) -> String {
        endpoint(&self.base_url, &format!("doi/{doi}/json-datacite"))
    }

    pub fn catalogue_url(&self, token: &str, resource: &str) -> String {
        endpoint(&self.base_url, &format!("catalogue/{token}/{resource}"))
    }
}

impl CatalogueApi for HttpCatalogue {
    fn datacite(&self, doi: &str) -> Result<Value, FetchError> {
        get_json(&self.datacite_url(doi), &[] as &[(&str, &str)], "DataCite record")
    }

    fn investigations(&self, token: &str, pid: &str) -> Result<Vec<Value>, FetchError> {
        get_json(
            &self.catalogue_url(token, "investigation"),
            &[("ids", pid)],
            "investigation list",
        )
    }

    fn datasets(&self, token: &str, pid: &str) -> Result<Vec<Value>, FetchError> {
        let query = [
            ("investigationIds", pid),
            ("datasetType", "acquisition"),
            ("sortBy", "STARTDATE"),
            ("sortOrder", "-1"),
            ("nested", "true"),
        ];
        get_json(&self.catalogue_url(token, "dataset"), &query, "dataset list")
    }
}

/// Reason a lookup produced the error placeholder
#[derive(Debug)]
enum LookupFault {
    Fetch(FetchError),
    Shape(&'static str),
}

impl fmt::Display for LookupFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "{e}"),
            Self::Shape(what) => write!(f, "unexpected response: {what}"),
        }
    }
}

impl From<FetchError> for LookupFault {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

fn settle<T>(what: &str, pid: &str, result: Result<T, LookupFault>) -> Lookup<T> {
    match result {
        Ok(value) => Lookup::Found(value),
        Err(e) => {
            log::warn!("{pid}: {what} lookup failed: {e}");
            Lookup::Unavailable(ERROR_RETRIEVING)
        }
    }
}

fn into_record(value: Value, what: &'static str) -> Result<CatalogRecord, LookupFault> {
    match value {
        Value::Object(record) => Ok(record),
        _ => Err(LookupFault::Shape(what)),
    }
}

/// Dataset minus `investigation`/`meta`, each parameter minus `id`/`datasetId`.
///
/// A dataset without a `parameters` list, or a parameter missing either
/// key, is malformed.
fn clean_dataset(value: Value) -> Result<CatalogRecord, LookupFault> {
    let mut dataset = into_record(value, "dataset is not an object")?;
    strip_fields(&mut dataset, DATASET_DROPPED);
    let parameters = dataset
        .get_mut("parameters")
        .and_then(Value::as_array_mut)
        .ok_or(LookupFault::Shape("dataset without parameters"))?;
    for parameter in parameters.iter_mut() {
        let parameter = parameter
            .as_object_mut()
            .ok_or(LookupFault::Shape("parameter is not an object"))?;
        if strip_fields(parameter, PARAMETER_DROPPED) != PARAMETER_DROPPED.len() {
            return Err(LookupFault::Shape("parameter without id"));
        }
    }
    Ok(dataset)
}

pub fn datacite_lookup<A>(api: &A, pid: &str, doi: Option<&str>) -> Lookup<Value>
where
    A: CatalogueApi + ?Sized,
{
    match doi {
        Some(doi) if !doi.is_empty() => {
            settle("DataCite", pid, api.datacite(doi).map_err(LookupFault::from))
        }
        _ => Lookup::Unavailable(NO_DOI),
    }
}

pub fn investigation_lookup<A>(api: &A, token: &str, pid: &str) -> Lookup<CatalogRecord>
where
    A: CatalogueApi + ?Sized,
{
    if token.is_empty() {
        return Lookup::Unavailable(NO_SESSION_TOKEN);
    }
    if pid.is_empty() {
        return Lookup::Unavailable(NO_INVESTIGATION_ID);
    }
    let result = api
        .investigations(token, pid)
        .map_err(LookupFault::from)
        .and_then(|list| {
            let first = list
                .into_iter()
                .next()
                .ok_or(LookupFault::Shape("empty investigation list"))?;
            let mut investigation = into_record(first, "investigation is not an object")?;
            strip_fields(&mut investigation, INVESTIGATION_DROPPED);
            Ok(investigation)
        });
    settle("investigation", pid, result)
}

pub fn datasets_lookup<A>(api: &A, token: &str, pid: &str) -> Lookup<Vec<CatalogRecord>>
where
    A: CatalogueApi + ?Sized,
{
    if token.is_empty() {
        return Lookup::Unavailable(NO_SESSION_TOKEN);
    }
    if pid.is_empty() {
        return Lookup::Unavailable(NO_INVESTIGATION_ID);
    }
    let result = api
        .datasets(token, pid)
        .map_err(LookupFault::from)
        .and_then(|list| list.into_iter().map(clean_dataset).collect());
    settle("datasets", pid, result)
}

/// Build the full entry for one PaNOSC document with investigation `pid`
pub fn enrich_document<A>(api: &A, token: &str, pid: &str, panosc: CatalogRecord) -> CatalogueEntry
where
    A: CatalogueApi + ?Sized,
{
    let datacite = datacite_lookup(api, pid, str_field(&panosc, "doi"));
    let catalogue = investigation_lookup(api, token, pid);
    let datasets = datasets_lookup(api, token, pid);
    CatalogueEntry {
        panosc,
        datacite,
        catalogue,
        datasets,
    }
}
