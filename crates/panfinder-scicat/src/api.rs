//! SciCat HTTP endpoints

use serde_json::Value;

use panfinder_core::{FetchError, FilterParam, HttpListing, endpoint, get_json, path_segment};

/// Dataset detail lookup by pid
pub trait DatasetLookup {
    fn dataset(&self, pid: &str) -> Result<Value, FetchError>;
}

/// `{catalog}/datasets/{pid}` against a SciCat v3 API
#[derive(Debug, Clone)]
pub struct ScicatApi {
    datasets_url: String,
}

impl ScicatApi {
    pub fn new(catalog_url: &str) -> Self {
        Self {
            datasets_url: endpoint(catalog_url, "datasets"),
        }
    }

    pub fn dataset_url(&self, pid: &str) -> String {
        endpoint(&self.datasets_url, &path_segment(pid))
    }
}

impl DatasetLookup for ScicatApi {
    fn dataset(&self, pid: &str) -> Result<Value, FetchError> {
        get_json(&self.dataset_url(pid), &[] as &[(&str, &str)], "dataset")
    }
}

/// Published data listing, paged with `limits`
pub fn published_data(label: &str, catalog_url: &str) -> HttpListing {
    HttpListing::new(label, catalog_url, "publisheddata", FilterParam::Limits)
}

/// PaNOSC document listing, paged with `filter`
pub fn panosc_documents(label: &str, search_url: &str) -> HttpListing {
    HttpListing::new(label, search_url, "documents", FilterParam::Filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_url_keeps_doi_in_one_segment() {
        let api = ScicatApi::new("https://public-data.desy.de/api/v3/");
        assert_eq!(
            api.dataset_url("10.5072/abc def"),
            "https://public-data.desy.de/api/v3/datasets/10.5072%2Fabc+def"
        );
    }

    #[test]
    fn listing_urls() {
        let listing = published_data("desy", "https://public-data.desy.de/api/v3");
        assert_eq!(listing.url(), "https://public-data.desy.de/api/v3/publisheddata");
        assert_eq!(
            listing.count_url(),
            "https://public-data.desy.de/api/v3/publisheddata/count"
        );

        let panosc = panosc_documents("maxiv panosc", "https://searchapi.maxiv.lu.se/api");
        assert_eq!(panosc.count_url(), "https://searchapi.maxiv.lu.se/api/documents/count");
    }
}
