//! Published data enrichment: datasets by pid and the PaNOSC join

use std::collections::HashMap;

use indicatif::ProgressBar;
use serde::Serialize;
use serde_json::Value;

use panfinder_core::{
    CatalogRecord, EXCLUDED_DOCUMENT_FIELDS, FetchError, id_array, id_field, strip_fields,
};

use crate::api::DatasetLookup;

/// One output entry per published data document
#[derive(Debug, Clone, Serialize)]
pub struct PublishedEntry {
    pub document: CatalogRecord,
    pub datasets: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panosc: Option<CatalogRecord>,
}

/// PaNOSC documents indexed by their `pid`
#[derive(Debug, Default)]
pub struct PanoscIndex {
    by_pid: HashMap<String, CatalogRecord>,
}

impl PanoscIndex {
    /// Documents without a pid can't be joined and are left out.
    /// On duplicate pids the later document wins.
    pub fn from_documents(documents: Vec<CatalogRecord>) -> Self {
        let mut by_pid = HashMap::with_capacity(documents.len());
        for document in documents {
            match id_field(&document, "pid") {
                Some(pid) => {
                    by_pid.insert(pid, document);
                }
                None => log::debug!("PaNOSC document without pid skipped"),
            }
        }
        Self { by_pid }
    }

    pub fn get(&self, pid: &str) -> Option<&CatalogRecord> {
        self.by_pid.get(pid)
    }

    pub fn len(&self) -> usize {
        self.by_pid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_pid.is_empty()
    }
}

/// PaNOSC index plus the document field looked up in it
pub struct PanoscJoin<'a> {
    pub index: &'a PanoscIndex,
    pub key: &'a str,
}

impl PanoscJoin<'_> {
    fn lookup(&self, document: &CatalogRecord) -> Option<CatalogRecord> {
        let value = id_field(document, self.key)?;
        self.index.get(&value).cloned()
    }
}

/// Datasets for `pids`, fetched one at a time in order
pub fn fetch_datasets<L>(lookup: &L, pids: &[String]) -> Result<Vec<Value>, FetchError>
where
    L: DatasetLookup + ?Sized,
{
    pids.iter().map(|pid| lookup.dataset(pid)).collect()
}

/// Build the entry for one published data document.
///
/// `thumbnail` and `history` are dropped, then every id in `pidArray` is
/// resolved. The first failed dataset lookup aborts the entry.
pub fn enrich<L>(
    mut document: CatalogRecord,
    lookup: &L,
    join: Option<&PanoscJoin<'_>>,
) -> Result<PublishedEntry, FetchError>
where
    L: DatasetLookup + ?Sized,
{
    strip_fields(&mut document, EXCLUDED_DOCUMENT_FIELDS);
    let pids = id_array(&document, "pidArray");
    let datasets = fetch_datasets(lookup, &pids)?;
    let panosc = join.and_then(|join| join.lookup(&document));
    Ok(PublishedEntry {
        document,
        datasets,
        panosc,
    })
}

/// Enrich every document in order, ticking `bar` per document
pub fn enrich_all<L>(
    documents: Vec<CatalogRecord>,
    lookup: &L,
    join: Option<&PanoscJoin<'_>>,
    bar: &ProgressBar,
) -> Result<Vec<PublishedEntry>, FetchError>
where
    L: DatasetLookup + ?Sized,
{
    let mut entries = Vec::with_capacity(documents.len());
    for document in documents {
        entries.push(enrich(document, lookup, join)?);
        bar.inc(1);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use serde_json::json;

    struct FakeLookup {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl FakeLookup {
        fn new() -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                fail_on: None,
            }
        }
    }

    impl DatasetLookup for FakeLookup {
        fn dataset(&self, pid: &str) -> Result<Value, FetchError> {
            self.calls.borrow_mut().push(pid.to_string());
            if self.fail_on == Some(pid) {
                return Err(FetchError::Http {
                    status: Some(404),
                    message: "not found".into(),
                });
            }
            Ok(json!({ "pid": pid }))
        }
    }

    fn record(value: Value) -> CatalogRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn fetches_datasets_in_pid_order() {
        let lookup = FakeLookup::new();
        let doc = record(json!({"doi": "10.1/x", "pidArray": ["a", "b"]}));

        let entry = enrich(doc, &lookup, None).unwrap();

        assert_eq!(*lookup.calls.borrow(), vec!["a", "b"]);
        assert_eq!(entry.datasets, vec![json!({"pid": "a"}), json!({"pid": "b"})]);
    }

    #[test]
    fn empty_or_missing_pid_array_makes_no_calls() {
        let lookup = FakeLookup::new();
        let entry = enrich(record(json!({"pidArray": []})), &lookup, None).unwrap();
        assert!(entry.datasets.is_empty());

        let entry = enrich(record(json!({"doi": "x"})), &lookup, None).unwrap();
        assert!(entry.datasets.is_empty());
        assert!(lookup.calls.borrow().is_empty());
    }

    #[test]
    fn excluded_fields_are_stripped_and_order_kept() {
        let lookup = FakeLookup::new();
        let doc = record(json!({
            "doi": "10.1/x",
            "thumbnail": "data:image/png;base64,...",
            "title": "t",
            "history": [{}],
            "pidArray": []
        }));

        let entry = enrich(doc, &lookup, None).unwrap();

        let keys: Vec<&str> = entry.document.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["doi", "title", "pidArray"]);
    }

    #[test]
    fn failed_dataset_aborts_entry() {
        let lookup = FakeLookup {
            fail_on: Some("b"),
            ..FakeLookup::new()
        };
        let doc = record(json!({"pidArray": ["a", "b", "c"]}));

        let err = enrich(doc, &lookup, None).unwrap_err();

        assert_eq!(err.status(), Some(404));
        assert_eq!(*lookup.calls.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn panosc_joined_on_configured_key() {
        let index = PanoscIndex::from_documents(vec![
            record(json!({"pid": "10.1/x", "title": "panosc"})),
            record(json!({"title": "no pid"})),
        ]);
        assert_eq!(index.len(), 1);
        let join = PanoscJoin {
            index: &index,
            key: "doi",
        };
        let lookup = FakeLookup::new();

        let hit = enrich(record(json!({"doi": "10.1/x"})), &lookup, Some(&join)).unwrap();
        assert_eq!(hit.panosc.unwrap()["title"], "panosc");

        let miss = enrich(record(json!({"doi": "10.1/y"})), &lookup, Some(&join)).unwrap();
        assert!(miss.panosc.is_none());

        let no_key = enrich(record(json!({"id": "1"})), &lookup, Some(&join)).unwrap();
        assert!(no_key.panosc.is_none());
    }

    #[test]
    fn panosc_slot_omitted_when_absent() {
        let entry = PublishedEntry {
            document: record(json!({"doi": "x"})),
            datasets: vec![],
            panosc: None,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value, json!({"document": {"doi": "x"}, "datasets": []}));
    }

    #[test]
    fn enrich_all_keeps_document_order() {
        let lookup = FakeLookup::new();
        let docs = vec![
            record(json!({"doi": "1", "pidArray": ["p1"]})),
            record(json!({"doi": "2", "pidArray": ["p2"]})),
        ];
        let entries = enrich_all(docs, &lookup, None, &ProgressBar::hidden()).unwrap();
        assert_eq!(entries[0].document["doi"], "1");
        assert_eq!(entries[1].datasets[0]["pid"], "p2");
    }
}
