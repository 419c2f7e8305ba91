//! HTTP listing pagination against a local mock catalog

use std::num::NonZeroUsize;

use mockito::Matcher;
use panfinder_core::{
    CountCheck, FilterParam, HttpListing, ListingSource, ProgressContext, StageTracker,
    collect_all,
};
use serde_json::json;

fn page(range: std::ops::Range<usize>) -> String {
    let docs: Vec<_> = range.map(|i| json!({"doi": format!("10.1/{i}")})).collect();
    serde_json::to_string(&docs).unwrap()
}

#[test]
fn limits_param_pages_until_short_page() {
    let mut server = mockito::Server::new();
    let count = server
        .mock("GET", "/api/v3/publisheddata/count")
        .with_body(r#"{"count":5}"#)
        .expect(1)
        .create();
    let pages: Vec<_> = [(0, 0..2), (2, 2..4), (4, 4..5)]
        .into_iter()
        .map(|(skip, range)| {
            server
                .mock("GET", "/api/v3/publisheddata")
                .match_query(Matcher::UrlEncoded(
                    "limits".into(),
                    format!("{{\"skip\":{skip},\"limit\":2}}"),
                ))
                .with_body(page(range))
                .expect(1)
                .create()
        })
        .collect();

    let listing = HttpListing::new(
        "test",
        &format!("{}/api/v3", server.url()),
        "publisheddata",
        FilterParam::Limits,
    );
    let progress = ProgressContext::hidden();
    let mut stages = StageTracker::new("test", &progress);
    let records = collect_all(
        &listing,
        NonZeroUsize::new(2).unwrap(),
        CountCheck::Strict,
        &mut stages,
    )
    .unwrap();

    assert_eq!(records.len(), 5);
    assert_eq!(records[4]["doi"], "10.1/4");
    count.assert();
    for mock in pages {
        mock.assert();
    }
}

#[test]
fn filter_param_is_used_for_panosc_documents() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/documents")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            r#"{"skip":0,"limit":1000}"#.into(),
        ))
        .with_body("[]")
        .expect(1)
        .create();

    let listing = HttpListing::new("panosc", &server.url(), "documents", FilterParam::Filter);
    let records = listing
        .page(panfinder_core::Cursor::start(NonZeroUsize::new(1000).unwrap()))
        .unwrap();
    assert!(records.is_empty());
    mock.assert();
}

#[test]
fn count_failure_is_fatal_before_paging() {
    let mut server = mockito::Server::new();
    let _count = server
        .mock("GET", "/documents/count")
        .with_status(500)
        .create();
    let listing_mock = server
        .mock("GET", "/documents")
        .match_query(Matcher::Any)
        .expect(0)
        .create();

    let listing = HttpListing::new("panosc", &server.url(), "documents", FilterParam::Filter);
    let progress = ProgressContext::hidden();
    let mut stages = StageTracker::new("panosc", &progress);
    let err = collect_all(
        &listing,
        NonZeroUsize::new(10).unwrap(),
        CountCheck::Warn,
        &mut stages,
    )
    .unwrap_err();

    assert!(format!("{err:#}").contains("count request failed"));
    listing_mock.assert();
}
