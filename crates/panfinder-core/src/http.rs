//! Blocking HTTP access to catalog APIs.
//!
//! Uses async reqwest on a shared tokio runtime but presents a sync
//! interface: collectors are strictly sequential, one request at a time.

use std::sync::{LazyLock, OnceLock};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::FetchError;

/// Client settings, fixed once at startup
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub connect_timeout: Duration,
    /// Whole-request timeout (connect + body)
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
            user_agent: concat!("panfinder/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

static HTTP_CONFIG: OnceLock<HttpConfig> = OnceLock::new();

/// Install the client settings. Must run before the first request;
/// later calls are ignored.
pub fn set_http_config(config: HttpConfig) {
    if HTTP_CONFIG.set(config).is_err() {
        log::warn!("HTTP config already initialised, ignoring override");
    }
}

/// Current client settings (defaults if never set)
pub fn http_config() -> &'static HttpConfig {
    HTTP_CONFIG.get_or_init(HttpConfig::default)
}

/// Shared async HTTP client with connection pooling.
static SHARED_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    let config = http_config();
    reqwest::Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .build()
        .expect("failed to build HTTP client")
});

/// Shared tokio runtime for HTTP operations.
pub static SHARED_RUNTIME: LazyLock<tokio::runtime::Runtime> = LazyLock::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to build tokio runtime")
});

/// GET `url` with query parameters and return the body as text.
///
/// Any non-2xx status is an error.
pub fn get_text<Q>(url: &str, query: &Q) -> Result<String, FetchError>
where
    Q: Serialize + ?Sized,
{
    log::debug!("GET {}", redact(url));
    SHARED_RUNTIME.handle().block_on(async {
        let response = SHARED_CLIENT
            .get(url)
            .query(query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(FetchError::from_reqwest)?;
        response.text().await.map_err(FetchError::from_reqwest)
    })
}

/// GET `url` and decode the JSON body into `T`.
///
/// `what` names the expected payload in decode errors.
pub fn get_json<T, Q>(url: &str, query: &Q, what: &str) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    Q: Serialize + ?Sized,
{
    let body = get_text(url, query)?;
    serde_json::from_str(&body).map_err(|e| FetchError::decode(what, e))
}

/// Join a path segment onto a base URL with exactly one slash between them
pub fn endpoint(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

/// Encode an identifier as a single URL path segment.
///
/// Form encoding: `/` becomes `%2F` and space becomes `+`, so DOI-style
/// pids stay one segment.
pub fn path_segment(id: &str) -> String {
    url::form_urlencoded::byte_serialize(id.as_bytes()).collect()
}

/// Hide session-scoped path segments in debug logs
fn redact(url: &str) -> String {
    match url.find("/catalogue/") {
        Some(pos) => {
            let head = &url[..pos + "/catalogue/".len()];
            let rest = &url[pos + "/catalogue/".len()..];
            match rest.find('/') {
                Some(slash) => format!("{head}***{}", &rest[slash..]),
                None => format!("{head}***"),
            }
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_single_slash() {
        assert_eq!(
            endpoint("https://public-data.desy.de/api/v3", "publisheddata"),
            "https://public-data.desy.de/api/v3/publisheddata"
        );
        assert_eq!(
            endpoint("https://example.com/api/", "/datasets"),
            "https://example.com/api/datasets"
        );
    }

    #[test]
    fn path_segment_encodes_slash() {
        assert_eq!(path_segment("10.22003/XFEL.EU-DATA-001"), "10.22003%2FXFEL.EU-DATA-001");
        assert_eq!(path_segment("a b"), "a+b");
        assert_eq!(path_segment("plain-id_1"), "plain-id_1");
    }

    #[test]
    fn redact_hides_session_token() {
        assert_eq!(
            redact("https://icatplus.esrf.fr/catalogue/abc-123/investigation"),
            "https://icatplus.esrf.fr/catalogue/***/investigation"
        );
        assert_eq!(
            redact("https://icatplus.esrf.fr/catalogue/abc-123"),
            "https://icatplus.esrf.fr/catalogue/***"
        );
        assert_eq!(redact("https://example.com/api"), "https://example.com/api");
    }

    #[test]
    fn default_http_config() {
        let config = HttpConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("panfinder/"));
    }

    #[test]
    fn get_json_decodes_body() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/count")
            .with_status(200)
            .with_body(r#"{"count": 7}"#)
            .create();

        let body: serde_json::Value =
            get_json(&endpoint(&server.url(), "count"), &[] as &[(&str, &str)], "count").unwrap();
        assert_eq!(body["count"], 7);
        mock.assert();
    }

    #[test]
    fn get_text_non_success_status_is_error() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/missing").with_status(404).create();

        let err = get_text(&endpoint(&server.url(), "missing"), &[] as &[(&str, &str)]).unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn get_json_invalid_body_is_decode_error() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/broken")
            .with_status(200)
            .with_body("<html>")
            .create();

        let err = get_json::<serde_json::Value, _>(
            &endpoint(&server.url(), "broken"),
            &[] as &[(&str, &str)],
            "listing page",
        )
        .unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }
}
