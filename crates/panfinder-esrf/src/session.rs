//! Catalogue session tokens
//!
//! The ICAT+ catalogue only answers under `/catalogue/{token}/...`, and a
//! token is only handed out to the data portal's web app. The production
//! provider opens the portal in a headless browser and reads the token
//! from the first catalogue request the app makes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use panfinder_core::{CatalogRecord, endpoint, id_field};

use crate::documents::PanoscEntry;

/// Marker in the path of catalogue requests
const CATALOGUE_MARKER: &str = "catalogue";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No released document to open the portal with
    NoReleasedDocument,
    /// The portal made no catalogue request
    NoCatalogueRequest,
    /// A catalogue request was seen but had no token segment
    EmptyToken(String),
    Browser(String),
    /// Built without a browser and no token given
    Unsupported,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReleasedDocument => {
                write!(f, "no released document to open a portal session")
            }
            Self::NoCatalogueRequest => {
                write!(f, "no background requests intercepted from the data catalogue app")
            }
            Self::EmptyToken(url) => write!(f, "no session token in {url}"),
            Self::Browser(msg) => write!(f, "browser error: {msg}"),
            Self::Unsupported => write!(
                f,
                "built without browser support; pass a session token instead"
            ),
        }
    }
}

impl std::error::Error for SessionError {}

/// Source of a catalogue session token
pub trait SessionTokenProvider {
    /// Token for a session opened on one of `documents`
    fn session_token(&self, documents: &[PanoscEntry]) -> Result<String, SessionError>;
}

/// Token given up front, e.g. copied from a browser session
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl SessionTokenProvider for StaticToken {
    fn session_token(&self, _documents: &[PanoscEntry]) -> Result<String, SessionError> {
        Ok(self.0.clone())
    }
}

/// Provider for builds without a browser: always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBrowser;

impl SessionTokenProvider for NoBrowser {
    fn session_token(&self, _documents: &[PanoscEntry]) -> Result<String, SessionError> {
        Err(SessionError::Unsupported)
    }
}

/// Portal page listing the datasets of investigation `pid`
pub fn portal_url(portal_base: &str, pid: &str) -> String {
    endpoint(portal_base, &format!("investigation/{pid}/datasets"))
}

/// Token from the first observed URL whose path contains `catalogue`.
///
/// The token is the second path segment: `/catalogue/{token}/...`.
pub fn token_from_urls<'a, I>(urls: I) -> Result<String, SessionError>
where
    I: IntoIterator<Item = &'a str>,
{
    let url = urls
        .into_iter()
        .find(|u| u.contains(CATALOGUE_MARKER))
        .ok_or(SessionError::NoCatalogueRequest)?;
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.to_string(),
    };
    match path.split('/').nth(2) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(SessionError::EmptyToken(url.to_string())),
    }
}

/// Whether the document is out of embargo at `now`.
///
/// A null or absent `releaseDate` counts as released; an unparsable one
/// does not.
pub fn is_released(document: &CatalogRecord, now: DateTime<Utc>) -> bool {
    match document.get("releaseDate") {
        None | Some(Value::Null) => true,
        Some(Value::String(date)) => match DateTime::parse_from_rfc3339(date) {
            Ok(release) => release <= now,
            Err(e) => {
                log::debug!("unparsable releaseDate {date:?}: {e}");
                false
            }
        },
        Some(_) => false,
    }
}

/// First released document with a pid, used to open the portal session
pub fn select_session_document(entries: &[PanoscEntry], now: DateTime<Utc>) -> Option<String> {
    entries
        .iter()
        .filter(|e| is_released(&e.panosc, now))
        .find_map(|e| id_field(&e.panosc, "pid"))
}

#[cfg(feature = "browser")]
pub use browser::BrowserTokenProvider;

#[cfg(feature = "browser")]
mod browser {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::Utc;
    use headless_chrome::protocol::cdp::Network::GetResponseBodyReturnObject;
    use headless_chrome::protocol::cdp::Network::events::ResponseReceivedEventParams;
    use headless_chrome::{Browser, LaunchOptions};

    use super::{
        SessionError, SessionTokenProvider, portal_url, select_session_document, token_from_urls,
    };
    use crate::documents::PanoscEntry;

    /// Last dataset row's download button; attached once the app has
    /// finished its catalogue calls.
    const READY_SELECTOR: &str =
        ".table > tbody > tr:last-child > td:last-child > div:nth-child(2) > button";

    /// Opens the ESRF data portal in headless Chromium and watches its
    /// network responses for a catalogue URL.
    #[derive(Debug, Clone)]
    pub struct BrowserTokenProvider {
        portal_base: String,
        ready_timeout: Duration,
    }

    impl BrowserTokenProvider {
        pub fn new(portal_base: &str) -> Self {
            Self {
                portal_base: portal_base.to_string(),
                ready_timeout: Duration::from_secs(30),
            }
        }

        fn observe(&self, url: &str) -> anyhow::Result<Vec<String>> {
            let options = LaunchOptions::default_builder()
                .headless(true)
                .build()
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            let browser = Browser::new(options)?;
            let tab = browser.new_tab()?;

            let seen = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            tab.register_response_handling(
                "panfinder-session",
                Box::new(
                    move |event: ResponseReceivedEventParams,
                          _body: &dyn Fn() -> anyhow::Result<GetResponseBodyReturnObject>| {
                        if let Ok(mut urls) = sink.lock() {
                            urls.push(event.response.url);
                        }
                    },
                ),
            )?;

            tab.navigate_to(url)?.wait_until_navigated()?;
            // Slow and absent look the same here; either way use what was seen
            if let Err(e) =
                tab.wait_for_element_with_custom_timeout(READY_SELECTOR, self.ready_timeout)
            {
                log::debug!("portal not ready: {e}");
            }

            let urls = seen.lock().map(|urls| urls.clone()).unwrap_or_default();
            Ok(urls)
        }
    }

    impl SessionTokenProvider for BrowserTokenProvider {
        fn session_token(&self, documents: &[PanoscEntry]) -> Result<String, SessionError> {
            let pid = select_session_document(documents, Utc::now())
                .ok_or(SessionError::NoReleasedDocument)?;
            let url = portal_url(&self.portal_base, &pid);
            log::info!("Opening data portal {url}");
            let urls = self
                .observe(&url)
                .map_err(|e| SessionError::Browser(format!("{e:#}")))?;
            log::debug!("{} responses observed", urls.len());
            token_from_urls(urls.iter().map(String::as_str))
        }
    }
}
