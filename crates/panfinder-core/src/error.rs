//! Error type for catalog requests

/// Error from a single catalog request.
///
/// Transport and status failures carry the HTTP status when one was received.
/// The request URL is never part of the message: ESRF catalogue URLs embed
/// the portal session token.
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure or non-success status
    Http {
        status: Option<u16>,
        message: String,
    },
    /// Response body was not the expected JSON shape
    Decode { what: String, message: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http {
                status: Some(s),
                message,
            } => write!(f, "HTTP {s}: {message}"),
            Self::Http {
                status: None,
                message,
            } => write!(f, "HTTP error: {message}"),
            Self::Decode { what, message } => write!(f, "invalid {what}: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Create HTTP error from reqwest error, dropping the request URL
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        Self::Http {
            status: e.status().map(|s| s.as_u16()),
            message: e.without_url().to_string(),
        }
    }

    pub fn decode(what: impl Into<String>, e: impl std::fmt::Display) -> Self {
        Self::Decode {
            what: what.into(),
            message: e.to_string(),
        }
    }

    /// HTTP status of the failed response, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => *status,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http_err(status: u16) -> FetchError {
        FetchError::Http {
            status: Some(status),
            message: "test".to_string(),
        }
    }

    #[test]
    fn display_http_with_status() {
        assert_eq!(format!("{}", http_err(404)), "HTTP 404: test");
    }

    #[test]
    fn display_http_without_status() {
        let err = FetchError::Http {
            status: None,
            message: "connection refused".to_string(),
        };
        assert_eq!(format!("{err}"), "HTTP error: connection refused");
    }

    #[test]
    fn display_decode() {
        let err = FetchError::decode("count response", "missing field `count`");
        assert_eq!(
            format!("{err}"),
            "invalid count response: missing field `count`"
        );
    }

    #[test]
    fn status_only_for_http() {
        assert_eq!(http_err(500).status(), Some(500));
        assert_eq!(FetchError::decode("page", "eof").status(), None);
    }
}
