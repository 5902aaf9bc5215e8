use thiserror::Error;

/// Transport-level failures talking to the marketplace.
///
/// Every variant is recoverable by skipping the affected sub-search or
/// candidate; none of them carries partial results.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("search query must not be empty")]
    EmptyQuery,
}

impl ScraperError {
    /// Classifies a `reqwest` failure, separating timeouts from other
    /// transport errors.
    pub(crate) fn from_request(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                url: url.to_owned(),
            }
        } else {
            Self::Http(err)
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
