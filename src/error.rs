//! Error types for page analysis.

use thiserror::Error;

/// Errors returned by the analyzer.
///
/// Unparseable colors and malformed CSS never show up here: they are dropped
/// where they are found. Only failures that leave nothing to analyze do.
#[derive(Error, Debug)]
pub enum Error {
    /// A string that should have been a color was not.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),

    /// The page URL could not be parsed or resolved.
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// HTTP request failed (connection, timeout, TLS).
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The page is not an HTML document.
    #[error("{url} does not return HTML content (content-type: {content_type})")]
    NotHtml { url: String, content_type: String },

    /// The computed-style source could not produce a snapshot.
    #[error("computed-style capture failed: {0}")]
    Capture(String),

    /// Reading or writing a local file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for analyzer operations.
pub type Result<T> = std::result::Result<T, Error>;
