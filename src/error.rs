//! Error types for the documentcloud client.
//!
//! Two classes of failure flow through this crate:
//!
//! * [`Error::Transport`] — a remote call came back with a non-success
//!   status after the retry policy was exhausted. Carries the status code
//!   and the response body so callers can inspect what the API said.
//! * Everything else — local failures (unknown asset accessor, oversize
//!   file, I/O, bad URL) that never reach the network.
//!
//! Batch-level failures in the directory upload pipeline are only fatal in
//! fail-fast mode; in resilient mode they are logged and swallowed (see
//! [`crate::upload`]).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the documentcloud client.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote call returned a non-success HTTP status after retries.
    #[error("API request failed (HTTP {status}): {body}")]
    Transport { status: u16, body: String },

    /// An asset accessor name did not resolve to any known asset.
    #[error("unknown asset attribute '{0}'")]
    UnknownAsset(String),

    /// Single-file upload exceeding the service's size cap. Checked before
    /// any network call. The directory pipeline has no such cap.
    #[error(
        "'{path}' is {size} bytes, over the DocumentCloud API's 500MB file \
         size limit. Split it into smaller pieces and try again."
    )]
    FileTooLarge { path: PathBuf, size: u64 },

    /// A URL could not be parsed.
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// The bulk create response did not line up with the request
    /// (missing `id` or `presigned_url` for an item).
    #[error("malformed API response: {0}")]
    BadResponse(String),

    /// Configuration file could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether a transport failure is worth retrying: rate limits and
    /// server errors are transient, other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport { status, .. } => *status == 429 || *status >= 500,
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}
