//! Error types for the session collaborator and the request pipeline.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced by a session lookup.
///
/// A `Refresh` failure also sets the session manager's error flag, which the
/// UI observes to force sign-out; the pipeline itself never signs out.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Transport failure while talking to the token endpoint.
    #[error("token refresh transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The token endpoint rejected the refresh exchange.
    #[error("token refresh rejected ({status}): {detail}")]
    Refresh {
        /// Status returned by the token endpoint.
        status: StatusCode,
        /// Response body, for diagnostics.
        detail: String,
    },
}

/// Errors surfaced by the request pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The session lookup itself failed; the request was never sent.
    #[error("session lookup failed: {0}")]
    SessionLookup(#[source] SessionError),

    /// Transport-level failure (connect, TLS, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request path did not join onto the base URL.
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a non-success status.
    ///
    /// A 401 lands here only after the pipeline's single retry budget is
    /// spent (or no token was available for a retry).
    #[error("request failed with status {status}")]
    Status {
        /// HTTP status of the failing response.
        status: StatusCode,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A request or response body failed to (de)serialize as JSON.
    #[error("json body error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Status of the failing response, when the error carries one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
