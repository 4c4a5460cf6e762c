//! Upstream client error types.

use thiserror::Error;

/// Errors from talking to the upstream Books API.
///
/// Everything here surfaces as a gateway failure to API callers; the
/// variants exist so logs and error codes can tell transport trouble
/// apart from upstream rejections.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection, TLS, or timeout failure before a response arrived.
    #[error("Upstream transport error: {0}")]
    Transport(String),

    /// OAuth token exchange failed.
    #[error("Upstream auth error: {0}")]
    Auth(String),

    /// The upstream answered with a non-zero application code.
    #[error("Upstream API error (code {code}): {message}")]
    Api {
        /// Upstream application code.
        code: i64,
        /// Upstream message, carried verbatim.
        message: String,
    },

    /// The response body could not be decoded as the expected JSON.
    #[error("Upstream decode error: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        502
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "UPSTREAM_TRANSPORT",
            Self::Auth(_) => "UPSTREAM_AUTH",
            Self::Api { .. } => "UPSTREAM_API",
            Self::Decode(_) => "UPSTREAM_DECODE",
        }
    }
}
