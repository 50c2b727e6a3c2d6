//! Error types for configuration, token storage, and backend calls.
//!
//! ERROR HANDLING
//! ==============
//! These errors never reach callers of `login`/`register`: the session manager
//! folds them into `AuthOutcome::Failure`. `initialize`/`logout` log and
//! absorb them. They surface directly only from lower-level APIs
//! (`AuthApi`, `TokenStore`, `SessionConfig`).

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

/// Errors produced while reading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `API_URL` was set but empty.
    #[error("API_URL is empty")]
    EmptyBaseUrl,

    /// `API_URL` does not start with `http://` or `https://`.
    #[error("invalid API_URL: {0}")]
    InvalidBaseUrl(String),
}

/// Errors produced by the durable token slot.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading, writing, or removing the token file failed.
    #[error("token storage io failed: {0}")]
    Io(#[from] std::io::Error),

    /// The token file exists but does not contain a valid document.
    #[error("token storage corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors produced by backend auth calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {message}")]
    Response { status: u16, message: String },

    /// The backend answered with a success status but an unexpected body.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Human-readable message suitable for showing to an end user.
    ///
    /// Backend rejections yield the message the backend supplied; every other
    /// variant yields its display text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Response { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
