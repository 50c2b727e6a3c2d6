//! Session configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api";
pub const DEFAULT_TOKEN_PATH: &str = ".authsession/token.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Backend base URL without a trailing slash, e.g. `https://example.com/api`.
    pub api_url: String,
    /// File backing the durable token slot.
    pub token_path: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl SessionConfig {
    /// Build typed session config from environment variables.
    ///
    /// Optional:
    /// - `API_URL`: backend base URL (default `http://127.0.0.1:8000/api`)
    /// - `SESSION_TOKEN_PATH`: default `.authsession/token.json`
    /// - `API_REQUEST_TIMEOUT_SECS`: default 30
    /// - `API_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// Zero or unparseable timeouts use the default.
    ///
    /// # Errors
    ///
    /// Returns an error if `API_URL` is empty or lacks an http(s) scheme.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`SessionConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = normalize_api_url(&lookup("API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()))?;
        let token_path = lookup("SESSION_TOKEN_PATH")
            .filter(|raw| !raw.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH), PathBuf::from);
        let timeouts = HttpTimeouts {
            request_secs: parse_secs(lookup("API_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_secs(lookup("API_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_url, token_path, timeouts })
    }

    /// Config pointing at `api_url` with default storage path and timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if `api_url` is empty or lacks an http(s) scheme.
    pub fn with_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            timeouts: HttpTimeouts::default(),
        })
    }

    /// Join an endpoint path such as `/auth/me/` onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

pub(crate) fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyBaseUrl);
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(trimmed.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Parse a positive number of seconds. Zero would make every request time
/// out immediately, so it falls back to `default` like any unparseable value.
fn parse_secs(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
