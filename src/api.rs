//! Auth backend client.
//!
//! Thin HTTP wrapper over the four auth endpoints. Every request passes
//! through [`HttpAuthApi::authorize`], which attaches the persisted token as a
//! bearer credential at send time. Body parsing lives in pure functions for
//! testability.
//!
//! ERROR HANDLING
//! ==============
//! Non-success statuses become `ApiError::Response` carrying the message the
//! backend put in its error payload, so callers can show it verbatim.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::SessionConfig;
use crate::error::ApiError;
use crate::storage::TokenStore;
use crate::types::{AuthGrant, Credentials, CurrentUser, Registration, User};

pub const ME_PATH: &str = "/auth/me/";
pub const LOGIN_PATH: &str = "/auth/login/";
pub const REGISTER_PATH: &str = "/auth/register/";
pub const LOGOUT_PATH: &str = "/auth/logout/";

const ME_FAILED: &str = "Session check failed";
const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";
const LOGOUT_FAILED: &str = "Logout failed";

/// Keys searched, in order, for a human-readable message in an error body.
const ERROR_MESSAGE_KEYS: [&str; 3] = ["error", "message", "detail"];

// =============================================================================
// TRAIT
// =============================================================================

/// The auth operations the session manager depends on.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `GET /auth/me/`: the user owning the current bearer token.
    async fn me(&self) -> Result<CurrentUser, ApiError>;

    /// `POST /auth/login/`.
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError>;

    /// `POST /auth/register/`.
    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError>;

    /// `POST /auth/logout/`.
    async fn logout(&self) -> Result<(), ApiError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    config: SessionConfig,
    store: Arc<dyn TokenStore>,
}

impl HttpAuthApi {
    /// Build a client for `config.api_url` that reads bearer tokens from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: SessionConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, config, store })
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Attach the persisted token, if any, as `Authorization: Bearer <token>`.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.store.load() {
            Ok(Some(token)) => request.bearer_auth(token),
            Ok(None) => request,
            Err(e) => {
                tracing::warn!(error = %e, "token slot unreadable; sending request without credentials");
                request
            }
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, fallback: &str) -> Result<String, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::Response { status: status.as_u16(), message: error_message(&text, fallback) });
        }
        Ok(text)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn me(&self) -> Result<CurrentUser, ApiError> {
        let request = self.http.get(self.config.endpoint(ME_PATH));
        let body = self.send(request, ME_FAILED).await?;
        parse_current_user(&body)
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
        let request = self
            .http
            .post(self.config.endpoint(LOGIN_PATH))
            .json(credentials);
        let body = self.send(request, LOGIN_FAILED).await?;
        parse_auth_grant(&body)
    }

    async fn register(&self, registration: &Registration) -> Result<AuthGrant, ApiError> {
        let request = self
            .http
            .post(self.config.endpoint(REGISTER_PATH))
            .json(registration);
        let body = self.send(request, REGISTER_FAILED).await?;
        parse_auth_grant(&body)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let request = self.http.post(self.config.endpoint(LOGOUT_PATH));
        self.send(request, LOGOUT_FAILED).await?;
        Ok(())
    }
}

// =============================================================================
// PARSING
// =============================================================================

#[derive(Deserialize)]
struct GrantBody {
    user: User,
    #[serde(default)]
    access_token: Option<String>,
}

/// Parse a login/register body: `{ "user": {...}, "access_token": "..." }`.
pub(crate) fn parse_auth_grant(body: &str) -> Result<AuthGrant, ApiError> {
    let parsed: GrantBody = serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    let access_token = non_empty(parsed.access_token).ok_or_else(|| ApiError::Parse("missing access_token".into()))?;
    Ok(AuthGrant { user: parsed.user, access_token })
}

/// Parse a `me` body: either `{ "user": {...}, "access_token"? }` or a bare user.
pub(crate) fn parse_current_user(body: &str) -> Result<CurrentUser, ApiError> {
    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::Parse("expected a JSON object".into()));
    }

    if value.get("user").is_some_and(Value::is_object) {
        let parsed: GrantBody = serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))?;
        return Ok(CurrentUser { user: parsed.user, access_token: non_empty(parsed.access_token) });
    }

    let user: User = serde_json::from_value(value).map_err(|e| ApiError::Parse(e.to_string()))?;
    Ok(CurrentUser { user, access_token: None })
}

/// Pull a human-readable message out of an error body, or use `fallback`.
pub(crate) fn error_message(body: &str, fallback: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback.to_owned();
    };
    ERROR_MESSAGE_KEYS
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|msg| !msg.is_empty())
        .map_or_else(|| fallback.to_owned(), ToOwned::to_owned)
}

fn non_empty(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}
