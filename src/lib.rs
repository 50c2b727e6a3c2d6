//! Client-side auth session: current user, persisted bearer token, and
//! role-based navigation on top of a remote auth backend.
//!
//! ARCHITECTURE
//! ============
//! - `config`: base URL, token path, and HTTP timeouts from the environment.
//! - `storage`: the durable token slot.
//! - `api`: backend client; injects the stored token on every request.
//! - `navigate`: route targets and the host-provided navigator.
//! - `session`: the manager tying the above together.

pub mod api;
pub mod config;
pub mod error;
pub mod navigate;
pub mod session;
pub mod storage;
pub mod types;

use std::sync::Arc;

pub use api::{AuthApi, HttpAuthApi};
pub use config::SessionConfig;
pub use error::{ApiError, ConfigError, StorageError};
pub use navigate::{Navigator, RecordingNavigator, Route};
pub use session::{AuthOutcome, Session, SessionManager};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use types::User;

/// Build a session manager backed by HTTP and a file token slot at
/// `config.token_path`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn connect<N: Navigator>(config: SessionConfig, navigator: N) -> Result<SessionManager<HttpAuthApi, N>, ApiError> {
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_path.clone()));
    let api = HttpAuthApi::new(config, store.clone())?;
    Ok(SessionManager::new(api, store, navigator))
}
