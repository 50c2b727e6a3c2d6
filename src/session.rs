//! Session manager: the current user, their bearer token, and the loading flag.
//!
//! SYSTEM CONTEXT
//! ==============
//! Constructed once at application start and injected wherever identity is
//! needed. Route guards and user-aware components read the state through
//! [`SessionManager::subscribe`] and react to changes.
//!
//! INVARIANTS
//! ==========
//! `user` and `token` are set together and cleared together. Every path that
//! clears them also empties the durable token slot.
//!
//! ERROR HANDLING
//! ==============
//! `login`/`register` never fail: backend and transport errors become
//! [`AuthOutcome::Failure`]. `initialize`/`logout` log and absorb errors after
//! clearing local state.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::api::AuthApi;
use crate::error::ApiError;
use crate::navigate::{Navigator, Route};
use crate::storage::TokenStore;
use crate::types::{AuthGrant, Credentials, Registration, User};

/// Snapshot of the authentication state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    /// `true` until `initialize` has finished restoring the session.
    pub loading: bool,
}

impl Session {
    /// State before the persisted token has been checked.
    #[must_use]
    pub fn starting() -> Self {
        Self { user: None, token: None, loading: true }
    }

    fn signed_out() -> Self {
        Self { user: None, token: None, loading: false }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

/// Redirect to login once loading has finished and nobody is signed in.
#[must_use]
pub fn should_redirect_unauth(session: &Session) -> bool {
    !session.loading && session.user.is_none()
}

/// Result of `login`/`register`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuthOutcome {
    Success { user: User, route: Route },
    Failure { error: String },
}

impl AuthOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error } => Some(error),
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match self {
            Self::Success { user, .. } => Some(user),
            Self::Failure { .. } => None,
        }
    }
}

// =============================================================================
// MANAGER
// =============================================================================

pub struct SessionManager<A, N> {
    api: A,
    store: Arc<dyn TokenStore>,
    navigator: N,
    state: watch::Sender<Session>,
}

impl<A: AuthApi, N: Navigator> SessionManager<A, N> {
    /// Create a manager in the [`Session::starting`] state.
    ///
    /// `store` must be the same slot `api` reads its bearer token from.
    pub fn new(api: A, store: Arc<dyn TokenStore>, navigator: N) -> Self {
        let (state, _) = watch::channel(Session::starting());
        Self { api, store, navigator, state }
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Current state, cloned.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every subsequent state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state
            .borrow()
            .user
            .as_ref()
            .is_some_and(User::is_admin)
    }

    /// Restore the session from the persisted token, if any.
    pub async fn initialize(&self) {
        self.state.send_modify(|s| s.loading = true);

        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "persisted token unreadable; starting signed out");
                self.clear_local();
                return;
            }
        };

        let Some(token) = token else {
            tracing::debug!("no persisted token");
            self.state.send_replace(Session::signed_out());
            return;
        };

        match self.api.me().await {
            Ok(current) => {
                let token = match current.access_token {
                    Some(fresh) => {
                        self.persist(&fresh);
                        fresh
                    }
                    None => token,
                };
                tracing::info!(role = %current.user.role, "session restored");
                self.state.send_replace(Session { user: Some(current.user), token: Some(token), loading: false });
            }
            Err(e) => {
                tracing::warn!(error = %e, "session restore failed; clearing credentials");
                self.clear_local();
            }
        }
    }

    /// Sign in with email and password, navigating by role on success.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let credentials = Credentials { email: email.to_owned(), password: password.to_owned() };
        let result = self.api.login(&credentials).await;
        self.complete("login", result)
    }

    /// Create an account and sign in. `role` defaults to the non-privileged role.
    pub async fn register(&self, email: &str, password: &str, name: &str, role: Option<&str>) -> AuthOutcome {
        let registration = Registration::new(email, password, name, role);
        let result = self.api.register(&registration).await;
        self.complete("register", result)
    }

    /// Sign out. The backend call is best-effort; local state is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "backend logout failed; clearing local session anyway");
        }
        self.clear_local();
        tracing::info!("signed out");
        self.navigator.navigate(Route::Home);
    }

    /// Send the user to login if loading is done and nobody is signed in.
    ///
    /// Returns `true` when a redirect was issued.
    pub fn guard(&self) -> bool {
        let redirect = should_redirect_unauth(&self.state.borrow());
        if redirect {
            self.navigator.navigate(Route::Login);
        }
        redirect
    }

    fn complete(&self, op: &'static str, result: Result<AuthGrant, ApiError>) -> AuthOutcome {
        match result {
            Ok(AuthGrant { user, access_token }) => {
                self.persist(&access_token);
                let route = Route::for_user(&user);
                tracing::info!(op, role = %user.role, %route, "authenticated");
                self.state.send_replace(Session { user: Some(user.clone()), token: Some(access_token), loading: false });
                self.navigator.navigate(route);
                AuthOutcome::Success { user, route }
            }
            Err(e) => {
                tracing::warn!(op, error = %e, "authentication failed");
                self.clear_local();
                AuthOutcome::Failure { error: e.user_message() }
            }
        }
    }

    fn persist(&self, token: &str) {
        if let Err(e) = self.store.save(token) {
            tracing::warn!(error = %e, "failed to persist token; session will not survive restart");
        }
    }

    fn clear_local(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted token");
        }
        self.state.send_replace(Session::signed_out());
    }
}
