//! Navigation targets emitted by the session manager.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session only decides *where* to go; the host (router, CLI, test)
//! decides what going there means by implementing [`Navigator`].

#[cfg(test)]
#[path = "navigate_test.rs"]
mod navigate_test;

use std::sync::Mutex;

use crate::types::User;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Dashboard,
    AdminDashboard,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Dashboard => "/dashboard",
            Self::AdminDashboard => "/admin",
        }
    }

    /// Landing route after a successful login or registration.
    #[must_use]
    pub fn for_user(user: &User) -> Self {
        if user.is_admin() { Self::AdminDashboard } else { Self::Dashboard }
    }
}

impl serde::Serialize for Route {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Receives route changes requested by the session.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Navigator that only remembers where it was sent.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every route navigated to, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Route> {
        self.visited
            .lock()
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.history().last().copied()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        if let Ok(mut visited) = self.visited.lock() {
            visited.push(route);
        }
    }
}
