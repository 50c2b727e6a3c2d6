//! Wire DTOs for the auth backend.
//!
//! DESIGN
//! ======
//! The user record is opaque apart from `role`; every other field is kept in
//! `extra` so the session hands back exactly what the backend sent.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};

/// Role granted elevated navigation after login.
pub const ADMIN_ROLE: &str = "admin";

/// Role requested by `register` when the caller does not name one.
pub const DEFAULT_ROLE: &str = "user";

/// The authenticated user as returned by the backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Role name; missing roles deserialize as empty and are treated as non-admin.
    #[serde(default)]
    pub role: String,
    /// All remaining fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl User {
    #[must_use]
    pub fn with_role(role: &str) -> Self {
        Self { role: role.to_owned(), extra: serde_json::Map::new() }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }

    /// Look up a string field other than `role` (e.g. `"email"`, `"name"`).
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(serde_json::Value::as_str)
    }
}

/// Body of `POST /auth/login/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /auth/register/`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: String,
}

impl Registration {
    /// Build a registration request, falling back to [`DEFAULT_ROLE`].
    #[must_use]
    pub fn new(email: &str, password: &str, name: &str, role: Option<&str>) -> Self {
        let role = role
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(DEFAULT_ROLE);
        Self { email: email.to_owned(), password: password.to_owned(), name: name.to_owned(), role: role.to_owned() }
    }
}

/// Successful login/register result: the user plus a freshly issued token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub user: User,
    pub access_token: String,
}

/// Result of `GET /auth/me/`: the user and, optionally, a refreshed token.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentUser {
    pub user: User,
    pub access_token: Option<String>,
}
