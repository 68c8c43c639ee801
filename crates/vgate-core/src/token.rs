//! In-memory API token registry
//!
//! Tokens are opaque UUIDv4 strings issued per username/password pair. A pair
//! holds at most one token: issuing again replaces the previous one. Tokens
//! never expire and are not persisted.
//!
//! Validation only checks that a token is currently active. It does not tell
//! which credentials it was issued for, so any active token authorizes any
//! protected resource.

use std::collections::HashMap;

use parking_lot::Mutex;
use uuid::Uuid;

/// Username/password pair a token is issued for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Process-wide registry of active tokens
#[derive(Debug, Default)]
pub struct TokenStore {
    active: Mutex<HashMap<Credentials, String>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `credentials`, invalidating any previous one
    pub fn issue(&self, credentials: Credentials) -> String {
        let token = Uuid::new_v4().to_string();
        tracing::debug!(username = %credentials.username, "Issuing API token");
        self.active.lock().insert(credentials, token.clone());
        token
    }

    /// Token currently active for `credentials`, if any
    pub fn lookup(&self, credentials: &Credentials) -> Option<String> {
        self.active.lock().get(credentials).cloned()
    }

    /// Remove the token for `credentials`. Returns whether one existed.
    pub fn revoke(&self, credentials: &Credentials) -> bool {
        let removed = self.active.lock().remove(credentials).is_some();
        if removed {
            tracing::debug!(username = %credentials.username, "Revoked API token");
        }
        removed
    }

    /// Whether `token` is any currently active token
    pub fn is_valid(&self, token: &str) -> bool {
        self.active.lock().values().any(|active| active == token)
    }

    /// Number of active tokens
    pub fn len(&self) -> usize {
        self.active.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.lock().is_empty()
    }
}
