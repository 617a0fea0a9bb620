//! User verification backing the login and register forms.

use std::collections::HashMap;
use std::sync::RwLock;

/// Checks credentials submitted through the login/register pages.
///
/// `is_login` selects between verifying an existing account and creating a
/// new one. Implementations must be shareable across connection tasks.
pub trait UserVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str, is_login: bool) -> bool;
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, String>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with an account.
    pub fn with_user(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        if let Ok(mut users) = self.users.write() {
            users.insert(username.into(), password.into());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl UserVerifier for MemoryUserStore {
    fn verify(&self, username: &str, password: &str, is_login: bool) -> bool {
        if username.is_empty() || password.is_empty() {
            return false;
        }
        tracing::info!(user = username, is_login, "verifying user");

        let Ok(mut users) = self.users.write() else {
            tracing::error!("user store lock poisoned");
            return false;
        };

        if is_login {
            let ok = users.get(username).is_some_and(|p| p == password);
            if !ok {
                tracing::debug!(user = username, "password mismatch");
            }
            return ok;
        }

        if users.contains_key(username) {
            tracing::debug!(user = username, "username already taken");
            return false;
        }
        users.insert(username.to_string(), password.to_string());
        tracing::debug!(user = username, "registered");
        true
    }
}
