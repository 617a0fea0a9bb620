//! Accept loop and the state shared by every connection.

pub mod listener;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::UserVerifier;
use crate::config::Config;

/// Service handles and settings handed to each connection task.
pub struct ServerContext {
    /// Directory files are served from
    pub doc_root: PathBuf,
    /// Backs the login and register forms
    pub users: Arc<dyn UserVerifier>,
    /// How long a connection may sit idle before it is closed
    pub idle_timeout: Duration,
}

impl ServerContext {
    pub fn new(cfg: &Config, users: Arc<dyn UserVerifier>) -> Self {
        Self {
            doc_root: cfg.doc_root.clone(),
            users,
            idle_timeout: cfg.idle_timeout(),
        }
    }
}
