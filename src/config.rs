use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

/// Env var naming a YAML config file. When set, the other variables are ignored.
pub const CONFIG_ENV: &str = "TINYWEB_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: String,
    pub doc_root: PathBuf,
    pub idle_timeout_secs: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            doc_root: PathBuf::from("./resources"),
            idle_timeout_secs: 60,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads the YAML file named by `TINYWEB_CONFIG`, or falls back to the
    /// `LISTEN`, `DOC_ROOT`, `IDLE_TIMEOUT` and `LOG_LEVEL` variables.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) => Ok(Self::from_lookup(|key| std::env::var(key).ok())),
        }
    }

    /// Builds a config from an env-style lookup, using defaults for missing
    /// or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            listen_addr: lookup("LISTEN").unwrap_or(defaults.listen_addr),
            doc_root: lookup("DOC_ROOT").map(PathBuf::from).unwrap_or(defaults.doc_root),
            idle_timeout_secs: lookup("IDLE_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.idle_timeout_secs),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// The configured log level, `INFO` if it does not parse.
    pub fn level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}
