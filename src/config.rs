//! Configuration loader and validator for the content index.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::index::IndexSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub app: App,
    #[serde(default)]
    pub database: Database,
    #[serde(default)]
    pub index: Index,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct App {
    pub data_dir: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Database {
    /// Overrides `DATABASE_URL` and the default file under `app.data_dir`.
    #[serde(default)]
    pub url: Option<String>,
}

/// Caps and deadlines applied to every aggregated view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Index {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_five")]
    pub popular_limit: u64,
    #[serde(default = "default_sidebar_popular_limit")]
    pub sidebar_popular_limit: u64,
    #[serde(default = "default_five")]
    pub recent_limit: u64,
    #[serde(default = "default_five")]
    pub editors_choice_limit: u64,
    #[serde(default = "default_five")]
    pub per_category_limit: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_page_size() -> u64 {
    10
}
fn default_five() -> u64 {
    5
}
fn default_sidebar_popular_limit() -> u64 {
    10
}
fn default_request_timeout_ms() -> u64 {
    5_000
}

impl Default for Index {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            popular_limit: default_five(),
            sidebar_popular_limit: default_sidebar_popular_limit(),
            recent_limit: default_five(),
            editors_choice_limit: default_five(),
            per_category_limit: default_five(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Config {
    /// Create `app.data_dir` if missing.
    pub fn ensure_dirs(&self) -> Result<(), std::io::Error> {
        fs::create_dir_all(&self.app.data_dir)
    }

    /// Resolve the database URL: explicit config, then `DATABASE_URL`, then a
    /// file inside `app.data_dir`.
    pub fn database_url(&self) -> String {
        if let Some(url) = self.database.url.as_ref().filter(|u| !u.trim().is_empty()) {
            return url.clone();
        }
        std::env::var("DATABASE_URL").unwrap_or_else(|_| {
            format!(
                "sqlite://{}/content-index.db",
                self.app.data_dir.trim_end_matches('/')
            )
        })
    }

    pub fn index_settings(&self) -> IndexSettings {
        IndexSettings {
            page_size: self.index.page_size,
            popular_limit: self.index.popular_limit,
            sidebar_popular_limit: self.index.sidebar_popular_limit,
            recent_limit: self.index.recent_limit,
            editors_choice_limit: self.index.editors_choice_limit,
            per_category_limit: self.index.per_category_limit,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.index.request_timeout_ms)
    }
}

/// Read and validate `path`, defaulting to `./config.yaml`.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path.unwrap_or_else(|| Path::new("config.yaml")))?;
    let cfg: Config = serde_yaml::from_str(&raw)?;
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.app.data_dir.trim().is_empty() {
        return Err(ConfigError::Invalid("app.data_dir must be non-empty"));
    }
    let idx = &cfg.index;
    let limits = [
        (idx.page_size, "index.page_size must be > 0"),
        (idx.popular_limit, "index.popular_limit must be > 0"),
        (idx.sidebar_popular_limit, "index.sidebar_popular_limit must be > 0"),
        (idx.recent_limit, "index.recent_limit must be > 0"),
        (idx.editors_choice_limit, "index.editors_choice_limit must be > 0"),
        (idx.per_category_limit, "index.per_category_limit must be > 0"),
        (idx.request_timeout_ms, "index.request_timeout_ms must be > 0"),
    ];
    if let Some((_, msg)) = limits.iter().find(|(value, _)| *value == 0) {
        return Err(ConfigError::Invalid(*msg));
    }
    Ok(())
}

/// Example YAML, also used by `content-index example-config`.
pub fn example() -> &'static str {
    r#"app:
  data_dir: "./data"

database:
  url: "sqlite://./data/content-index.db"

index:
  page_size: 10
  popular_limit: 5
  sidebar_popular_limit: 10
  recent_limit: 5
  editors_choice_limit: 5
  per_category_limit: 5
  request_timeout_ms: 5000
"#
}
