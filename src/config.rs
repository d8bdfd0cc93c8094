//! Connection configuration.
//!
//! Settings are read from a TOML file and may be overridden from the command
//! line. A minimal file names only the database:
//!
//! ```toml
//! url = "postgres://ra@localhost/coursedb"
//! ```
//!
//! Recognized keys:
//! - `url`: `postgres://...`, `postgresql://...`, `sqlite:<path>` or
//!   `sqlite::memory:`.
//! - `schema`: PostgreSQL schema whose relations `\list` reports.
//! - `user`, `password`: override the credentials embedded in `url`.
//! - `dialect`: force SQL generation for another engine
//!   (`postgresql`, `sqlite`, `mysql`, `db2`).

use std::path::Path;

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::error::RaError;

/// Schema listed by `\list` on PostgreSQL when none is configured.
pub const DEFAULT_PG_SCHEMA: &str = "public";

/// Environment variable consulted for the database URL.
pub const URL_ENV_VAR: &str = "RA_URL";

/// URL prefix selecting the SQLite backend.
const SQLITE_PREFIX: &str = "sqlite:";

/// Which backend a URL selects, with the backend-specific locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// Full `postgres://` connection URL.
    Postgres(String),
    /// File path, or `:memory:`.
    Sqlite(String),
}

/// Session configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub url: Option<String>,
    pub schema: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub dialect: Option<Dialect>,
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, RaError> {
        toml::from_str(text).map_err(|e| RaError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, RaError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            RaError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Replace the URL when an override is given.
    pub fn with_url(mut self, url: Option<String>) -> Self {
        if url.is_some() {
            self.url = url;
        }
        self
    }

    /// Replace the dialect when an override is given.
    pub fn with_dialect(mut self, dialect: Option<Dialect>) -> Self {
        if dialect.is_some() {
            self.dialect = dialect;
        }
        self
    }

    pub fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_PG_SCHEMA)
    }

    /// Resolve the backend named by `url`.
    pub fn backend(&self) -> Result<Backend, RaError> {
        let url = self.url.as_deref().ok_or_else(|| {
            RaError::Config(format!(
                "no database url: set `url` in the config file, pass --url, or set {URL_ENV_VAR}"
            ))
        })?;

        if let Some(rest) = url.strip_prefix(SQLITE_PREFIX) {
            let path = rest.strip_prefix("//").unwrap_or(rest);
            if path.is_empty() {
                return Err(RaError::Config("sqlite url has no path".into()));
            }
            return Ok(Backend::Sqlite(path.to_string()));
        }
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(Backend::Postgres(url.to_string()));
        }
        Err(RaError::Config(format!("unsupported database url: {url}")))
    }
}
