//! Registry configuration types
//!
//! This module provides the configuration surface for choosing and
//! connecting a persistence backend (memory, file, postgres).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Registry backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RegistryBackend {
    /// Nothing is persisted; state lives in the process
    #[default]
    Memory,
    /// One snapshot file on disk
    File,
    /// Versioned snapshot rows in PostgreSQL
    Postgres,
}

impl std::fmt::Display for RegistryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryBackend::Memory => write!(f, "memory"),
            RegistryBackend::File => write!(f, "file"),
            RegistryBackend::Postgres => write!(f, "postgres"),
        }
    }
}

fn default_cache_ttl_seconds() -> u64 {
    600
}

/// Registry configuration
///
/// # Examples
///
/// ```rust
/// use sluice_registry::RegistryConfig;
///
/// // Snapshot file on disk
/// let config = RegistryConfig::file("data/registry.json");
///
/// // PostgreSQL table
/// let config = RegistryConfig::postgres("localhost", "feast")
///     .with_credentials("feast", "secret");
///
/// // In-memory (for testing)
/// let config = RegistryConfig::memory();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Persistence backend
    #[serde(default)]
    pub backend: RegistryBackend,

    /// Snapshot file path (file backend) or table name (postgres backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Database host (postgres backend)
    #[serde(default, alias = "endpoint", skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Seconds before the resident catalog is considered stale; 0 never expires
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,

    /// Degrade to an empty catalog instead of failing when the backend is unreachable
    #[serde(default)]
    pub fail_open: bool,

    /// Reject feature view names already used by another feature view kind
    #[serde(default)]
    pub unique_feature_view_names: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            backend: RegistryBackend::Memory,
            path: None,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            cache_ttl_seconds: default_cache_ttl_seconds(),
            fail_open: false,
            unique_feature_view_names: false,
        }
    }
}

impl RegistryConfig {
    /// In-memory registry configuration
    pub fn memory() -> Self {
        Self::default()
    }

    /// File-backed registry configuration
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            backend: RegistryBackend::File,
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// PostgreSQL-backed registry configuration
    pub fn postgres(host: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            backend: RegistryBackend::Postgres,
            host: Some(host.into()),
            database: Some(database.into()),
            ..Self::default()
        }
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_seconds = ttl.as_secs();
        self
    }

    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    pub fn with_unique_feature_view_names(mut self, unique: bool) -> Self {
        self.unique_feature_view_names = unique;
        self
    }

    /// Cache TTL, `None` when the catalog never goes stale
    pub fn cache_ttl(&self) -> Option<Duration> {
        match self.cache_ttl_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml_str(&yaml)
    }

    /// PostgreSQL connection options built from the connection fields
    ///
    /// Credentials are passed as options rather than spliced into a URL, so
    /// they may contain any character.
    #[cfg(feature = "postgres")]
    pub fn connect_options(&self) -> Result<sqlx::postgres::PgConnectOptions, ConfigError> {
        let host = self.require(&self.host, "host")?;
        let database = self.require(&self.database, "database")?;

        let mut options = sqlx::postgres::PgConnectOptions::new()
            .host(host)
            .port(self.port.unwrap_or(5432))
            .database(database);
        if let Some(user) = &self.user {
            options = options.username(user);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        Ok(options)
    }

    /// Validate the configuration
    ///
    /// Returns an error if a field required by the selected backend is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.backend {
            RegistryBackend::File => {
                self.require(&self.path, "path")?;
            }
            RegistryBackend::Postgres => {
                self.require(&self.host, "host")?;
                self.require(&self.database, "database")?;
            }
            RegistryBackend::Memory => {
                // Memory backend doesn't require any fields
            }
        }
        Ok(())
    }

    fn require<'a>(&self, value: &'a Option<String>, field: &str) -> Result<&'a str, ConfigError> {
        match value.as_deref() {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ConfigError::MissingField {
                backend: self.backend.to_string(),
                field: field.to_string(),
            }),
        }
    }
}

/// Configuration error
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A required field is missing for the selected backend
    MissingField { backend: String, field: String },
    /// Configuration text is not valid YAML for this struct
    Parse(String),
    /// Configuration file could not be read
    Io(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingField { backend, field } => {
                write!(f, "{} backend requires {} to be set", backend, field)
            }
            ConfigError::Parse(msg) => write!(f, "Invalid registry configuration: {}", msg),
            ConfigError::Io(msg) => write!(f, "Failed to read registry configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
