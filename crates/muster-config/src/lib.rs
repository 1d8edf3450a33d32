// crates/muster-config/src/lib.rs
// ============================================================================
// Module: Muster Configuration
// Description: Deployment configuration model, loading, and validation.
// Purpose: Resolve data, catalog, and store paths for servers and the CLI.
// Dependencies: muster-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Muster deployments are configured by one TOML document naming the data
//! directory, catalog directory, CUI marking config, store settings, and
//! server identity. Every path section has a default derived from the data
//! directory, so a minimal config is a single `data_dir` line. Validation
//! fails closed: an unusable configuration never reaches a server loop.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;

use muster_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable naming the config file path.
pub const CONFIG_ENV: &str = "MUSTER_CONFIG";

/// Default server version advertised during the MCP handshake.
const DEFAULT_SERVER_VERSION: &str = "1.0.0";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Config file is not valid TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config values are structurally invalid.
    #[error("config invalid: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Server identity advertised in the MCP handshake.
///
/// # Invariants
/// - `name` is non-empty after validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    /// Server name.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Server version label.
    #[serde(default = "default_server_version")]
    pub version: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            version: default_server_version(),
        }
    }
}

/// Returns the default server name.
fn default_server_name() -> String {
    "muster-compliance".to_string()
}

/// Returns the default server version.
fn default_server_version() -> String {
    DEFAULT_SERVER_VERSION.to_string()
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Raw deserialized configuration before path resolution.
#[derive(Debug, Clone, Deserialize, Default)]
struct RawConfig {
    /// Root directory for platform data.
    data_dir: Option<PathBuf>,
    /// Directory holding framework catalog documents.
    catalog_dir: Option<PathBuf>,
    /// CUI marking config document path.
    cui_config_path: Option<PathBuf>,
    /// SQLite store settings.
    store: Option<SqliteStoreConfig>,
    /// Server identity.
    #[serde(default)]
    server: ServerSection,
}

/// Resolved Muster configuration.
///
/// # Invariants
/// - All paths are fully resolved; defaults derive from `data_dir`.
#[derive(Debug, Clone)]
pub struct MusterConfig {
    /// Root directory for platform data.
    pub data_dir: PathBuf,
    /// Directory holding framework catalog documents.
    pub catalog_dir: PathBuf,
    /// CUI marking config document path, when configured.
    pub cui_config_path: Option<PathBuf>,
    /// SQLite store settings.
    pub store: SqliteStoreConfig,
    /// Server identity.
    pub server: ServerSection,
}

impl MusterConfig {
    /// Builds the default configuration rooted at a data directory.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            catalog_dir: data_dir.join("catalogs"),
            cui_config_path: None,
            store: SqliteStoreConfig::for_path(data_dir.join("muster.db")),
            server: ServerSection::default(),
            data_dir,
        }
    }

    /// Loads and validates a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, parsed, or
    /// validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
        let raw: RawConfig =
            toml::from_str(&text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let data_dir = raw.data_dir.unwrap_or_else(|| PathBuf::from("data"));
        let config = Self {
            catalog_dir: raw.catalog_dir.unwrap_or_else(|| data_dir.join("catalogs")),
            cui_config_path: raw.cui_config_path,
            store: raw
                .store
                .unwrap_or_else(|| SqliteStoreConfig::for_path(data_dir.join("muster.db"))),
            server: raw.server,
            data_dir,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates resolved configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a value is unusable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.name.trim().is_empty() {
            return Err(ConfigError::Invalid("server.name must not be empty".to_string()));
        }
        if self.server.version.trim().is_empty() {
            return Err(ConfigError::Invalid("server.version must not be empty".to_string()));
        }
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".to_string()));
        }
        if self.store.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the fallback output root for projects without a directory.
    #[must_use]
    pub fn fallback_output_dir(&self) -> PathBuf {
        self.data_dir.join(".tmp").join("compliance")
    }
}
