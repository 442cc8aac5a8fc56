//! Configuration file model, discovery and connection-string assembly
//!
//! Values are resolved per field in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 are handled by the tool's argument parser; this module owns
//! tiers 3 and 4.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "PVID_DA_CONFIG";

/// Config file name looked up in the platform config directories
pub const CONFIG_FILE_NAME: &str = "pvid-da.toml";

/// Connection parameters for one data store
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionInfo {
    /// Defaults for the columnar snapshot store
    pub fn analytical_default() -> Self {
        Self {
            host: "152.9.10.34".to_string(),
            port: 5433,
            user: "dbadmin".to_string(),
            password: "passwd".to_string(),
            database: "viid".to_string(),
        }
    }

    /// Defaults for the relational task/device store
    pub fn metadata_default() -> Self {
        Self {
            host: "152.9.11.99".to_string(),
            port: 31583,
            user: "pgsql".to_string(),
            password: "pgsql".to_string(),
            database: "pvid".to_string(),
        }
    }

    /// Connection URL including the password. Do not log this.
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode=disable",
            self.user, self.password, self.host, self.port, self.database
        )
    }

    /// Connection URL with the password masked, safe for logs
    pub fn redacted_url(&self) -> String {
        format!(
            "postgres://{}:***@{}:{}/{}?sslmode=disable",
            self.user, self.host, self.port, self.database
        )
    }
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted_url())
    }
}

/// Partial connection section as written in TOML; missing keys fall back
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl ConnectionSection {
    /// Overlay this section onto `base`
    pub fn apply_to(&self, base: ConnectionInfo) -> ConnectionInfo {
        ConnectionInfo {
            host: self.host.clone().unwrap_or(base.host),
            port: self.port.unwrap_or(base.port),
            user: self.user.clone().unwrap_or(base.user),
            password: self.password.clone().unwrap_or(base.password),
            database: self.database.clone().unwrap_or(base.database),
        }
    }
}

/// `[analysis]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// Target date, `YYYY-MM-DD`
    pub date: Option<String>,
    pub dataset_root: Option<PathBuf>,
    pub input_dir: Option<PathBuf>,
    pub query_timeout_secs: Option<u64>,
    pub min_person_height: Option<i32>,
    pub min_person_width: Option<i32>,
    pub check_device_archive: Option<bool>,
    /// Report format, `text` or `json`
    pub format: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Whole TOML config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub analytical: ConnectionSection,
    #[serde(default)]
    pub metadata: ConnectionSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Analytical store connection with compiled defaults filled in
    pub fn analytical_connection(&self) -> ConnectionInfo {
        self.analytical.apply_to(ConnectionInfo::analytical_default())
    }

    /// Metadata store connection with compiled defaults filled in
    pub fn metadata_connection(&self) -> ConnectionInfo {
        self.metadata.apply_to(ConnectionInfo::metadata_default())
    }
}

/// Candidate config file paths in lookup order
pub fn default_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("pvid").join(CONFIG_FILE_NAME));
    }
    paths.push(PathBuf::from("/etc/pvid").join(CONFIG_FILE_NAME));
    paths
}

/// Load the TOML config.
///
/// An explicit path (argument or `PVID_DA_CONFIG`) must exist and parse.
/// Without one, the first existing default location is used; if none exists
/// the compiled defaults apply and startup continues.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from));

    if let Some(path) = explicit {
        let config = TomlConfig::load(&path)?;
        info!("Loaded config file: {}", path.display());
        return Ok(config);
    }

    load_first_existing(&default_config_paths())
}

/// Load the first of `candidates` that exists, or the defaults if none does
pub fn load_first_existing(candidates: &[PathBuf]) -> Result<TomlConfig> {
    for path in candidates {
        if path.exists() {
            let config = TomlConfig::load(path)?;
            info!("Loaded config file: {}", path.display());
            return Ok(config);
        }
    }

    warn!("No config file found, using defaults");
    Ok(TomlConfig::default())
}
