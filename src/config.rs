//! Configuration management for devops-queries.
//!
//! Settings are read from several key-value sources and merged:
//! - TOML configuration file following the XDG Base Directory specification
//! - Environment variables (`DEVOPS_QUERIES_*`)
//! - Command line flags
//!
//! The merged [`Config`] is then validated into a [`DevOpsConfig`], which is
//! what the API client and the saved query store are built from.
//!
//! ## Example
//!
//! ```rust,no_run
//! use devops_queries::Config;
//!
//! let base_dir = Config::default_base_dir().unwrap();
//! let config = Config::default()
//!     .merge(Config::load_from_file().unwrap())
//!     .merge(Config::load_from_env().unwrap())
//!     .resolve(&base_dir)
//!     .unwrap();
//! println!("Querying {}/{}", config.organization, config.project);
//! ```

use crate::{error::ConfigError, models::SharedArgs, parsed_property::ParsedProperty};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Directory name used below the platform config and data directories.
const APP_DIR: &str = "devops-queries";

/// Timeout applied to API requests when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Placeholder shown instead of the personal access token.
const REDACTED: &str = "[REDACTED]";

/// The settings understood by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Organization,
    Project,
    PersonalAccessToken,
    AreaPath,
    ApiEndpoint,
    Timeout,
    DbPath,
}

impl SettingKey {
    /// Key name as used by the settings store.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Project => "Project",
            Self::PersonalAccessToken => "PersonalAccessToken",
            Self::AreaPath => "AreaPath",
            Self::ApiEndpoint => "ApiEndpoint",
            Self::Timeout => "Timeout",
            Self::DbPath => "DbPath",
        }
    }

    /// Long command line flag, without the leading dashes.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::Project => "project",
            Self::PersonalAccessToken => "pat",
            Self::AreaPath => "area-path",
            Self::ApiEndpoint => "api-endpoint",
            Self::Timeout => "timeout",
            Self::DbPath => "db-path",
        }
    }

    /// Environment variable carrying this setting.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Organization => "DEVOPS_QUERIES_ORGANIZATION",
            Self::Project => "DEVOPS_QUERIES_PROJECT",
            Self::PersonalAccessToken => "DEVOPS_QUERIES_PAT",
            Self::AreaPath => "DEVOPS_QUERIES_AREA_PATH",
            Self::ApiEndpoint => "DEVOPS_QUERIES_API_ENDPOINT",
            Self::Timeout => "DEVOPS_QUERIES_TIMEOUT",
            Self::DbPath => "DEVOPS_QUERIES_DB_PATH",
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingRequired {
            field: self.key().to_string(),
            flag: self.flag().to_string(),
            env_var: self.env_var().to_string(),
        }
    }
}

/// Temporary struct for deserializing TOML configuration.
///
/// The settings-store key names (`Organization`, `AreaPath`, ...) are accepted
/// next to the snake_case names.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ConfigFile {
    #[serde(alias = "Organization")]
    pub organization: Option<String>,
    #[serde(alias = "Project")]
    pub project: Option<String>,
    #[serde(alias = "PersonalAccessToken")]
    pub pat: Option<String>,
    #[serde(alias = "AreaPath")]
    pub area_path: Option<String>,
    #[serde(alias = "ApiEndpoint")]
    pub api_endpoint: Option<String>,
    #[serde(alias = "Timeout")]
    pub timeout: Option<u64>,
    #[serde(alias = "DbPath")]
    pub db_path: Option<String>,
}

/// Unvalidated configuration assembled from CLI arguments, environment variables,
/// config file and defaults.
#[derive(Debug)]
pub struct Config {
    /// Azure DevOps organization name.
    pub organization: Option<ParsedProperty<String>>,
    /// Azure DevOps project name.
    pub project: Option<ParsedProperty<String>>,
    /// Personal access token for authenticating with Azure DevOps.
    pub pat: Option<ParsedProperty<SecretString>>,
    /// Area path substituted for `@AREAPATH@` in query text.
    pub area_path: Option<ParsedProperty<String>>,
    /// Base URL of the Azure DevOps REST API.
    pub api_endpoint: Option<ParsedProperty<String>>,
    /// Request timeout in seconds.
    pub timeout: Option<ParsedProperty<u64>>,
    /// Location of the saved query database.
    pub db_path: Option<ParsedProperty<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            organization: None,
            project: None,
            pat: None,
            area_path: None,
            api_endpoint: None,
            timeout: Some(ParsedProperty::Default(DEFAULT_TIMEOUT_SECS)),
            db_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the XDG config directory.
    #[must_use = "this returns the loaded configuration which should be used"]
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_path(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let config_content =
            fs::read_to_string(config_path).map_err(|e| ConfigError::FileReadError {
                path: config_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let config_file: ConfigFile =
            toml::from_str(&config_content).map_err(|e| ConfigError::ParseError {
                path: config_path.to_path_buf(),
                message: e.to_string(),
            })?;

        let path = config_path.to_path_buf();
        let file_prop = |v: String| ParsedProperty::File(v.clone(), path.clone(), v);

        Ok(Self {
            organization: config_file.organization.map(file_prop),
            project: config_file.project.map(file_prop),
            pat: config_file.pat.map(|v| {
                ParsedProperty::File(SecretString::from(v), path.clone(), REDACTED.to_string())
            }),
            area_path: config_file.area_path.map(file_prop),
            api_endpoint: config_file.api_endpoint.map(file_prop),
            timeout: config_file
                .timeout
                .map(|v| ParsedProperty::File(v, path.clone(), v.to_string())),
            db_path: config_file.db_path.map(file_prop),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// A timeout that is not a whole number of seconds is rejected rather
    /// than ignored, matching how the config file treats it.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let env_string = |key: SettingKey| {
            std::env::var(key.env_var())
                .ok()
                .map(|v| ParsedProperty::Env(v.clone(), v))
        };

        let timeout = match std::env::var(SettingKey::Timeout.env_var()) {
            Ok(raw) => {
                let seconds =
                    raw.trim()
                        .parse::<u64>()
                        .map_err(|e| ConfigError::InvalidValue {
                            field: SettingKey::Timeout.key().to_string(),
                            message: format!(
                                "{}='{raw}' is not a number of seconds: {e}",
                                SettingKey::Timeout.env_var()
                            ),
                        })?;
                Some(ParsedProperty::Env(seconds, raw))
            }
            Err(_) => None,
        };

        Ok(Self {
            organization: env_string(SettingKey::Organization),
            project: env_string(SettingKey::Project),
            pat: std::env::var(SettingKey::PersonalAccessToken.env_var())
                .ok()
                .map(|v| ParsedProperty::Env(SecretString::from(v), REDACTED.to_string())),
            area_path: env_string(SettingKey::AreaPath),
            api_endpoint: env_string(SettingKey::ApiEndpoint),
            timeout,
            db_path: env_string(SettingKey::DbPath),
        })
    }

    /// Build a Config from the connection flags given on the command line.
    pub fn from_shared_args(shared: &SharedArgs) -> Self {
        let cli = |v: &String| ParsedProperty::Cli(v.clone(), v.clone());
        Config {
            organization: shared.organization.as_ref().map(cli),
            project: shared.project.as_ref().map(cli),
            pat: shared
                .pat
                .as_ref()
                .map(|v| ParsedProperty::Cli(SecretString::from(v.clone()), REDACTED.to_string())),
            area_path: shared.area_path.as_ref().map(cli),
            api_endpoint: shared.api_endpoint.as_ref().map(cli),
            timeout: shared
                .timeout
                .map(|v| ParsedProperty::Cli(v, v.to_string())),
            db_path: shared.db_path.as_ref().map(cli),
        }
    }

    /// Merge this config with another, preferring values from other when they exist
    pub fn merge(self, other: Self) -> Self {
        Self {
            organization: other.organization.or(self.organization),
            project: other.project.or(self.project),
            pat: other.pat.or(self.pat),
            area_path: other.area_path.or(self.area_path),
            api_endpoint: other.api_endpoint.or(self.api_endpoint),
            timeout: other.timeout.or(self.timeout),
            db_path: other.db_path.or(self.db_path),
        }
    }

    /// Validate the merged settings into a [`DevOpsConfig`].
    ///
    /// Relative database paths are resolved against `base_dir`, and the
    /// directory that will hold the database is created when missing.
    pub fn resolve(self, base_dir: &Path) -> Result<DevOpsConfig, ConfigError> {
        let organization = require(self.organization, SettingKey::Organization)?;
        let project = require(self.project, SettingKey::Project)?;
        let area_path = require(self.area_path, SettingKey::AreaPath)?;
        let api_endpoint = require(self.api_endpoint, SettingKey::ApiEndpoint)?;
        let db_path = require(self.db_path, SettingKey::DbPath)?;

        let pat = self
            .pat
            .ok_or_else(|| SettingKey::PersonalAccessToken.missing())?;
        if pat.expose_secret().trim().is_empty() {
            return Err(SettingKey::PersonalAccessToken.missing());
        }
        let pat_source = pat.source_name();

        let timeout = self
            .timeout
            .unwrap_or(ParsedProperty::Default(DEFAULT_TIMEOUT_SECS));
        if *timeout == 0 {
            return Err(ConfigError::InvalidValue {
                field: SettingKey::Timeout.key().to_string(),
                message: "timeout must be at least one second".to_string(),
            });
        }

        let api_endpoint = api_endpoint.map(|v| v.trim().trim_end_matches('/').to_string());
        validate_endpoint(&api_endpoint)?;

        let db_path = match db_path {
            ParsedProperty::Cli(v, o) => ParsedProperty::Cli(resolve_db_path(&v, base_dir)?, o),
            ParsedProperty::Env(v, o) => ParsedProperty::Env(resolve_db_path(&v, base_dir)?, o),
            ParsedProperty::File(v, p, o) => {
                ParsedProperty::File(resolve_db_path(&v, base_dir)?, p, o)
            }
            ParsedProperty::Default(v) => ParsedProperty::Default(resolve_db_path(&v, base_dir)?),
        };

        let config = DevOpsConfig {
            organization,
            project,
            pat: pat.into_value(),
            pat_source,
            area_path,
            api_endpoint,
            timeout,
            db_path,
        };

        for (key, value, source) in config.settings_summary() {
            debug!(setting = key, value = %value, source, "resolved setting");
        }

        Ok(config)
    }

    /// Directory that relative database paths are resolved against.
    pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(ConfigError::NoPlatformDirectory { kind: "data" })
    }

    /// Get the XDG config file path for devops-queries
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        // Use XDG_CONFIG_HOME if set, otherwise the platform config dir
        let config_dir = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::config_dir().ok_or(ConfigError::NoPlatformDirectory { kind: "config" })?,
        };

        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// Create a sample config file for user reference.
    ///
    /// Returns the path and whether a file was written; an existing config is
    /// never overwritten.
    #[must_use = "this operation can fail and the result should be checked"]
    pub fn create_sample_config() -> Result<(PathBuf, bool), ConfigError> {
        let config_path = Self::get_config_path()?;

        if config_path.exists() {
            return Ok((config_path, false));
        }

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::DirectoryCreationError {
                path: parent.to_path_buf(),
                message: e.to_string(),
            })?;
        }

        let sample_config = r#"# devops-queries configuration file
# Location: ~/.config/devops-queries/config.toml (Linux) or the platform config directory

# Azure DevOps organization (required)
# organization = "your-organization"

# Azure DevOps project (required)
# project = "your-project"

# Personal Access Token (required, but consider using DEVOPS_QUERIES_PAT instead)
# pat = "your-pat-token"

# Area path substituted for @AREAPATH@ in queries (required)
# area_path = "your-project\\your-team"

# Azure DevOps REST API base URL (required)
api_endpoint = "https://dev.azure.com"

# Request timeout in seconds (optional, defaults to 30)
timeout = 30

# Saved query database (required); relative paths live in the platform data directory
db_path = "saved_queries.db"
"#;

        fs::write(&config_path, sample_config).map_err(|e| ConfigError::FileWriteError {
            path: config_path.clone(),
            message: e.to_string(),
        })?;

        info!(path = %config_path.display(), "sample config created");
        Ok((config_path, true))
    }
}

fn require(
    property: Option<ParsedProperty<String>>,
    key: SettingKey,
) -> Result<ParsedProperty<String>, ConfigError> {
    match property.map(|p| p.map(|v| v.trim().to_string())) {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err(key.missing()),
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let invalid = |message: String| ConfigError::InvalidValue {
        field: SettingKey::ApiEndpoint.key().to_string(),
        message,
    };

    let url = url::Url::parse(endpoint).map_err(|e| invalid(format!("'{endpoint}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

/// Resolve the database location and make sure its directory exists.
///
/// Relative paths are placed below `base_dir`.
pub fn resolve_db_path(db_path: &str, base_dir: &Path) -> Result<PathBuf, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        field: SettingKey::DbPath.key().to_string(),
        message: format!("invalid database path: {db_path}"),
    };

    let raw = PathBuf::from(db_path.trim());
    let path = if raw.is_absolute() {
        raw
    } else {
        base_dir.join(raw)
    };

    if path.file_name().is_none() {
        return Err(invalid());
    }
    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(invalid)?;

    if !directory.exists() {
        info!(directory = %directory.display(), "creating database directory");
        fs::create_dir_all(directory).map_err(|e| ConfigError::DirectoryCreationError {
            path: directory.to_path_buf(),
            message: e.to_string(),
        })?;
    }

    Ok(path)
}

/// Validated configuration, immutable for the rest of the session.
#[derive(Debug)]
pub struct DevOpsConfig {
    pub organization: ParsedProperty<String>,
    pub project: ParsedProperty<String>,
    pub pat: SecretString,
    /// Where the token came from ("cli", "env", "file").
    pub pat_source: &'static str,
    pub area_path: ParsedProperty<String>,
    /// Endpoint without a trailing slash.
    pub api_endpoint: ParsedProperty<String>,
    pub timeout: ParsedProperty<u64>,
    /// Absolute database location.
    pub db_path: ParsedProperty<PathBuf>,
}

impl DevOpsConfig {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(*self.timeout)
    }

    /// Every setting as (key, display value, source), with the token redacted.
    pub fn settings_summary(&self) -> Vec<(&'static str, String, &'static str)> {
        vec![
            (
                SettingKey::Organization.key(),
                self.organization.to_string(),
                self.organization.source_name(),
            ),
            (
                SettingKey::Project.key(),
                self.project.to_string(),
                self.project.source_name(),
            ),
            (
                SettingKey::PersonalAccessToken.key(),
                REDACTED.to_string(),
                self.pat_source,
            ),
            (
                SettingKey::AreaPath.key(),
                self.area_path.to_string(),
                self.area_path.source_name(),
            ),
            (
                SettingKey::ApiEndpoint.key(),
                self.api_endpoint.to_string(),
                self.api_endpoint.source_name(),
            ),
            (
                SettingKey::Timeout.key(),
                self.timeout.to_string(),
                self.timeout.source_name(),
            ),
            (
                SettingKey::DbPath.key(),
                self.db_path.display().to_string(),
                self.db_path.source_name(),
            ),
        ]
    }
}
