//! Unified error handling for the devops-queries library.
//!
//! This module provides the error hierarchy using `thiserror` so callers can
//! react to specific failures instead of matching on strings.
//!
//! ## Error Categories
//!
//! - [`ApiError`]: Errors from Azure DevOps REST calls
//! - [`ConfigError`]: Errors from configuration loading and validation
//! - [`StorageError`]: Errors from the saved query database
//! - [`ValidationError`]: Rejected saved query edits
//!
//! ## Example
//!
//! ```rust,no_run
//! use devops_queries::error::{ApiError, DevOpsError};
//!
//! fn example() -> Result<(), DevOpsError> {
//!     // Errors are automatically converted via From trait
//!     Err(ApiError::InvalidQuery)?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// The main error type for the devops-queries library.
#[derive(Error, Debug)]
pub enum DevOpsError {
    /// An error occurred while interacting with the Azure DevOps API.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// An error occurred while loading or validating configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An error occurred in the saved query database.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A saved query edit was rejected.
    #[error("Invalid saved query: {0}")]
    Validation(#[from] ValidationError),

    /// Writing command output failed.
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when interacting with the Azure DevOps API.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API request was unauthorized (401).
    #[error("Unauthorized: invalid or expired Personal Access Token (URL: {url})")]
    Unauthorized {
        /// URL of the rejected request.
        url: String,
    },

    /// The requested resource was not found (404).
    #[error("Resource not found: {url}")]
    NotFound {
        /// URL of the missing resource.
        url: String,
    },

    /// The API returned any other non-success status.
    #[error("HTTP request failed with status code {status} for URL: {url}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// URL of the failed request.
        url: String,
    },

    /// Failed to parse the API response.
    #[error("Failed to parse API response: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
    },

    /// A network or transport error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The query text was empty or whitespace.
    #[error("Query cannot be empty or whitespace")]
    InvalidQuery,

    /// The personal access token cannot be sent as an HTTP header.
    #[error("Personal Access Token contains characters that are not valid in an HTTP header")]
    InvalidCredential,
}

impl ApiError {
    /// Builds the error matching a non-success HTTP status.
    pub fn from_status(status: reqwest::StatusCode, url: &str) -> Self {
        match status {
            reqwest::StatusCode::UNAUTHORIZED => ApiError::Unauthorized {
                url: url.to_string(),
            },
            reqwest::StatusCode::NOT_FOUND => ApiError::NotFound {
                url: url.to_string(),
            },
            other => ApiError::RequestFailed {
                status: other.as_u16(),
                url: url.to_string(),
            },
        }
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration field is missing or blank.
    #[error("{field} is required (use --{flag}, {env_var} env var, or config file)")]
    MissingRequired {
        /// Settings key of the missing field.
        field: String,
        /// Command line flag for this field.
        flag: String,
        /// Environment variable name for this field.
        env_var: String,
    },

    /// Failed to read the configuration file.
    #[error("Failed to read config file at {path}: {message}")]
    FileReadError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to write the configuration file.
    #[error("Failed to write config file at {path}: {message}")]
    FileWriteError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError {
        /// Path to the config file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// An invalid value was provided for a configuration field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        message: String,
    },

    /// Failed to create a directory needed by the configuration.
    #[error("Failed to create directory at {path}: {message}")]
    DirectoryCreationError {
        /// Path where directory creation failed.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// No platform directory could be determined.
    #[error("Could not determine the {kind} directory for this platform")]
    NoPlatformDirectory {
        /// Which directory was looked up ("config", "data").
        kind: &'static str,
    },
}

/// Errors from the saved query database.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The underlying SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A saved query with this id already exists.
    #[error("A saved query with id {id} already exists")]
    DuplicateId {
        /// The conflicting id.
        id: Uuid,
    },

    /// A stored id is not a valid UUID.
    #[error("Stored query id '{value}' is not a valid UUID: {source}")]
    CorruptId {
        /// The raw value read from the database.
        value: String,
        /// The parse failure.
        source: uuid::Error,
    },
}

/// Reasons a saved query edit is rejected before it reaches the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The query name was empty.
    #[error("Query name cannot be empty")]
    EmptyName,

    /// The query text was empty.
    #[error("Query text cannot be empty")]
    EmptyQueryText,

    /// Another saved query already uses the name.
    #[error("A query named '{name}' already exists, please use a different name")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// No saved query matched the requested name.
    #[error("No saved query named '{name}'")]
    UnknownQuery {
        /// The requested name.
        name: String,
    },
}

/// Type alias for Results using DevOpsError.
///
/// Note: This is not re-exported from the crate root to avoid shadowing `anyhow::Result`.
pub type DevOpsResult<T> = std::result::Result<T, DevOpsError>;

#[cfg(test)]
mod tests {
    use super::*;

    /// # API Error Display
    ///
    /// Tests that API errors surface status code and URL.
    ///
    /// ## Test Scenario
    /// - Creates ApiError variants from HTTP statuses
    /// - Tests their Display implementation
    ///
    /// ## Expected Outcome
    /// - Messages contain the status and the URL of the request
    #[test]
    fn test_api_error_display() {
        let url = "https://dev.azure.com/org/proj/_apis/wit/wiql?api-version=6.0";

        let unauthorized = ApiError::from_status(reqwest::StatusCode::UNAUTHORIZED, url);
        assert!(matches!(unauthorized, ApiError::Unauthorized { .. }));
        assert!(unauthorized.to_string().contains("Unauthorized"));
        assert!(unauthorized.to_string().contains(url));

        let not_found = ApiError::from_status(reqwest::StatusCode::NOT_FOUND, url);
        assert!(matches!(not_found, ApiError::NotFound { .. }));

        let failed = ApiError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, url);
        let msg = failed.to_string();
        assert!(msg.contains("500"));
        assert!(msg.contains(url));
    }

    /// # Config Error Display
    ///
    /// Tests that missing settings point at every way of providing them.
    ///
    /// ## Test Scenario
    /// - Creates a MissingRequired error
    ///
    /// ## Expected Outcome
    /// - Message mentions the key, the flag and the environment variable
    #[test]
    fn test_config_error_display() {
        let missing = ConfigError::MissingRequired {
            field: "AreaPath".to_string(),
            flag: "area-path".to_string(),
            env_var: "DEVOPS_QUERIES_AREA_PATH".to_string(),
        };
        let msg = missing.to_string();
        assert!(msg.contains("AreaPath"));
        assert!(msg.contains("--area-path"));
        assert!(msg.contains("DEVOPS_QUERIES_AREA_PATH"));
    }

    /// # Storage Error Display
    ///
    /// Tests duplicate and corrupt id messages.
    ///
    /// ## Test Scenario
    /// - Creates DuplicateId and CorruptId errors
    ///
    /// ## Expected Outcome
    /// - Messages contain the offending id
    #[test]
    fn test_storage_error_display() {
        let id = Uuid::new_v4();
        let duplicate = StorageError::DuplicateId { id };
        assert!(duplicate.to_string().contains(&id.to_string()));

        let source = Uuid::parse_str("not-a-uuid").unwrap_err();
        let corrupt = StorageError::CorruptId {
            value: "not-a-uuid".to_string(),
            source,
        };
        assert!(corrupt.to_string().contains("not-a-uuid"));
    }

    /// # Error Conversion
    ///
    /// Tests that errors convert correctly through the From trait.
    ///
    /// ## Test Scenario
    /// - Creates specific error types
    /// - Converts them to DevOpsError
    ///
    /// ## Expected Outcome
    /// - All error types convert seamlessly to DevOpsError
    #[test]
    fn test_error_conversion() {
        let api: DevOpsError = ApiError::InvalidQuery.into();
        assert!(matches!(api, DevOpsError::Api(_)));

        let config: DevOpsError = ConfigError::NoPlatformDirectory { kind: "data" }.into();
        assert!(matches!(config, DevOpsError::Config(_)));

        let validation: DevOpsError = ValidationError::EmptyName.into();
        assert!(matches!(validation, DevOpsError::Validation(_)));

        let io: DevOpsError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(io, DevOpsError::Io(_)));
        assert!(io.to_string().starts_with("Output error"));
    }
}
