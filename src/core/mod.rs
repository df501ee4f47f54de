//! Query execution and saved query management.
//!
//! - [`runner`]: runs WIQL queries and loads work item details
//! - [`library`]: validated saved query operations

pub mod library;
pub mod runner;

pub use library::QueryLibrary;
pub use runner::{DEFAULT_QUERY_NAME, DEFAULT_QUERY_TEXT, QueryRunner, is_placeholder};

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Command completed.
    Success = 0,

    /// General error (network, storage, invalid input).
    GeneralError = 1,

    /// Configuration could not be resolved.
    ConfigError = 2,

    /// The query ran but some rows are error placeholders.
    PartialSuccess = 3,

    /// The named saved query does not exist.
    UnknownQuery = 4,
}

impl ExitCode {
    /// Returns the numeric exit code value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable description of the exit code.
    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Completed successfully",
            ExitCode::GeneralError => "General error occurred",
            ExitCode::ConfigError => "Configuration is incomplete or invalid",
            ExitCode::PartialSuccess => "Some work items could not be loaded",
            ExitCode::UnknownQuery => "No saved query with that name",
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
