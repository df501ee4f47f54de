//! # devops-queries
//!
//! Run Azure DevOps WIQL queries, load the matching work items and keep a
//! local SQLite library of named queries.
//!
//! - Azure DevOps REST client (WIQL and work item endpoints)
//! - HTML descriptions converted to plain text
//! - Layered configuration (CLI, environment, TOML file)
//! - Saved query storage
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use devops_queries::{AzureDevOpsClient, Config, QueryRunner, DEFAULT_QUERY_TEXT};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let base_dir = Config::default_base_dir()?;
//! let config = Config::default()
//!     .merge(Config::load_from_file()?)
//!     .merge(Config::load_from_env()?)
//!     .resolve(&base_dir)?;
//! let client = AzureDevOpsClient::new(&config)?;
//!
//! for item in QueryRunner::new(&client).run(DEFAULT_QUERY_TEXT).await? {
//!     println!("{}", item.list_item());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod models;
pub mod output;
pub mod parsed_property;
pub mod store;
pub mod utils;

// Re-export commonly used types for convenience
pub use api::{AzureDevOpsClient, WorkItemQueries};
pub use config::{Config, DevOpsConfig};
pub use crate::core::{DEFAULT_QUERY_NAME, DEFAULT_QUERY_TEXT, ExitCode, QueryLibrary, QueryRunner};
pub use error::{ApiError, ConfigError, DevOpsError, StorageError, ValidationError};
pub use models::{Args, SavedQuery, WorkItemRef, WorkItemViewModel};
pub use store::SavedQueryStore;

/// Core result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version string shown by `--version`, including the git revision.
pub const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");
