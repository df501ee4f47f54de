//! Azure DevOps REST client for WIQL queries and work item details.
//!
//! ## Example
//!
//! ```rust,no_run
//! use devops_queries::api::{AzureDevOpsClient, WorkItemQueries};
//! use devops_queries::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let base_dir = Config::default_base_dir()?;
//! let config = Config::default()
//!     .merge(Config::load_from_env()?)
//!     .resolve(&base_dir)?;
//! let client = AzureDevOpsClient::new(&config)?;
//!
//! let query = client.replace_area_path("SELECT [System.Id] FROM WorkItems WHERE [System.AreaPath] = '@AREAPATH@'");
//! for item in client.execute_query(&query).await? {
//!     println!("{}", item.id);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod credential;
mod traits;

pub use client::{API_VERSION, AzureDevOpsClient, parse_wiql_response, parse_work_item};
pub use credential::PatCredential;
pub use traits::WorkItemQueries;

#[cfg(test)]
pub use traits::mocks;
