use crate::{config::Config, error::ConfigError, logging::LogFormat};
use clap::{Args as ClapArgs, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use uuid::Uuid;

/// Placeholder token replaced with the configured area path before a query runs.
pub const AREA_PATH_TOKEN: &str = "@AREAPATH@";

/// A named WIQL query kept in the local library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedQuery {
    pub id: Uuid,
    pub name: String,
    pub query_text: String,
}

impl SavedQuery {
    /// Creates a query with a fresh v4 id.
    pub fn new(name: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            query_text: query_text.into(),
        }
    }
}

/// One entry of the `workItems` array returned by a WIQL query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkItemRef {
    /// String form of the JSON id, whether it was a number or a string.
    pub id: String,
    pub url: Option<String>,
}

/// Details shown below a work item's title.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkItemDetails {
    /// Plain-text rendering of `System.Description`.
    pub description: Option<String>,
}

/// A work item as presented to the user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkItemViewModel {
    pub id: String,
    pub title: Option<String>,
    pub fields: Map<String, Value>,
    pub details: WorkItemDetails,
}

impl WorkItemViewModel {
    /// A row standing in for a result that could not be loaded.
    pub fn placeholder(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Single line form, `#{id}: {title}`.
    pub fn list_item(&self) -> String {
        format!("#{}: {}", self.id, self.title.as_deref().unwrap_or_default())
    }

    pub fn description(&self) -> Option<&str> {
        self.details.description.as_deref()
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Connection and storage settings accepted by every command
#[derive(ClapArgs, Clone, Default, Debug)]
pub struct SharedArgs {
    // Azure DevOps Connection
    /// Azure DevOps organization name
    #[arg(short, long, global = true, help_heading = "Azure DevOps Connection")]
    pub organization: Option<String>,

    /// Azure DevOps project name
    #[arg(short, long, global = true, help_heading = "Azure DevOps Connection")]
    pub project: Option<String>,

    /// Personal Access Token for Azure DevOps API authentication
    #[arg(short = 't', long, global = true, help_heading = "Azure DevOps Connection")]
    pub pat: Option<String>,

    /// Base URL of the Azure DevOps REST API (e.g. https://dev.azure.com)
    #[arg(long, global = true, help_heading = "Azure DevOps Connection")]
    pub api_endpoint: Option<String>,

    /// Request timeout in seconds [default: 30]
    #[arg(long, global = true, help_heading = "Azure DevOps Connection")]
    pub timeout: Option<u64>,

    // Query Options
    /// Area path substituted for @AREAPATH@ in query text
    #[arg(short, long, global = true, help_heading = "Query Options")]
    pub area_path: Option<String>,

    // Storage
    /// Saved query database; relative paths live in the platform data directory
    #[arg(long, global = true, help_heading = "Storage")]
    pub db_path: Option<String>,
}

/// Logging flags. [`crate::logging::LogSettings`] reads them before
/// argument parsing; clap validates them and lists them under `--help`.
#[derive(ClapArgs, Clone, Default, Debug)]
pub struct LogArgs {
    /// Enable logging at this level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_level: Option<LevelFilter>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_file: Option<PathBuf>,

    /// Log line format
    #[arg(long, global = true, value_enum, help_heading = "Logging")]
    pub log_format: Option<LogFormat>,
}

/// Arguments for the `run` subcommand.
#[derive(ClapArgs, Clone, Debug, Default)]
pub struct RunArgs {
    /// WIQL query text; @AREAPATH@ is replaced with the configured area path
    #[arg(conflicts_with = "saved")]
    pub query: Option<String>,

    /// Run a saved query by name
    #[arg(short, long, help_heading = "Query Options")]
    pub saved: Option<String>,

    /// Include fields and description for every work item
    #[arg(short, long, help_heading = "Output Options")]
    pub details: bool,

    /// Output format: text, json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, help_heading = "Output Options")]
    pub output: OutputFormat,
}

/// Arguments for the `show` subcommand.
#[derive(ClapArgs, Clone, Debug)]
pub struct ShowArgs {
    /// Work item id
    pub id: String,

    /// Output format: text, json
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, help_heading = "Output Options")]
    pub output: OutputFormat,
}

/// Subcommands for managing the saved query library.
#[derive(Subcommand, Clone, Debug)]
pub enum QueriesCommand {
    /// List saved queries
    #[command(visible_alias = "ls")]
    List {
        /// Output format: text, json
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Save a new query
    Add {
        /// Unique query name
        name: String,
        /// WIQL query text
        query_text: String,
    },

    /// Rename a saved query or replace its text
    #[command(arg_required_else_help = true)]
    Update {
        /// Name of the query to change
        name: String,
        /// New name
        #[arg(long)]
        rename: Option<String>,
        /// New WIQL query text
        #[arg(long)]
        query_text: Option<String>,
    },

    /// Delete a saved query
    #[command(visible_alias = "rm")]
    Delete {
        /// Name of the query to delete
        name: String,
    },
}

/// Available commands
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Run a WIQL query and list the matching work items
    #[command(
        visible_alias = "r",
        long_about = "Run a WIQL query and list the matching work items.\n\n\
            The query comes from the positional argument, from --saved, or defaults to\n\
            the built-in \"Committed WorkItems\" query. Every @AREAPATH@ in the text is\n\
            replaced with the configured area path. Work items that fail to load are\n\
            listed with an error title instead of aborting the run.",
        after_help = "EXAMPLES:\n    \
            # Committed work items in the configured area path\n    \
            devops-queries run\n\n    \
            # Ad-hoc query with details as JSON\n    \
            devops-queries run \"SELECT [System.Id] FROM WorkItems WHERE [System.AreaPath] = '@AREAPATH@'\" \\\n      \
            --details --output json\n\n    \
            # Saved query\n    \
            devops-queries run --saved \"My bugs\""
    )]
    Run(RunArgs),

    /// Show one work item with its fields and description
    #[command(visible_alias = "s")]
    Show(ShowArgs),

    /// Manage the saved query library
    #[command(visible_alias = "q", subcommand)]
    Queries(QueriesCommand),

    /// Print the resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Clone, Debug)]
#[command(
    author,
    version = crate::LONG_VERSION,
    about = "Query Azure DevOps work items with WIQL and keep a library of saved queries",
    long_about = "Query Azure DevOps work items with WIQL and keep a library of saved queries.\n\n\
        Configuration can be provided via CLI arguments, environment variables (DEVOPS_QUERIES_*),\n\
        or a config file (~/.config/devops-queries/config.toml).",
    after_help = "EXAMPLES:\n    \
        # Run the default query\n    \
        devops-queries -o myorg -p myproject -t <PAT> -a 'myproject\\team' run\n\n    \
        # Save a query and run it\n    \
        devops-queries queries add \"Active\" \"SELECT [System.Id] FROM WorkItems WHERE [System.State] = 'Active'\"\n    \
        devops-queries run --saved Active\n\n    \
        # Create sample config file\n    \
        devops-queries --create-config"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub shared: SharedArgs,

    #[command(flatten)]
    pub logging: LogArgs,

    /// Create a sample configuration file at ~/.config/devops-queries/config.toml
    #[arg(long)]
    pub create_config: bool,
}

impl Args {
    /// Layer defaults, config file, environment and CLI flags, in that order.
    pub fn layered_config(&self) -> Result<Config, ConfigError> {
        Ok(Config::default()
            .merge(Config::load_from_file()?)
            .merge(Config::load_from_env()?)
            .merge(Config::from_shared_args(&self.shared)))
    }
}
