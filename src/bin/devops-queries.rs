use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode as ProcessExitCode;
use tracing::{debug, error};

use devops_queries::{
    Args, AzureDevOpsClient, Config, DevOpsError, ExitCode, SavedQueryStore,
    commands::{self, CommandContext},
    logging::{self, LogSettings},
};

#[tokio::main]
async fn main() -> ProcessExitCode {
    // Logging is set up before clap so config loading is covered too
    let raw_args: Vec<String> = std::env::args().collect();
    let _log_guard = match logging::init(&LogSettings::from_args(&raw_args)) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    let args = Args::parse();

    match run(args).await {
        Ok(code) => code.into(),
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {e:#}");
            e.downcast_ref::<DevOpsError>()
                .map(commands::exit_code_for)
                .unwrap_or(ExitCode::GeneralError)
                .into()
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    // Handle --create-config flag
    if args.create_config {
        let (path, written) = Config::create_sample_config().map_err(DevOpsError::from)?;
        if written {
            println!("Sample config created at {}", path.display());
        } else {
            println!("Config file already exists at {}", path.display());
        }
        return Ok(ExitCode::Success);
    }

    // Resolve configuration from CLI args, environment variables, and config file
    let base_dir = Config::default_base_dir().map_err(DevOpsError::from)?;
    let config = args
        .layered_config()
        .and_then(|layered| layered.resolve(&base_dir))
        .map_err(DevOpsError::from)?;

    let client = AzureDevOpsClient::new(&config).map_err(DevOpsError::from)?;
    let store = SavedQueryStore::open(config.db_path.value())
        .map_err(DevOpsError::from)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    debug!(db = %store.path().display(), "saved query store ready");

    let ctx = CommandContext {
        config: &config,
        client: &client,
        store: &store,
    };
    let code = commands::execute(args.command, &ctx, std::io::stdout().lock()).await?;
    Ok(code)
}
