//! Command dispatch for the `devops-queries` binary.

use std::io::Write;
use tracing::info;

use crate::api::WorkItemQueries;
use crate::config::DevOpsConfig;
use crate::core::{
    DEFAULT_QUERY_NAME, DEFAULT_QUERY_TEXT, ExitCode, QueryLibrary, QueryRunner, is_placeholder,
};
use crate::error::{DevOpsError, DevOpsResult, ValidationError};
use crate::models::{Commands, OutputFormat, QueriesCommand, RunArgs};
use crate::output::OutputWriter;
use crate::store::SavedQueryStore;

/// Everything a command needs, built once by the binary.
pub struct CommandContext<'a, C: WorkItemQueries + ?Sized> {
    pub config: &'a DevOpsConfig,
    pub client: &'a C,
    pub store: &'a SavedQueryStore,
}

/// Runs one command, writing its results to `out`.
///
/// No command means `run` with the default query.
pub async fn execute<C, W>(
    command: Option<Commands>,
    ctx: &CommandContext<'_, C>,
    out: W,
) -> DevOpsResult<ExitCode>
where
    C: WorkItemQueries + ?Sized,
    W: Write,
{
    match command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(args, ctx, out).await,
        Commands::Show(args) => {
            let item = ctx.client.fetch_work_item_details(&args.id).await?;
            OutputWriter::new(out, args.output).write_work_item(&item)?;
            Ok(ExitCode::Success)
        }
        Commands::Queries(command) => queries(command, ctx.store, out),
        Commands::Config => {
            OutputWriter::new(out, OutputFormat::Text)
                .write_settings(&ctx.config.settings_summary())?;
            Ok(ExitCode::Success)
        }
    }
}

async fn run<C, W>(args: RunArgs, ctx: &CommandContext<'_, C>, out: W) -> DevOpsResult<ExitCode>
where
    C: WorkItemQueries + ?Sized,
    W: Write,
{
    let template = match (args.query, args.saved) {
        (Some(query), _) => query,
        (None, Some(name)) => QueryLibrary::new(ctx.store).get(&name)?.query_text,
        (None, None) => {
            info!(name = DEFAULT_QUERY_NAME, "no query given, using the default");
            DEFAULT_QUERY_TEXT.to_string()
        }
    };

    let items = QueryRunner::new(ctx.client).run(&template).await?;
    OutputWriter::new(out, args.output).write_work_items(&items, args.details)?;

    if items.iter().any(is_placeholder) {
        Ok(ExitCode::PartialSuccess)
    } else {
        Ok(ExitCode::Success)
    }
}

fn queries<W: Write>(
    command: QueriesCommand,
    store: &SavedQueryStore,
    mut out: W,
) -> DevOpsResult<ExitCode> {
    let library = QueryLibrary::new(store);

    match command {
        QueriesCommand::List { output } => {
            OutputWriter::new(out, output).write_saved_queries(&library.list()?)?;
        }
        QueriesCommand::Add { name, query_text } => {
            let saved = library.save(&name, &query_text)?;
            writeln!(out, "Saved query '{}' ({})", saved.name, saved.id)?;
        }
        QueriesCommand::Update {
            name,
            rename,
            query_text,
        } => {
            let existing = library.get(&name)?;
            let updated = library
                .update(existing.id, rename.as_deref(), query_text.as_deref())?
                .ok_or(ValidationError::UnknownQuery { name })?;
            writeln!(out, "Updated query '{}'", updated.name)?;
        }
        QueriesCommand::Delete { name } => {
            let existing = library.get(&name)?;
            if library.delete(existing.id)? {
                writeln!(out, "Deleted query '{}'", existing.name)?;
            }
        }
    }
    Ok(ExitCode::Success)
}

/// Exit code reported for a failed command.
pub fn exit_code_for(error: &DevOpsError) -> ExitCode {
    match error {
        DevOpsError::Config(_) => ExitCode::ConfigError,
        DevOpsError::Validation(ValidationError::UnknownQuery { .. }) => ExitCode::UnknownQuery,
        _ => ExitCode::GeneralError,
    }
}
