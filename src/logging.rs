//! Diagnostic logging for the `devops-queries` binary.
//!
//! Command output goes to stdout, so diagnostics are opt-in: nothing is
//! logged unless `--log-level` or `DEVOPS_QUERIES_LOG_LEVEL` is set. Only
//! events from this crate are emitted; reqwest, hyper and rusqlite stay quiet
//! even at `trace`.
//!
//! The settings are read from the raw argument list before clap runs, so that
//! configuration loading is already covered. clap still validates the same
//! flags through [`crate::models::LogArgs`].

use anyhow::Context;
use clap::ValueEnum;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    Layer, Registry,
    filter::{LevelFilter, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LEVEL_ENV: &str = "DEVOPS_QUERIES_LOG_LEVEL";
const FILE_ENV: &str = "DEVOPS_QUERIES_LOG_FILE";
const FORMAT_ENV: &str = "DEVOPS_QUERIES_LOG_FORMAT";

/// Shape of each log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogSettings {
    /// `None` keeps logging off.
    pub level: Option<LevelFilter>,
    /// Append to this file instead of writing to stderr.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl LogSettings {
    /// Reads the process arguments and `DEVOPS_QUERIES_LOG_*` variables.
    ///
    /// Flags win over the environment. Unparseable values are treated as
    /// absent; a bad flag is then rejected by clap, a bad variable just
    /// leaves that setting at its default.
    pub fn from_args(args: &[String]) -> Self {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    fn resolve(args: &[String], env: impl Fn(&str) -> Option<String>) -> Self {
        let setting = |flag: &str, key: &str| flag_value(args, flag).or_else(|| env(key));

        Self {
            level: setting("--log-level", LEVEL_ENV).and_then(|s| s.trim().parse().ok()),
            file: setting("--log-file", FILE_ENV).map(PathBuf::from),
            format: setting("--log-format", FORMAT_ENV)
                .and_then(|s| LogFormat::from_str(s.trim(), true).ok())
                .unwrap_or_default(),
        }
    }

    fn enabled_level(&self) -> Option<LevelFilter> {
        self.level.filter(|level| *level != LevelFilter::OFF)
    }
}

/// Installs the global subscriber.
///
/// Returns `Ok(None)` when logging is off. Otherwise the returned guard
/// flushes the background writer when dropped and must live until exit.
pub fn init(settings: &LogSettings) -> crate::Result<Option<WorkerGuard>> {
    let Some(level) = settings.enabled_level() else {
        return Ok(None);
    };

    let (writer, guard, ansi) = match &settings.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (writer, guard, false)
        }
        None => {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
            (writer, guard, true)
        }
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = match settings.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(Targets::new().with_target("devops_queries", level))
        .try_init()
        .context("installing the log subscriber")?;

    Ok(Some(guard))
}

/// Value of `--flag value` or `--flag=value`, first occurrence wins.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            return iter.next().cloned();
        }
        if let Some(value) = arg.strip_prefix(flag).and_then(|rest| rest.strip_prefix('=')) {
            return Some(value.to_string());
        }
    }
    None
}
