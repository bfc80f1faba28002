//! Logging setup.
//!
//! Components only emit `tracing` events under their module target; the
//! binary calls [`init`] once and keeps the returned [`Logging`] handle
//! alive for the whole run. Dropping the handle flushes the file writers.
//!
//! Sinks:
//!
//! - console, at `LOG_LEVEL` (or `RUST_LOG` when set)
//! - `logs/test_execution_{YYYYmmdd_HHMMSS}.log`, everything from the harness at DEBUG
//! - `logs/{module}.log` for each of [`MODULE_LOGS`], filtered to that module

use crate::config::HarnessConfig;
use crate::result::{HarnessError, HarnessResult};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer, Registry};

/// Tracing target of this crate
pub const CRATE_TARGET: &str = "demoqa_harness";

/// Tracing target of the command-line binary
pub const CLI_TARGET: &str = "demoqa_harness_cli";

/// Modules that get a log file of their own
pub const MODULE_LOGS: [&str; 5] = ["pages", "tree", "api", "hooks", "steps"];

/// A boxed layer over the registry
pub type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Tracing target of a harness module
#[must_use]
pub fn module_target(module: &str) -> String {
    format!("{CRATE_TARGET}::{module}")
}

/// File name of the per-run execution log
#[must_use]
pub fn execution_log_name(started: DateTime<Local>) -> String {
    format!("test_execution_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Console filter for `level`, unless `RUST_LOG` is set
///
/// # Errors
///
/// Returns [`HarnessError::Logging`] if `level` is not a tracing level.
pub fn console_filter(level: &str) -> HarnessResult<EnvFilter> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return EnvFilter::try_from_default_env().map_err(|e| HarnessError::Logging {
            message: format!("invalid RUST_LOG: {e}"),
        });
    }
    let level = parse_level(level)?;
    EnvFilter::try_new(format!("warn,{CRATE_TARGET}={level},{CLI_TARGET}={level}")).map_err(|e| {
        HarnessError::Logging {
            message: e.to_string(),
        }
    })
}

/// Parse a `LOG_LEVEL` value (`DEBUG`, `info`, `WARNING`, ...)
///
/// # Errors
///
/// Returns [`HarnessError::Logging`] for unknown levels.
pub fn parse_level(level: &str) -> HarnessResult<Level> {
    let level = level.trim();
    match level.to_ascii_lowercase().as_str() {
        "warning" => Ok(Level::WARN),
        "critical" => Ok(Level::ERROR),
        _ => Level::from_str(level).map_err(|_| HarnessError::Logging {
            message: format!("unknown log level '{level}'"),
        }),
    }
}

/// Live logging sinks
///
/// Holds the non-blocking writer guards; log files are complete once this
/// is dropped.
#[derive(Debug)]
pub struct Logging {
    execution_log: PathBuf,
    module_logs: Vec<(&'static str, PathBuf)>,
    _guards: Vec<WorkerGuard>,
}

impl Logging {
    /// Path of the per-run execution log
    #[must_use]
    pub fn execution_log(&self) -> &Path {
        &self.execution_log
    }

    /// Path of a module log (`pages`, `tree`, ...)
    #[must_use]
    pub fn module_log(&self, module: &str) -> Option<&Path> {
        self.module_logs
            .iter()
            .find(|(name, _)| *name == module)
            .map(|(_, path)| path.as_path())
    }
}

/// Build the file layers without installing them
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn file_layers(
    logs_dir: &Path,
    started: DateTime<Local>,
) -> HarnessResult<(Vec<BoxedLayer>, Logging)> {
    std::fs::create_dir_all(logs_dir)?;

    let mut layers = Vec::with_capacity(MODULE_LOGS.len() + 1);
    let mut guards = Vec::with_capacity(MODULE_LOGS.len() + 1);

    let execution_name = execution_log_name(started);
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(logs_dir, &execution_name));
    guards.push(guard);
    layers.push(
        fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .with_filter(
                Targets::new()
                    .with_target(CRATE_TARGET, Level::DEBUG)
                    .with_target(CLI_TARGET, Level::DEBUG),
            )
            .boxed(),
    );

    let mut module_logs = Vec::with_capacity(MODULE_LOGS.len());
    for module in MODULE_LOGS {
        let file_name = format!("{module}.log");
        let (writer, guard) =
            tracing_appender::non_blocking(tracing_appender::rolling::never(logs_dir, &file_name));
        guards.push(guard);
        layers.push(
            fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(Targets::new().with_target(module_target(module), Level::DEBUG))
                .boxed(),
        );
        module_logs.push((module, logs_dir.join(file_name)));
    }

    let logging = Logging {
        execution_log: logs_dir.join(execution_name),
        module_logs,
        _guards: guards,
    };
    Ok((layers, logging))
}

/// Install the global subscriber
///
/// # Errors
///
/// Returns [`HarnessError::Logging`] if the level is invalid or a global
/// subscriber is already installed, or an I/O error if the log directory
/// cannot be created.
pub fn init(config: &HarnessConfig) -> HarnessResult<Logging> {
    let console = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter(&config.log_level)?)
        .boxed();

    let (mut layers, logging) = file_layers(&config.logs_dir, Local::now())?;
    layers.insert(0, console);

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| HarnessError::Logging {
            message: e.to_string(),
        })?;

    tracing::info!(
        target: "demoqa_harness::logging",
        execution_log = %logging.execution_log.display(),
        "Logging initialised"
    );
    Ok(logging)
}
