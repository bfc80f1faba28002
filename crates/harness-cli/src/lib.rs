//! demoqa CLI library
//!
//! Command-line front end for the DemoQA harness: runs, lists and
//! configures feature scenarios.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    BrowserArgs, Cli, ColorArg, Commands, ConfigArgs, ListArgs, RunArgs, SelectionArgs,
};
pub use config::{apply_overrides, harness_config, CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::ProgressReporter;
pub use runner::{execute, Outcome};
