//! CLI command definitions using clap

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// demoqa: behaviour-driven UI tests for the DemoQA web application
#[derive(Parser, Debug)]
#[command(name = "demoqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors and the final summary only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run feature scenarios against the browser
    Run(RunArgs),

    /// List the selected scenarios and report undefined steps
    List(ListArgs),

    /// Print the effective configuration as JSON
    Config(ConfigArgs),
}

/// Feature files and scenario selection
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Feature files or directories
    #[arg(default_value = "features")]
    pub paths: Vec<PathBuf>,

    /// Tag expression (`smoke`, `@smoke,api`, `~wip`)
    #[arg(short, long)]
    pub tags: Vec<String>,

    /// Only scenarios whose name contains this text
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Overrides applied on top of the environment
#[derive(Args, Debug, Clone, Default)]
pub struct BrowserArgs {
    /// Run the browser without a window
    #[arg(long, conflicts_with = "headed")]
    pub headless: bool,

    /// Run the browser with a window
    #[arg(long)]
    pub headed: bool,

    /// UI root, e.g. https://demoqa.com
    #[arg(long)]
    pub base_url: Option<String>,

    /// Browser to drive (chrome, chromium)
    #[arg(long)]
    pub browser: Option<String>,
}

impl BrowserArgs {
    /// Headless override, if one was given
    #[must_use]
    pub const fn headless_override(&self) -> Option<bool> {
        if self.headless {
            Some(true)
        } else if self.headed {
            Some(false)
        } else {
            None
        }
    }
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Scenario selection
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Configuration overrides
    #[command(flatten)]
    pub browser: BrowserArgs,

    /// Stop after the first scenario that does not pass
    #[arg(long)]
    pub stop: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Scenario selection
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Configuration overrides
    #[command(flatten)]
    pub browser: BrowserArgs,
}

/// Color argument for CLI
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}
