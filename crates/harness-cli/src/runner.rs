//! Command execution

use crate::commands::{Cli, Commands, ConfigArgs, ListArgs, RunArgs, SelectionArgs};
use crate::config::{harness_config, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use demoqa_harness::{load_features, FeatureFile, Runner, ScenarioFilter, StepRegistry};
use std::io::Write;

/// Outcome of a command, mapped to the process exit code by `main`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything selected passed or was skipped
    Success,
    /// At least one scenario failed or errored
    Unsuccessful,
}

/// Execute a parsed command line
///
/// # Errors
///
/// Returns an error if configuration, feature loading or session start-up
/// fails.
pub fn execute(cli: Cli) -> CliResult<Outcome> {
    let config = CliConfig::from_cli(&cli);
    match cli.command {
        Commands::Run(args) => run_command(&config, &args),
        Commands::List(args) => list_command(&config, &args),
        Commands::Config(args) => config_command(&config, &args),
    }
}

fn runner_for(selection: &SelectionArgs) -> CliResult<(Runner, Vec<FeatureFile>)> {
    let features = load_features(&selection.paths)?;
    let mut filter = ScenarioFilter::new().with_tags(selection.tags.as_slice());
    if let Some(name) = &selection.name {
        filter = filter.with_name(name.as_str());
    }
    let runner = Runner::new(StepRegistry::standard()?).with_filter(filter);
    Ok((runner, features))
}

/// `demoqa run`
#[cfg(feature = "browser")]
fn run_command(config: &CliConfig, args: &RunArgs) -> CliResult<Outcome> {
    use demoqa_harness::session::ChromiumSessionFactory;
    use demoqa_harness::Orchestrator;
    use std::sync::Arc;
    use tracing::{error, info};

    let harness = Arc::new(harness_config(&args.browser, config)?);
    let (runner, features) = runner_for(&args.selection)?;
    let runner = runner.with_fail_fast(args.stop);

    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let undefined = runner.undefined_steps(&features);
    if !undefined.is_empty() {
        reporter.undefined(&undefined);
    }

    let selected = runner.select(&features).len();
    if selected == 0 {
        reporter.warning("No scenarios selected");
        return Ok(Outcome::Success);
    }

    let _logging = demoqa_harness::logging::init(&harness)?;
    info!(
        scenarios = selected,
        browser = %harness.browser,
        headless = harness.headless,
        base_url = %harness.base_url,
        "Starting run"
    );

    let factory = Arc::new(ChromiumSessionFactory::new(Arc::clone(&harness)));
    let mut hooks = Orchestrator::new(harness, factory);

    reporter.start_progress(selected as u64, "Running scenarios");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(runner.run(&mut hooks, &features, |scenario, status| {
        reporter.scenario_done(scenario, status);
    }));
    reporter.finish();

    let summary = result.map_err(|e| {
        error!(error = %e, "Run aborted");
        CliError::test_execution(e.to_string())
    })?;
    reporter.summary(&summary);
    if let Some(path) = hooks.summary_path() {
        reporter.info(&format!("Summary written to {}", path.display()));
    }

    Ok(if summary.is_success() {
        Outcome::Success
    } else {
        Outcome::Unsuccessful
    })
}

#[cfg(not(feature = "browser"))]
fn run_command(_config: &CliConfig, _args: &RunArgs) -> CliResult<Outcome> {
    Err(CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}

/// `demoqa list`
fn list_command(config: &CliConfig, args: &ListArgs) -> CliResult<Outcome> {
    let (runner, features) = runner_for(&args.selection)?;
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());

    let mut stdout = std::io::stdout().lock();
    let selected = runner.select(&features);
    for scenario in &selected {
        let tags = if scenario.tags.is_empty() {
            String::new()
        } else {
            format!(" @{}", scenario.tags.join(" @"))
        };
        let skipped = if scenario.is_skipped() { " (skipped)" } else { "" };
        writeln!(
            stdout,
            "{}:{}  {}{tags}{skipped}",
            scenario.path.display(),
            scenario.line,
            scenario.name
        )?;
        if config.verbosity.is_verbose() {
            for step in &scenario.steps {
                writeln!(stdout, "    {step}")?;
            }
        }
    }
    writeln!(stdout, "{} scenarios in {} feature files", selected.len(), features.len())?;

    let undefined = runner.undefined_steps(&features);
    reporter.undefined(&undefined);
    Ok(if undefined.is_empty() {
        Outcome::Success
    } else {
        Outcome::Unsuccessful
    })
}

/// `demoqa config`
fn config_command(config: &CliConfig, args: &ConfigArgs) -> CliResult<Outcome> {
    let harness = harness_config(&args.browser, config)?;
    let json = serde_json::to_string_pretty(&harness)?;
    writeln!(std::io::stdout().lock(), "{json}")?;
    Ok(Outcome::Success)
}
