//! Output formatting and progress reporting

use console::{style, Style, Term};
use demoqa_harness::{RunSummary, ScenarioSpec, ScenarioStatus, UndefinedStep};
use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter for a run
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Record one finished scenario
    pub fn scenario_done(&self, scenario: &ScenarioSpec, status: ScenarioStatus) {
        let line = format!("{} ({})", scenario.name, scenario.path.display());
        if let Some(ref pb) = self.progress_bar {
            pb.inc(1);
            pb.set_message(scenario.tc_id().to_string());
            if status.is_unsuccessful() {
                pb.suspend(|| self.status_line(status, &line));
            }
        } else if status.is_unsuccessful() || !self.quiet {
            self.status_line(status, &line);
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn status_line(&self, status: ScenarioStatus, message: &str) {
        let prefix = match (self.use_color, status) {
            (true, ScenarioStatus::Passed) => style("✓").green().bold().to_string(),
            (true, ScenarioStatus::Failed) => style("✗").red().bold().to_string(),
            (true, ScenarioStatus::Error) => style("!").magenta().bold().to_string(),
            (true, ScenarioStatus::Skipped) => style("-").yellow().to_string(),
            (false, status) => status.to_string().to_uppercase(),
        };
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("⚠").yellow().bold().to_string()
        } else {
            "WARN".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }

        let prefix = if self.use_color {
            style("ℹ").blue().bold().to_string()
        } else {
            "INFO".to_string()
        };

        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&styled);
    }

    /// Print steps no definition matches
    pub fn undefined(&self, steps: &[UndefinedStep<'_>]) {
        for undefined in steps {
            self.warning(&format!(
                "Undefined step in {} ({}:{}): {}",
                undefined.scenario.tc_id(),
                undefined.scenario.path.display(),
                undefined.scenario.line,
                undefined.step
            ));
        }
    }

    /// Print the run summary
    pub fn summary(&self, summary: &RunSummary) {
        let unsuccessful = summary.failed + summary.errors;
        if self.quiet && unsuccessful == 0 {
            return;
        }

        let _ = self.term.write_line("");
        for record in summary.failed_scenarios.iter().chain(&summary.error_scenarios) {
            let message = record.message.as_deref().unwrap_or("no message");
            let _ = self.term.write_line(&format!("  {} {}: {message}", record.id, record.name));
        }

        let counts = format!(
            "{} passed, {} failed, {} errors, {} skipped",
            summary.passed, summary.failed, summary.errors, summary.skipped
        );
        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let status = if unsuccessful > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };
            let _ = self.term.write_line(&format!(
                "{status} {} scenarios in {:.2}s ({counts}), pass rate {:.1}%",
                summary.total, summary.duration_secs, summary.pass_rate
            ));
        } else {
            let status = if unsuccessful > 0 { "FAILED" } else { "PASSED" };
            let _ = self.term.write_line(&format!(
                "{status} {} scenarios in {:.2}s ({counts}), pass rate {:.1}%",
                summary.total, summary.duration_secs, summary.pass_rate
            ));
        }
    }
}
