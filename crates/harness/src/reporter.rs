//! Reporter - scenario outcomes and the run summary.
//!
//! Every finished scenario lands in exactly one of four buckets. At the end
//! of the run the buckets are folded into a [`RunSummary`], which is logged
//! and written to `reports/summary_{timestamp}.json`.

use crate::result::HarnessResult;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Scenario outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    /// Every step passed
    Passed,
    /// A step raised an error
    Failed,
    /// Not run (`@skip`, `@wip`)
    Skipped,
    /// Undefined step or scenario setup failure
    Error,
}

impl ScenarioStatus {
    /// Check if status is passing
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Failed or errored
    #[must_use]
    pub const fn is_unsuccessful(&self) -> bool {
        matches!(self, Self::Failed | Self::Error)
    }
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Test case id of a scenario: the part of its name before `" - "`
#[must_use]
pub fn tc_id(scenario_name: &str) -> &str {
    scenario_name
        .split_once(" - ")
        .map_or(scenario_name, |(id, _)| id)
}

/// Scenario name without its test case id
#[must_use]
pub fn short_name(scenario_name: &str) -> &str {
    scenario_name
        .split_once(" - ")
        .map_or(scenario_name, |(_, name)| name)
}

/// One finished scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    /// Test case id
    pub id: String,
    /// Full scenario name
    pub name: String,
    /// Wall-clock duration in seconds
    pub duration: f64,
    /// Failure or error message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScenarioRecord {
    /// Record for `name` taking `duration`
    #[must_use]
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        let name = name.into();
        Self {
            id: tc_id(&name).to_string(),
            name,
            duration: duration.as_secs_f64(),
            message: None,
        }
    }

    /// Attach the failure message
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Outcomes of a run, bucketed by status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunResults {
    /// Passed scenarios
    pub passed: Vec<ScenarioRecord>,
    /// Failed scenarios
    pub failed: Vec<ScenarioRecord>,
    /// Skipped scenarios
    pub skipped: Vec<ScenarioRecord>,
    /// Errored scenarios
    pub error: Vec<ScenarioRecord>,
}

impl RunResults {
    /// Empty results
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished scenario
    pub fn record(&mut self, status: ScenarioStatus, record: ScenarioRecord) {
        match status {
            ScenarioStatus::Passed => self.passed.push(record),
            ScenarioStatus::Failed => self.failed.push(record),
            ScenarioStatus::Skipped => self.skipped.push(record),
            ScenarioStatus::Error => self.error.push(record),
        }
    }

    /// Scenarios recorded so far
    #[must_use]
    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.skipped.len() + self.error.len()
    }

    /// Whether any scenario failed or errored
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty() || !self.error.is_empty()
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// End-of-run summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// When the run finished
    pub finished_at: DateTime<Local>,
    /// Scenarios run or skipped
    pub total: usize,
    /// Passed count
    pub passed: usize,
    /// Failed count
    pub failed: usize,
    /// Errored count
    pub errors: usize,
    /// Skipped count
    pub skipped: usize,
    /// Passed share of total, in percent
    pub passed_pct: f64,
    /// Failed share of total, in percent
    pub failed_pct: f64,
    /// Errored share of total, in percent
    pub error_pct: f64,
    /// Skipped share of total, in percent
    pub skipped_pct: f64,
    /// Same as `passed_pct`
    pub pass_rate: f64,
    /// Run duration in seconds
    pub duration_secs: f64,
    /// Run duration in minutes
    pub duration_mins: f64,
    /// Failed scenarios
    pub failed_scenarios: Vec<ScenarioRecord>,
    /// Errored scenarios
    pub error_scenarios: Vec<ScenarioRecord>,
}

impl RunSummary {
    /// Summarise `results` for a run that took `duration`
    #[must_use]
    pub fn new(results: &RunResults, duration: Duration, finished_at: DateTime<Local>) -> Self {
        let total = results.total();
        let duration_secs = duration.as_secs_f64();
        Self {
            finished_at,
            total,
            passed: results.passed.len(),
            failed: results.failed.len(),
            errors: results.error.len(),
            skipped: results.skipped.len(),
            passed_pct: percent(results.passed.len(), total),
            failed_pct: percent(results.failed.len(), total),
            error_pct: percent(results.error.len(), total),
            skipped_pct: percent(results.skipped.len(), total),
            pass_rate: percent(results.passed.len(), total),
            duration_secs,
            duration_mins: duration_secs / 60.0,
            failed_scenarios: results.failed.clone(),
            error_scenarios: results.error.clone(),
        }
    }

    /// Whether the run had no failed or errored scenario
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// File name of the JSON report
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("summary_{}.json", self.finished_at.format("%Y%m%d_%H%M%S"))
    }

    /// Write the summary as pretty JSON into `dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn write_json(&self, dir: &Path) -> HarnessResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        info!(target: "demoqa_harness::hooks", path = %path.display(), "Summary written");
        Ok(path)
    }

    /// Log the summary
    pub fn log(&self) {
        info!(target: "demoqa_harness::hooks", "{}", "=".repeat(80));
        info!(target: "demoqa_harness::hooks", "TEST EXECUTION SUMMARY");
        info!(target: "demoqa_harness::hooks", "Total scenarios: {}", self.total);
        info!(target: "demoqa_harness::hooks", "Passed: {} ({:.1}%)", self.passed, self.passed_pct);
        info!(target: "demoqa_harness::hooks", "Failed: {} ({:.1}%)", self.failed, self.failed_pct);
        info!(target: "demoqa_harness::hooks", "Errors: {} ({:.1}%)", self.errors, self.error_pct);
        info!(
            target: "demoqa_harness::hooks",
            "Skipped: {} ({:.1}%)",
            self.skipped,
            self.skipped_pct
        );
        info!(target: "demoqa_harness::hooks", "Pass rate: {:.2}%", self.pass_rate);
        info!(
            target: "demoqa_harness::hooks",
            "Total duration: {:.2}s ({:.2} min)",
            self.duration_secs,
            self.duration_mins
        );
        info!(target: "demoqa_harness::hooks", "{}", "=".repeat(80));

        for (heading, records) in [
            ("Failed scenarios:", &self.failed_scenarios),
            ("Scenarios with errors:", &self.error_scenarios),
        ] {
            if records.is_empty() {
                continue;
            }
            warn!(target: "demoqa_harness::hooks", "{heading}");
            for (i, record) in records.iter().enumerate() {
                warn!(
                    target: "demoqa_harness::hooks",
                    "  {}. {} - {} ({:.2}s)",
                    i + 1,
                    record.id,
                    short_name(&record.name),
                    record.duration
                );
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn results() -> RunResults {
        let mut results = RunResults::new();
        for (status, name) in [
            (ScenarioStatus::Passed, "TC_01 - Elements card"),
            (ScenarioStatus::Passed, "TC_02 - Book store"),
            (ScenarioStatus::Failed, "TC_03 - Practice form"),
            (ScenarioStatus::Skipped, "Work in progress"),
        ] {
            results.record(status, ScenarioRecord::new(name, Duration::from_millis(1500)));
        }
        results
    }

    mod ids {
        use super::*;

        #[test]
        fn test_tc_id() {
            assert_eq!(tc_id("TC_CB_01 - Expand all"), "TC_CB_01");
            assert_eq!(tc_id("Plain scenario"), "Plain scenario");
            assert_eq!(short_name("TC_CB_01 - Expand - all"), "Expand - all");
        }

        #[test]
        fn test_record_takes_id_from_name() {
            let record = ScenarioRecord::new("TC_07 - Search", Duration::from_secs(2));
            assert_eq!(record.id, "TC_07");
            assert!((record.duration - 2.0).abs() < f64::EPSILON);
            assert!(record.message.is_none());
        }
    }

    mod buckets {
        use super::*;

        #[test]
        fn test_each_scenario_lands_in_one_bucket() {
            let results = results();
            assert_eq!(results.total(), 4);
            assert_eq!(results.passed.len(), 2);
            assert_eq!(results.failed.len(), 1);
            assert_eq!(results.skipped.len(), 1);
            assert!(results.error.is_empty());
            assert!(results.has_failures());
        }

        #[test]
        fn test_status_flags() {
            assert!(ScenarioStatus::Passed.is_passed());
            assert!(ScenarioStatus::Error.is_unsuccessful());
            assert!(!ScenarioStatus::Skipped.is_unsuccessful());
            assert_eq!(ScenarioStatus::Error.to_string(), "error");
        }
    }

    mod summary {
        use super::*;

        fn finished() -> DateTime<Local> {
            Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
        }

        #[test]
        fn test_percentages_and_duration() {
            let summary = RunSummary::new(&results(), Duration::from_secs(90), finished());
            assert_eq!(summary.total, 4);
            assert!((summary.pass_rate - 50.0).abs() < 1e-9);
            assert!((summary.failed_pct - 25.0).abs() < 1e-9);
            assert!((summary.duration_mins - 1.5).abs() < 1e-9);
            assert_eq!(summary.failed_scenarios[0].id, "TC_03");
            assert!(!summary.is_success());
        }

        #[test]
        fn test_empty_run() {
            let summary = RunSummary::new(&RunResults::new(), Duration::ZERO, finished());
            assert_eq!(summary.total, 0);
            assert!(summary.pass_rate.abs() < f64::EPSILON);
            assert!(summary.is_success());
        }

        #[test]
        fn test_write_json() {
            let tmp = tempfile::tempdir().unwrap();
            let summary = RunSummary::new(&results(), Duration::from_secs(3), finished());
            let path = summary.write_json(tmp.path()).unwrap();

            assert_eq!(path.file_name().unwrap(), "summary_20240501_093000.json");
            let parsed: RunSummary =
                serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(parsed.passed, 2);
            assert_eq!(parsed.failed_scenarios.len(), 1);
        }
    }
}
