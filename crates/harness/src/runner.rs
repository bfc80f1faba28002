//! Sequential scenario runner.

use crate::feature::{FeatureFile, ScenarioFilter, ScenarioSpec, StepSpec};
use crate::hooks::{status_for, Orchestrator};
use crate::reporter::{RunSummary, ScenarioRecord, ScenarioStatus};
use crate::result::HarnessResult;
use crate::steps::StepRegistry;
use tracing::{error, info, warn};

/// A step no definition matches
#[derive(Debug, Clone, Copy)]
pub struct UndefinedStep<'f> {
    /// Scenario containing the step
    pub scenario: &'f ScenarioSpec,
    /// The step
    pub step: &'f StepSpec,
}

/// Runs scenarios one at a time through the hooks
#[derive(Debug)]
pub struct Runner {
    registry: StepRegistry,
    filter: ScenarioFilter,
    fail_fast: bool,
}

impl Runner {
    /// Runner over `registry`, selecting every scenario
    #[must_use]
    pub fn new(registry: StepRegistry) -> Self {
        Self {
            registry,
            filter: ScenarioFilter::new(),
            fail_fast: false,
        }
    }

    /// Restrict the scenarios that run
    #[must_use]
    pub fn with_filter(mut self, filter: ScenarioFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Stop after the first scenario that does not pass
    #[must_use]
    pub const fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Step definitions
    #[must_use]
    pub const fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    /// Scenarios the filter selects, in file order
    #[must_use]
    pub fn select<'f>(&self, features: &'f [FeatureFile]) -> Vec<&'f ScenarioSpec> {
        self.filter.select(features)
    }

    /// Steps of the selected scenarios that no definition matches
    #[must_use]
    pub fn undefined_steps<'f>(&self, features: &'f [FeatureFile]) -> Vec<UndefinedStep<'f>> {
        self.select(features)
            .into_iter()
            .flat_map(|scenario| {
                scenario
                    .steps
                    .iter()
                    .filter(|step| !self.registry.is_defined(&step.text))
                    .map(move |step| UndefinedStep { scenario, step })
            })
            .collect()
    }

    /// Run one scenario: hooks around its steps, stopping at the first failure
    pub async fn run_scenario(
        &self,
        hooks: &mut Orchestrator,
        scenario: &ScenarioSpec,
    ) -> (ScenarioStatus, ScenarioRecord) {
        if scenario.is_skipped() {
            return (ScenarioStatus::Skipped, hooks.skip_scenario(scenario));
        }

        let mut world = match hooks.before_scenario(scenario).await {
            Ok(world) => world,
            Err(e) => {
                error!(id = scenario.tc_id(), error = %e, "Scenario setup failed");
                let record = hooks
                    .after_scenario(scenario, None, ScenarioStatus::Error, Some(e.to_string()))
                    .await;
                return (ScenarioStatus::Error, record);
            }
        };

        let mut status = ScenarioStatus::Passed;
        let mut message = None;
        for (index, step) in scenario.steps.iter().enumerate() {
            match self.registry.run(&mut world, step).await {
                Ok(()) => info!(target: "demoqa_harness::steps", step = %step, "Step passed"),
                Err(e) => {
                    status = status_for(&e);
                    error!(
                        target: "demoqa_harness::steps",
                        step = %step,
                        line = scenario.line,
                        status = %status,
                        transient = e.is_transient(),
                        error = %e,
                        "Step did not pass"
                    );
                    for skipped in &scenario.steps[index + 1..] {
                        warn!(target: "demoqa_harness::steps", step = %skipped, "Step skipped");
                    }
                    message = Some(format!("{step}: {e}"));
                    break;
                }
            }
        }

        let record = hooks.after_scenario(scenario, Some(world), status, message).await;
        (status, record)
    }

    /// Run every selected scenario and summarise
    ///
    /// `progress` is called after each scenario.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be started at run start.
    pub async fn run(
        &self,
        hooks: &mut Orchestrator,
        features: &[FeatureFile],
        mut progress: impl FnMut(&ScenarioSpec, ScenarioStatus),
    ) -> HarnessResult<RunSummary> {
        let scenarios = self.select(features);
        info!(scenarios = scenarios.len(), features = features.len(), "Running scenarios");

        hooks.run_start().await?;
        for scenario in scenarios {
            let (status, _) = self.run_scenario(hooks, scenario).await;
            progress(scenario, status);
            if self.fail_fast && status.is_unsuccessful() {
                warn!(id = scenario.tc_id(), "Stopping after first unsuccessful scenario");
                break;
            }
        }
        Ok(hooks.run_end().await)
    }
}
