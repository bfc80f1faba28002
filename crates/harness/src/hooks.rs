//! Run and scenario lifecycle.
//!
//! The [`Orchestrator`] owns the single browser session of a run. It starts
//! it at run start, checks it is still answering before every scenario and
//! replaces it if not, buckets results, captures failure screenshots and
//! tears the session down at run end.

use crate::config::HarnessConfig;
use crate::driver::Driver;
use crate::feature::ScenarioSpec;
use crate::reporter::{RunResults, RunSummary, ScenarioRecord, ScenarioStatus};
use crate::result::{HarnessError, HarnessResult};
use crate::screenshot::ScreenshotHandler;
use crate::session::SessionFactory;
use crate::steps::World;
use chrono::Local;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Screenshot suffix for failed scenarios
pub const FAILED_SUFFIX: &str = "FAILED";

/// Lifecycle hooks around a run
#[derive(Debug)]
pub struct Orchestrator {
    config: Arc<HarnessConfig>,
    factory: Arc<dyn SessionFactory>,
    driver: Option<Arc<dyn Driver>>,
    screenshots: ScreenshotHandler,
    results: RunResults,
    run_started: Option<Instant>,
    scenario_started: Option<Instant>,
    summary_path: Option<PathBuf>,
}

impl Orchestrator {
    /// Hooks over `factory`; nothing is started yet
    #[must_use]
    pub fn new(config: Arc<HarnessConfig>, factory: Arc<dyn SessionFactory>) -> Self {
        let screenshots = ScreenshotHandler::new(
            config.screenshots_dir.clone(),
            config.take_screenshots && config.screenshot_on_failure,
        );
        Self {
            config,
            factory,
            driver: None,
            screenshots,
            results: RunResults::new(),
            run_started: None,
            scenario_started: None,
            summary_path: None,
        }
    }

    /// Harness configuration
    #[must_use]
    pub fn config(&self) -> &Arc<HarnessConfig> {
        &self.config
    }

    /// The live session, if one has been started
    #[must_use]
    pub fn driver(&self) -> Option<&Arc<dyn Driver>> {
        self.driver.as_ref()
    }

    /// Results recorded so far
    #[must_use]
    pub const fn results(&self) -> &RunResults {
        &self.results
    }

    /// Where `run_end` wrote the JSON summary
    #[must_use]
    pub fn summary_path(&self) -> Option<&PathBuf> {
        self.summary_path.as_ref()
    }

    // =========================================================================
    // RUN
    // =========================================================================

    /// Prepare output directories and start the session
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or the browser
    /// does not start.
    pub async fn run_start(&mut self) -> HarnessResult<()> {
        self.run_started = Some(Instant::now());
        self.config.ensure_directories()?;
        info!(
            browser = %self.config.browser,
            headless = self.config.headless,
            base_url = %self.config.base_url,
            explicit_wait_secs = self.config.explicit_wait.as_secs(),
            "Test execution started"
        );
        let driver = self.factory.create().await.map_err(|e| {
            error!(error = %e, "Failed to start browser session");
            e
        })?;
        self.driver = Some(driver);
        info!("Browser session started");
        Ok(())
    }

    /// Summarise, persist the summary and stop the session
    ///
    /// A summary that cannot be written is logged; the run result stands.
    pub async fn run_end(&mut self) -> RunSummary {
        let elapsed = self.run_started.map_or(Duration::ZERO, |t| t.elapsed());
        let summary = RunSummary::new(&self.results, elapsed, Local::now());
        summary.log();
        match summary.write_json(&self.config.reports_dir) {
            Ok(path) => {
                info!(path = %path.display(), "Summary written");
                self.summary_path = Some(path);
            }
            Err(e) => error!(error = %e, "Failed to write summary"),
        }
        if let Some(driver) = self.driver.take() {
            teardown(driver.as_ref()).await;
        }
        summary
    }

    // =========================================================================
    // SCENARIO
    // =========================================================================

    /// Make sure the session answers and hand out a fresh [`World`]
    ///
    /// # Errors
    ///
    /// Returns an error if a replacement session cannot be started.
    pub async fn before_scenario(&mut self, scenario: &ScenarioSpec) -> HarnessResult<World> {
        self.scenario_started = Some(Instant::now());
        info!(
            id = scenario.tc_id(),
            scenario = %scenario.name,
            feature = %scenario.feature,
            tags = ?scenario.tags,
            "Scenario started"
        );

        let driver = match self.driver.take() {
            Some(driver) => match driver.current_url().await {
                Ok(url) => {
                    debug!(url = %url, "Browser session is alive");
                    driver
                }
                Err(e) => {
                    warn!(error = %e, "Browser session invalid, recreating");
                    teardown(driver.as_ref()).await;
                    self.recreate().await?
                }
            },
            None => {
                warn!("No browser session, starting one");
                self.recreate().await?
            }
        };
        self.driver = Some(Arc::clone(&driver));
        Ok(World::new(driver, Arc::clone(&self.config)))
    }

    async fn recreate(&self) -> HarnessResult<Arc<dyn Driver>> {
        let driver = self.factory.create().await.map_err(|e| {
            error!(error = %e, "Failed to recreate browser session");
            e
        })?;
        info!("Browser session recreated successfully");
        Ok(driver)
    }

    /// Record the outcome, capture evidence and clean up scenario state
    ///
    /// Never fails: screenshot and cleanup problems are logged.
    pub async fn after_scenario(
        &mut self,
        scenario: &ScenarioSpec,
        world: Option<World>,
        status: ScenarioStatus,
        message: Option<String>,
    ) -> ScenarioRecord {
        let duration = self
            .scenario_started
            .take()
            .map_or(Duration::ZERO, |t| t.elapsed());
        let tc_id = scenario.tc_id();

        let mut record = ScenarioRecord::new(&scenario.name, duration);
        if let Some(message) = message {
            record = record.with_message(message);
        }
        match status {
            ScenarioStatus::Passed => {
                info!(id = tc_id, duration_secs = record.duration, "Scenario passed");
            }
            ScenarioStatus::Skipped => info!(id = tc_id, "Scenario skipped"),
            ScenarioStatus::Failed | ScenarioStatus::Error => error!(
                id = tc_id,
                status = %status,
                duration_secs = record.duration,
                message = record.message.as_deref().unwrap_or_default(),
                "Scenario did not pass"
            ),
        }

        if status.is_unsuccessful() {
            self.capture_failure(tc_id).await;
        }
        if let Some(world) = world {
            cleanup(world).await;
        }

        self.results.record(status, record.clone());
        record
    }

    /// Record a scenario that is not run
    pub fn skip_scenario(&mut self, scenario: &ScenarioSpec) -> ScenarioRecord {
        info!(id = scenario.tc_id(), scenario = %scenario.name, "Scenario skipped");
        let record = ScenarioRecord::new(&scenario.name, Duration::ZERO);
        self.results.record(ScenarioStatus::Skipped, record.clone());
        record
    }

    async fn capture_failure(&self, tc_id: &str) {
        let Some(driver) = self.driver.as_ref() else {
            return;
        };
        let name = format!("{tc_id}_{FAILED_SUFFIX}");
        match self.screenshots.capture(driver.as_ref(), &name, None).await {
            Ok(Some(path)) => info!(path = %path.display(), "Failure screenshot captured"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Could not capture failure screenshot"),
        }
    }
}

/// Best-effort scenario cleanup
async fn cleanup(mut world: World) {
    if world.form_visited {
        world.practice_form().close_success_modal().await;
    }
    if let Some(client) = world.api_client.take() {
        client.close();
    }
    debug!("Scenario state cleaned up");
}

/// Close the session, killing the browser if it does not close cleanly
async fn teardown(driver: &dyn Driver) {
    match driver.close().await {
        Ok(()) => info!("Browser session closed"),
        Err(e) => {
            warn!(error = %e, "Browser did not close cleanly, forcing");
            if let Err(e) = driver.force_close().await {
                error!(error = %e, "Failed to force-close browser");
            }
        }
    }
}

/// Status for a scenario whose step raised `error`
///
/// Anything a step raises fails the scenario. Only a step with no definition
/// is an error; setup failures are bucketed by the runner.
#[must_use]
pub const fn status_for(error: &HarnessError) -> ScenarioStatus {
    match error {
        HarnessError::UndefinedStep { .. } => ScenarioStatus::Error,
        _ => ScenarioStatus::Failed,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use crate::session::FnSessionFactory;
    use std::sync::Mutex;

    /// Factory handing out fresh mocks and keeping them for inspection
    fn tracked_factory() -> (Arc<dyn SessionFactory>, Arc<Mutex<Vec<Arc<MockDriver>>>>) {
        let created: Arc<Mutex<Vec<Arc<MockDriver>>>> = Arc::default();
        let sink = Arc::clone(&created);
        let factory = FnSessionFactory::new(move || {
            let driver = Arc::new(MockDriver::demoqa());
            sink.lock().unwrap().push(Arc::clone(&driver));
            Ok(driver as Arc<dyn Driver>)
        });
        (Arc::new(factory), created)
    }

    fn config(root: &std::path::Path) -> Arc<HarnessConfig> {
        let mut config = HarnessConfig::fast().with_output_root(root);
        config.take_screenshots = true;
        Arc::new(config)
    }

    fn scenario(name: &str) -> ScenarioSpec {
        ScenarioSpec {
            feature: "Feature".into(),
            name: name.into(),
            tags: Vec::new(),
            steps: Vec::new(),
            path: PathBuf::from("f.feature"),
            line: 3,
        }
    }

    mod status {
        use super::*;

        #[test]
        fn test_assertion_is_failure() {
            assert_eq!(status_for(&HarnessError::assertion("x")), ScenarioStatus::Failed);
            assert_eq!(
                status_for(&HarnessError::UndefinedStep { text: "x".into() }),
                ScenarioStatus::Error
            );
        }

        #[test]
        fn test_action_errors_are_failures() {
            let timeout = HarnessError::Timeout {
                ms: 500,
                waited_for: "visibility of css=div.card h5".into(),
                last_error: None,
            };
            assert_eq!(status_for(&timeout), ScenarioStatus::Failed);
            let exhausted = HarnessError::RetriesExhausted {
                operation: "click".into(),
                attempts: 3,
                source: Box::new(HarnessError::driver("intercepted")),
            };
            assert_eq!(status_for(&exhausted), ScenarioStatus::Failed);
            assert_eq!(status_for(&HarnessError::driver("gone")), ScenarioStatus::Failed);
        }
    }

    mod lifecycle {
        use super::*;

        #[tokio::test]
        async fn test_session_reused_while_alive() {
            let tmp = tempfile::tempdir().unwrap();
            let (factory, created) = tracked_factory();
            let mut hooks = Orchestrator::new(config(tmp.path()), factory);

            hooks.run_start().await.unwrap();
            for name in ["TC_01 - One", "TC_02 - Two"] {
                let spec = scenario(name);
                let world = hooks.before_scenario(&spec).await.unwrap();
                hooks
                    .after_scenario(&spec, Some(world), ScenarioStatus::Passed, None)
                    .await;
            }
            assert_eq!(created.lock().unwrap().len(), 1);
            assert_eq!(hooks.results().passed.len(), 2);
            assert_eq!(hooks.results().passed[1].id, "TC_02");
        }

        #[tokio::test]
        async fn test_dead_session_recreated() {
            let tmp = tempfile::tempdir().unwrap();
            let (factory, created) = tracked_factory();
            let mut hooks = Orchestrator::new(config(tmp.path()), factory);
            hooks.run_start().await.unwrap();

            created.lock().unwrap()[0].crash();
            let spec = scenario("TC_03 - After crash");
            let world = hooks.before_scenario(&spec).await.unwrap();
            assert_eq!(world.driver().current_url().await.unwrap(), "about:blank");

            let drivers = created.lock().unwrap().clone();
            assert_eq!(drivers.len(), 2);
            assert!(drivers[0].was_called("force_close"));
            assert!(drivers[1].is_alive());
        }

        #[tokio::test]
        async fn test_failure_screenshot_and_summary() {
            let tmp = tempfile::tempdir().unwrap();
            let (factory, created) = tracked_factory();
            let config = config(tmp.path());
            let mut hooks = Orchestrator::new(Arc::clone(&config), factory);
            hooks.run_start().await.unwrap();

            let spec = scenario("TC_04 - Broken");
            let world = hooks.before_scenario(&spec).await.unwrap();
            let record = hooks
                .after_scenario(
                    &spec,
                    Some(world),
                    ScenarioStatus::Failed,
                    Some("expected 8 books".into()),
                )
                .await;
            assert_eq!(record.message.as_deref(), Some("expected 8 books"));

            let shots: Vec<_> = std::fs::read_dir(&config.screenshots_dir)
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect();
            assert_eq!(shots.len(), 1);
            assert!(shots[0].starts_with("TC_04_FAILED_"));

            hooks.skip_scenario(&scenario("TC_05 - Later"));
            let summary = hooks.run_end().await;
            assert_eq!(summary.total, 2);
            assert_eq!(summary.failed, 1);
            assert_eq!(summary.skipped, 1);
            assert!(hooks.summary_path().unwrap().exists());
            assert!(!created.lock().unwrap()[0].is_alive());
            assert!(hooks.driver().is_none());
        }

        #[tokio::test]
        async fn test_launch_failure_propagates() {
            let tmp = tempfile::tempdir().unwrap();
            let factory = FnSessionFactory::new(|| {
                Err(HarnessError::BrowserLaunch {
                    message: "chrome not found".into(),
                })
            });
            let mut hooks = Orchestrator::new(config(tmp.path()), Arc::new(factory));
            assert!(matches!(
                hooks.run_start().await,
                Err(HarnessError::BrowserLaunch { .. })
            ));
        }
    }
}
