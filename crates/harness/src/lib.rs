//! DemoQA harness: behaviour-driven UI tests for the DemoQA web application
//!
//! Gherkin feature files are bound to step definitions that drive the site
//! through page objects. A [`Driver`] trait separates the page layer from
//! the browser: [`ChromiumDriver`] speaks CDP through chromiumoxide, and
//! [`MockDriver`] serves an in-memory DOM of the site for tests.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      DemoQA harness                               │
//! ├───────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────────┐    │
//! │  │ .feature │──►│  Runner  │──►│  Steps   │──►│ Page objects │    │
//! │  │  files   │   │ + hooks  │   │ (World)  │   │  + Waiter    │    │
//! │  └──────────┘   └────┬─────┘   └────┬─────┘   └──────┬───────┘    │
//! │                      │              │                │            │
//! │                 ┌────▼─────┐   ┌────▼─────┐   ┌──────▼───────┐    │
//! │                 │ Reporter │   │ BookStore│   │    Driver    │    │
//! │                 │ + shots  │   │ API      │   │ CDP / mock   │    │
//! │                 └──────────┘   └──────────┘   └──────────────┘    │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use demoqa_harness::{load_features, HarnessConfig, Orchestrator, Runner, StepRegistry};
//! use demoqa_harness::session::ChromiumSessionFactory;
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn run() -> demoqa_harness::HarnessResult<()> {
//! let config = Arc::new(HarnessConfig::from_env()?);
//! let factory = Arc::new(ChromiumSessionFactory::new(Arc::clone(&config)));
//! let mut hooks = Orchestrator::new(config, factory);
//!
//! let features = load_features(&[PathBuf::from("features")])?;
//! let runner = Runner::new(StepRegistry::standard()?);
//! let summary = runner.run(&mut hooks, &features, |_, _| {}).await?;
//! assert!(summary.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

/// Reference Book Store REST client
pub mod api;

/// Chromium driver over CDP
#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc)]
pub mod browser;

/// Environment-driven configuration
pub mod config;

/// Browser driver seam
pub mod driver;

/// Feature file loading and scenario selection
pub mod feature;

/// Run and scenario lifecycle hooks
pub mod hooks;

/// Element locators
pub mod locator;

/// Console and file logging setup
pub mod logging;

/// In-memory driver serving a DemoQA look-alike
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod mock;

/// Page objects
pub mod pages;

/// Scenario outcomes and run summary
pub mod reporter;

/// Error types
pub mod result;

/// Retry with fixed delay
pub mod retry;

/// Scenario runner
pub mod runner;

/// Screenshot capture
pub mod screenshot;

/// Browser session factories
pub mod session;

/// Step definitions and the per-scenario world
pub mod steps;

/// Checkbox tree inspection
pub mod tree;

/// Explicit waits
pub mod wait;

pub use api::{ApiResponse, Book, BookStoreClient};
#[cfg(feature = "browser")]
pub use browser::ChromiumDriver;
pub use config::{BrowserKind, HarnessConfig};
pub use driver::{Driver, ElementRef, Key, Screenshot};
pub use feature::{
    discover, load_feature, load_features, parse_feature, DataTable, FeatureFile, ScenarioFilter,
    ScenarioSpec, StepSpec,
};
pub use hooks::Orchestrator;
pub use locator::Locator;
pub use mock::MockDriver;
pub use reporter::{RunSummary, ScenarioRecord, ScenarioStatus};
pub use result::{HarnessError, HarnessResult};
pub use runner::{Runner, UndefinedStep};
pub use screenshot::ScreenshotHandler;
pub use session::{FnSessionFactory, SessionFactory};
pub use steps::{StepRegistry, World};
pub use tree::{CheckState, TreeInspector};
pub use wait::{WaitOptions, Waiter};
