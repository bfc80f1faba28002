//! Step definitions.
//!
//! A [`StepRegistry`] maps anchored regular expressions to step functions.
//! Keywords are ignored when matching: `And`/`But` steps match the same
//! patterns as `Given`/`When`/`Then`. The first pattern that matches wins.
//!
//! Step functions receive the scenario's [`World`] and the captured
//! arguments, and return a boxed future so that they can be stored as plain
//! function pointers.

pub mod bookstore;
pub mod checkbox;
pub mod common;
pub mod dynamic_properties;
pub mod forms;

use crate::api::{ApiResponse, BookStoreClient, BooksPayload};
use crate::config::HarnessConfig;
use crate::driver::Driver;
use crate::feature::{DataTable, StepSpec};
use crate::pages::{
    BasePage, BookStorePage, CheckboxPage, DynamicPropertiesPage, HomePage, PracticeFormPage,
    UiBook,
};
use crate::result::{HarnessError, HarnessResult};
use futures::future::LocalBoxFuture;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Future returned by a step function
pub type StepFuture<'a> = LocalBoxFuture<'a, HarnessResult<()>>;

/// A step implementation
pub type StepFn = for<'a> fn(&'a mut World, StepArgs) -> StepFuture<'a>;

// =============================================================================
// ARGUMENTS
// =============================================================================

/// Values a step receives from its text and attachments
#[derive(Debug, Clone, Default)]
pub struct StepArgs {
    captures: Vec<String>,
    table: Option<DataTable>,
}

impl StepArgs {
    /// Arguments from captured groups and an optional table
    #[must_use]
    pub fn new(captures: Vec<String>, table: Option<DataTable>) -> Self {
        Self { captures, table }
    }

    /// Captured group `index` (0-based)
    ///
    /// # Errors
    ///
    /// Returns a config error if the pattern has fewer groups.
    pub fn get(&self, index: usize) -> HarnessResult<&str> {
        self.captures
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| HarnessError::config(format!("step has no argument {index}")))
    }

    /// Captured group `index`, parsed
    ///
    /// # Errors
    ///
    /// Returns a config error if the group is missing or does not parse.
    pub fn parse<T>(&self, index: usize) -> HarnessResult<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.get(index)?;
        raw.trim()
            .parse()
            .map_err(|e| HarnessError::config(format!("invalid step argument '{raw}': {e}")))
    }

    /// The attached data table
    ///
    /// # Errors
    ///
    /// Returns a config error if the step has no table.
    pub fn table(&self) -> HarnessResult<&DataTable> {
        self.table
            .as_ref()
            .ok_or_else(|| HarnessError::config("step requires a data table"))
    }
}

// =============================================================================
// WORLD
// =============================================================================

/// Per-scenario state shared by the steps
///
/// Borrows nothing: it holds a handle to the live session and builds page
/// objects on demand. It never starts or stops the session.
pub struct World {
    driver: Arc<dyn Driver>,
    config: Arc<HarnessConfig>,
    /// Reference API client, created by the first API step
    pub api_client: Option<BookStoreClient>,
    /// Last API response
    pub api_response: Option<ApiResponse<BooksPayload>>,
    /// Books read from the UI table
    pub ui_books: Vec<UiBook>,
    /// Tree nodes selected by this scenario, in order
    pub selected_nodes: Vec<String>,
    /// Last value typed into the mobile field
    pub attempted_mobile: Option<String>,
    /// "Color Change" text colour before waiting
    pub initial_color: Option<String>,
    /// "Color Change" background colour before waiting
    pub initial_background: Option<String>,
    /// The practice form was used in this scenario
    pub form_visited: bool,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("api_client", &self.api_client.is_some())
            .field("api_response", &self.api_response.as_ref().map(|r| r.status))
            .field("ui_books", &self.ui_books.len())
            .field("selected_nodes", &self.selected_nodes)
            .field("attempted_mobile", &self.attempted_mobile)
            .field("initial_color", &self.initial_color)
            .field("form_visited", &self.form_visited)
            .finish_non_exhaustive()
    }
}

impl World {
    /// Fresh state over a live session
    #[must_use]
    pub fn new(driver: Arc<dyn Driver>, config: Arc<HarnessConfig>) -> Self {
        Self {
            driver,
            config,
            api_client: None,
            api_response: None,
            ui_books: Vec::new(),
            selected_nodes: Vec::new(),
            attempted_mobile: None,
            initial_color: None,
            initial_background: None,
            form_visited: false,
        }
    }

    /// The live session
    #[must_use]
    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    /// Harness configuration
    #[must_use]
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Shared page behaviour
    #[must_use]
    pub fn base(&self) -> BasePage<'_> {
        BasePage::new(self.driver.as_ref(), &self.config)
    }

    /// Landing page and sidebar
    #[must_use]
    pub fn home(&self) -> HomePage<'_> {
        HomePage::new(self.base())
    }

    /// Check Box page
    #[must_use]
    pub fn checkbox(&self) -> CheckboxPage<'_> {
        CheckboxPage::new(self.base())
    }

    /// Book Store page
    #[must_use]
    pub fn book_store(&self) -> BookStorePage<'_> {
        BookStorePage::new(self.base())
    }

    /// Practice Form page
    #[must_use]
    pub fn practice_form(&self) -> PracticeFormPage<'_> {
        PracticeFormPage::new(self.base())
    }

    /// Dynamic Properties page
    #[must_use]
    pub fn dynamic_properties(&self) -> DynamicPropertiesPage<'_> {
        DynamicPropertiesPage::new(self.base())
    }

    /// The API client, created on first use
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn api_client(&mut self) -> HarnessResult<&BookStoreClient> {
        let client = match self.api_client.take() {
            Some(client) => client,
            None => BookStoreClient::from_config(&self.config)?,
        };
        Ok(self.api_client.insert(client))
    }

    /// The last API response
    ///
    /// # Errors
    ///
    /// Returns an assertion error if no request was sent in this scenario.
    pub fn api_response(&self) -> HarnessResult<&ApiResponse<BooksPayload>> {
        self.api_response
            .as_ref()
            .ok_or_else(|| HarnessError::assertion("No API data received - no request was sent"))
    }
}

// =============================================================================
// REGISTRY
// =============================================================================

/// One registered step
#[derive(Clone)]
pub struct StepDefinition {
    pattern: Regex,
    run: StepFn,
}

impl StepDefinition {
    /// The anchored pattern
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StepDefinition").field(&self.pattern.as_str()).finish()
    }
}

/// Step text to implementation lookup
#[derive(Debug, Clone, Default)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
}

impl StepRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every DemoQA step library
    ///
    /// # Errors
    ///
    /// Returns a config error if a pattern does not compile.
    pub fn standard() -> HarnessResult<Self> {
        let mut registry = Self::new();
        common::register(&mut registry)?;
        bookstore::register(&mut registry)?;
        checkbox::register(&mut registry)?;
        forms::register(&mut registry)?;
        dynamic_properties::register(&mut registry)?;
        debug!(steps = registry.len(), "Step registry built");
        Ok(registry)
    }

    /// Register `run` for text matching `pattern` (anchored at both ends)
    ///
    /// # Errors
    ///
    /// Returns a config error if the pattern does not compile.
    pub fn register(&mut self, pattern: &str, run: StepFn) -> HarnessResult<()> {
        let pattern = Regex::new(&format!("^{pattern}$"))
            .map_err(|e| HarnessError::config(format!("invalid step pattern '{pattern}': {e}")))?;
        self.steps.push(StepDefinition { pattern, run });
        Ok(())
    }

    /// Number of registered steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// First definition matching `text`, with its captured groups
    #[must_use]
    pub fn find(&self, text: &str) -> Option<(&StepDefinition, Vec<String>)> {
        let text = text.trim();
        self.steps.iter().find_map(|step| {
            let captures = step.pattern.captures(text)?;
            let args = captures
                .iter()
                .skip(1)
                .map(|group| group.map_or_else(String::new, |m| m.as_str().to_string()))
                .collect();
            Some((step, args))
        })
    }

    /// Whether some definition matches `text`
    #[must_use]
    pub fn is_defined(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Run one step against `world`
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::UndefinedStep`] if nothing matches, otherwise
    /// whatever the step returns.
    pub async fn run(&self, world: &mut World, step: &StepSpec) -> HarnessResult<()> {
        let (definition, captures) =
            self.find(&step.text).ok_or_else(|| HarnessError::UndefinedStep {
                text: step.text.clone(),
            })?;
        debug!(step = %step, pattern = definition.pattern(), "Running step");
        (definition.run)(world, StepArgs::new(captures, step.table.clone())).await
    }
}

// =============================================================================
// SHARED CHECKS
// =============================================================================

/// Wrap a non-session error from a page check as an assertion failure
pub(crate) fn as_assertion(error: HarnessError, context: &str) -> HarnessError {
    if error.is_session_failure() || error.is_assertion() {
        error
    } else {
        HarnessError::assertion(format!("{context}: {error}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    fn noop(_world: &mut World, _args: StepArgs) -> StepFuture<'_> {
        Box::pin(async { Ok(()) })
    }

    fn remember_mobile(world: &mut World, args: StepArgs) -> StepFuture<'_> {
        Box::pin(async move {
            world.attempted_mobile = Some(args.get(0)?.to_string());
            Ok(())
        })
    }

    fn world() -> World {
        World::new(Arc::new(MockDriver::demoqa()), Arc::new(HarnessConfig::fast()))
    }

    fn spec(text: &str) -> StepSpec {
        StepSpec {
            keyword: "When".into(),
            text: text.into(),
            table: None,
        }
    }

    mod registry {
        use super::*;

        #[test]
        fn test_patterns_are_anchored() {
            let mut registry = StepRegistry::new();
            registry.register(r"the user loads the page", noop).unwrap();
            assert!(registry.is_defined("the user loads the page"));
            assert!(!registry.is_defined("then the user loads the page again"));
        }

        #[test]
        fn test_first_match_wins_and_captures() {
            let mut registry = StepRegistry::new();
            registry
                .register(r#"the user enters "([^"]*)" in "Mobile" field"#, remember_mobile)
                .unwrap();
            registry
                .register(r#"the user enters "([^"]*)" in "([^"]+)" field"#, noop)
                .unwrap();

            let (definition, args) =
                registry.find(r#"the user enters "12345" in "Mobile" field"#).unwrap();
            assert!(definition.pattern().contains("Mobile"));
            assert_eq!(args, vec!["12345"]);

            let (_, args) =
                registry.find(r#"the user enters "John" in "First Name" field"#).unwrap();
            assert_eq!(args, vec!["John", "First Name"]);
        }

        #[test]
        fn test_invalid_pattern() {
            let mut registry = StepRegistry::new();
            assert!(matches!(
                registry.register(r"broken (", noop),
                Err(HarnessError::Config { .. })
            ));
        }

        #[test]
        fn test_standard_registry_compiles() {
            let registry = StepRegistry::standard().unwrap();
            assert!(registry.len() > 40);
            assert!(registry.is_defined("the user has launched the DEMOQA application"));
            assert!(registry.is_defined("the user clicks on the expand all (+) button"));
        }

        #[tokio::test]
        async fn test_run_passes_arguments() {
            let mut registry = StepRegistry::new();
            registry
                .register(r#"the user types "(\d+)" as mobile"#, remember_mobile)
                .unwrap();
            let mut world = world();
            registry.run(&mut world, &spec(r#"the user types "98765" as mobile"#)).await.unwrap();
            assert_eq!(world.attempted_mobile.as_deref(), Some("98765"));
        }

        #[tokio::test]
        async fn test_undefined_step() {
            let registry = StepRegistry::new();
            let mut world = world();
            let err = registry.run(&mut world, &spec("nobody wrote this")).await.unwrap_err();
            assert!(matches!(
                err,
                HarnessError::UndefinedStep { text } if text == "nobody wrote this"
            ));
        }
    }

    mod args {
        use super::*;

        #[test]
        fn test_parse_and_missing() {
            let args = StepArgs::new(vec!["200".into(), "ten".into()], None);
            assert_eq!(args.parse::<u16>(0).unwrap(), 200);
            assert!(args.parse::<u16>(1).is_err());
            assert!(args.get(2).is_err());
            assert!(args.table().is_err());
        }
    }

    mod world {
        use super::*;

        #[test]
        fn test_api_client_created_once() {
            let mut world = world();
            assert!(world.api_client.is_none());
            let base = world.api_client().unwrap().base_url().to_string();
            assert_eq!(base, world.config().api_base_url);
            assert!(world.api_client.is_some());
            assert!(world.api_response().is_err());
        }
    }
}
