//! Result and error types for the harness.

use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Browser could not be launched
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Browser session no longer answers
    #[error("Browser session is not responding: {message}")]
    SessionDead {
        /// Error message
        message: String,
    },

    /// Low-level driver failure
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Wait condition was not met in time
    #[error("Timed out after {ms}ms waiting for {waited_for}{}", last_error_suffix(.last_error))]
    Timeout {
        /// Human readable description of the condition
        waited_for: String,
        /// Timeout in milliseconds
        ms: u64,
        /// Last probe error seen while polling
        last_error: Option<String>,
    },

    /// No element matched a locator
    #[error("No element found for {locator}")]
    ElementNotFound {
        /// Rendered locator
        locator: String,
    },

    /// Element handle no longer attached to the document
    #[error("Stale element reference: {id}")]
    StaleElement {
        /// Element id
        id: String,
    },

    /// Element exists but cannot be interacted with
    #[error("Element {locator} is not interactable: {message}")]
    NotInteractable {
        /// Rendered locator
        locator: String,
        /// Error message
        message: String,
    },

    /// Native click landed on a different element
    #[error("Click on {locator} was intercepted by {intercepted_by}")]
    ClickIntercepted {
        /// Rendered locator or element id
        locator: String,
        /// Description of the element receiving the click
        intercepted_by: String,
    },

    /// Bounded retry ran out of attempts
    #[error("{operation} failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        /// Operation name
        operation: String,
        /// Attempts made
        attempts: u32,
        /// Last failure
        #[source]
        source: Box<HarnessError>,
    },

    /// Expected versus actual UI or API state differs
    #[error("Assertion failed: {message}")]
    Assertion {
        /// Error message
        message: String,
    },

    /// Reference API failure
    #[error("API request to {url} failed: {message}")]
    Api {
        /// Requested URL
        url: String,
        /// Error message
        message: String,
    },

    /// Screenshot error
    #[error("Screenshot failed: {message}")]
    Screenshot {
        /// Error message
        message: String,
    },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Logging could not be initialised
    #[error("Logging setup failed: {message}")]
    Logging {
        /// Error message
        message: String,
    },

    /// Feature file could not be parsed
    #[error("Failed to parse feature {path}: {message}")]
    Gherkin {
        /// Feature file path
        path: String,
        /// Error message
        message: String,
    },

    /// No step definition matches the step text
    #[error("Undefined step: {text}")]
    UndefinedStep {
        /// Step text
        text: String,
    },

    /// Operation not supported by the active driver
    #[error("Unsupported operation: {message}")]
    Unsupported {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

impl HarnessError {
    /// Create an assertion error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an unsupported-operation error
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Whether this error is an expected-vs-actual mismatch
    #[must_use]
    pub fn is_assertion(&self) -> bool {
        match self {
            Self::Assertion { .. } => true,
            Self::RetriesExhausted { source, .. } => source.is_assertion(),
            _ => false,
        }
    }

    /// Whether this error is a UI timing failure worth retrying
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. }
                | Self::ElementNotFound { .. }
                | Self::StaleElement { .. }
                | Self::NotInteractable { .. }
                | Self::ClickIntercepted { .. }
        )
    }

    /// Whether this error indicates the browser session is gone
    #[must_use]
    pub const fn is_session_failure(&self) -> bool {
        matches!(self, Self::SessionDead { .. } | Self::BrowserLaunch { .. })
    }
}

/// Fail with an assertion error unless `condition` holds
///
/// # Errors
///
/// Returns [`HarnessError::Assertion`] carrying `message()` when the condition is false.
pub fn ensure(condition: bool, message: impl FnOnce() -> String) -> HarnessResult<()> {
    if condition {
        Ok(())
    } else {
        Err(HarnessError::assertion(message()))
    }
}
