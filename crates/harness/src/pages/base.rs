//! Page Object Model base.
//!
//! [`BasePage`] wraps the driver with the operations every page shares:
//! navigation and clicks under a bounded [`retry`], explicit waits for
//! everything else. Failures are logged at error level before they are
//! returned.

use crate::config::HarnessConfig;
use crate::driver::{Driver, ElementRef};
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use crate::retry::{retry, RetryPolicy};
use crate::screenshot::ScreenshotHandler;
use crate::wait::{WaitOptions, Waiter};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Fixed banners that sit on top of page content and swallow clicks
pub const OVERLAY_IDS: [&str; 2] = ["fixedban", "adplus-anchor"];

/// Trait for page objects
pub trait PageObject {
    /// URL path of the page, relative to `BASE_URL`
    fn url_path(&self) -> &'static str;

    /// Shared operations bound to this page's session
    fn base(&self) -> &BasePage<'_>;

    /// Page name for logs
    fn page_name(&self) -> &'static str {
        let name = std::any::type_name::<Self>();
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::").next().unwrap_or(name)
    }

    /// Absolute URL of the page
    fn url(&self) -> String {
        self.base().config().url(self.url_path())
    }
}

/// Shared page operations over one driver session
#[derive(Debug, Clone, Copy)]
pub struct BasePage<'d> {
    driver: &'d dyn Driver,
    config: &'d HarnessConfig,
}

impl<'d> BasePage<'d> {
    /// Bind to a driver and configuration
    #[must_use]
    pub const fn new(driver: &'d dyn Driver, config: &'d HarnessConfig) -> Self {
        Self { driver, config }
    }

    /// Underlying driver
    #[must_use]
    pub const fn driver(&self) -> &'d dyn Driver {
        self.driver
    }

    /// Effective configuration
    #[must_use]
    pub const fn config(&self) -> &'d HarnessConfig {
        self.config
    }

    /// Waiter with the configured explicit wait
    #[must_use]
    pub const fn waiter(&self) -> Waiter<'d> {
        Waiter::new(self.driver, WaitOptions::from_config(self.config))
    }

    /// Waiter with an explicit timeout, or the configured one
    #[must_use]
    pub fn waiter_for(&self, timeout: Option<Duration>) -> Waiter<'d> {
        match timeout {
            Some(timeout) => self.waiter().with_timeout(timeout),
            None => self.waiter(),
        }
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Load `url` and wait for the document to be ready, retrying on failure
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::RetriesExhausted`] with the last failure once
    /// `MAX_RETRIES` extra attempts are spent.
    pub async fn navigate_to(&self, url: &str) -> HarnessResult<()> {
        let driver = self.driver;
        let ready = self.waiter().with_timeout(self.config.page_load_timeout);
        let policy =
            RetryPolicy::with_extra_attempts(self.config.max_retries, self.config.retry_delay);

        retry(&policy, "navigate", |_| async move {
            driver.navigate(url).await?;
            ready.wait_for_document_ready().await
        })
        .await
        .map_err(|e| {
            error!(url, error = %e, "Navigation failed");
            e
        })?;

        info!(url, "Navigated");
        Ok(())
    }

    /// Current page URL
    ///
    /// # Errors
    ///
    /// Returns an error if the session does not answer.
    pub async fn current_url(&self) -> HarnessResult<String> {
        self.driver.current_url().await.map_err(|e| {
            error!(error = %e, "Could not read current URL");
            e
        })
    }

    /// Reload the current page
    ///
    /// # Errors
    ///
    /// Returns an error if the reload fails.
    pub async fn refresh_page(&self) -> HarnessResult<()> {
        self.driver.refresh().await.map_err(|e| {
            error!(error = %e, "Page refresh failed");
            e
        })?;
        info!("Page refreshed");
        Ok(())
    }

    // =========================================================================
    // INTERACTION
    // =========================================================================

    /// Click the first clickable match, working around overlays
    ///
    /// Each attempt removes the known banners, waits for the element to be
    /// clickable, scrolls it into view and clicks natively. An intercepted or
    /// refused native click falls back to a programmatic click. The whole
    /// sequence is retried `MAX_RETRIES` times.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::RetriesExhausted`] with the last failure.
    pub async fn click_element(&self, locator: &Locator) -> HarnessResult<()> {
        let driver = self.driver;
        let waiter = self.waiter();
        let delay = self.config.click_retry_delay;
        let policy = RetryPolicy::with_extra_attempts(self.config.max_retries, delay);

        retry(&policy, "click", |_| async move {
            driver.remove_elements(&OVERLAY_IDS).await?;
            let element = waiter.wait_for_clickable(locator).await?;
            driver.scroll_into_view(&element).await?;
            match driver.click(&element).await {
                Err(
                    e @ (HarnessError::ClickIntercepted { .. }
                    | HarnessError::NotInteractable { .. }),
                ) => {
                    warn!(
                        locator = %locator,
                        error = %e,
                        "Native click failed, using programmatic click"
                    );
                    driver.js_click(&element).await
                }
                other => other,
            }
        })
        .await
        .map_err(|e| {
            error!(locator = %locator, error = %e, "Click failed");
            e
        })?;

        debug!(locator = %locator, "Clicked");
        Ok(())
    }

    /// Programmatic click without waiting for clickability
    ///
    /// For controls the page keeps visually hidden (radio inputs behind
    /// their labels).
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not present in time.
    pub async fn js_click(&self, locator: &Locator) -> HarnessResult<()> {
        let element = self.find_element(locator).await?;
        self.driver.js_click(&element).await.map_err(|e| {
            error!(locator = %locator, error = %e, "Programmatic click failed");
            e
        })
    }

    /// Replace the value of an input
    ///
    /// # Errors
    ///
    /// Returns an error if the element is missing or rejects input.
    pub async fn enter_text(&self, locator: &Locator, text: &str) -> HarnessResult<()> {
        let result = async {
            let element = self.waiter().wait_for_present(locator).await?;
            self.driver.clear(&element).await?;
            self.driver.send_keys(&element, text).await
        }
        .await;
        result.map_err(|e| {
            error!(locator = %locator, error = %e, "Text entry failed");
            e
        })?;
        debug!(locator = %locator, text, "Entered text");
        Ok(())
    }

    /// Scroll the first match into view
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not present in time.
    pub async fn scroll_to(&self, locator: &Locator) -> HarnessResult<()> {
        let element = self.find_element(locator).await?;
        self.driver.scroll_into_view(&element).await.map_err(|e| {
            error!(locator = %locator, error = %e, "Scroll failed");
            e
        })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// First present match, waiting up to the explicit wait
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if nothing matches in time.
    pub async fn find_element(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        self.waiter().wait_for_present(locator).await.map_err(|e| {
            error!(locator = %locator, error = %e, "Element not found");
            e
        })
    }

    /// All current matches, without waiting
    ///
    /// # Errors
    ///
    /// Returns an error if the driver query fails.
    pub async fn find_all(&self, locator: &Locator) -> HarnessResult<Vec<ElementRef>> {
        self.driver.find_all(locator).await.map_err(|e| {
            error!(locator = %locator, error = %e, "Error finding elements");
            e
        })
    }

    /// Rendered text of the first match
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not present in time.
    pub async fn get_text(&self, locator: &Locator) -> HarnessResult<String> {
        let result = async {
            let element = self.waiter().wait_for_present(locator).await?;
            self.driver.text(&element).await
        }
        .await;
        result.map_err(|e| {
            error!(locator = %locator, error = %e, "Get text failed");
            e
        })
    }

    /// Attribute of the first match
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not present in time.
    pub async fn get_attribute(
        &self,
        locator: &Locator,
        name: &str,
    ) -> HarnessResult<Option<String>> {
        let element = self.find_element(locator).await?;
        self.driver.attribute(&element, name).await.map_err(|e| {
            error!(locator = %locator, attribute = name, error = %e, "Get attribute failed");
            e
        })
    }

    /// Computed style property of the first match
    ///
    /// # Errors
    ///
    /// Returns an error if the element is not present in time.
    pub async fn get_css_property(
        &self,
        locator: &Locator,
        property: &str,
    ) -> HarnessResult<String> {
        let element = self.find_element(locator).await?;
        self.driver.css_value(&element, property).await.map_err(|e| {
            error!(locator = %locator, property, error = %e, "Get CSS property failed");
            e
        })
    }

    /// Whether a match becomes visible within the explicit wait
    ///
    /// A timeout is `false`; only session failures are errors.
    pub async fn is_visible(&self, locator: &Locator) -> HarnessResult<bool> {
        self.is_visible_within(locator, self.config.explicit_wait).await
    }

    /// Whether a match becomes visible within `timeout`
    pub async fn is_visible_within(
        &self,
        locator: &Locator,
        timeout: Duration,
    ) -> HarnessResult<bool> {
        absent_as_false(self.waiter().with_timeout(timeout).wait_for_visible(locator).await)
    }

    /// Whether a match is visible right now
    pub async fn is_visible_now(&self, locator: &Locator) -> HarnessResult<bool> {
        let probe = async {
            for element in self.driver.find_all(locator).await? {
                if self.driver.is_displayed(&element).await? {
                    return Ok(true);
                }
            }
            Ok::<_, HarnessError>(false)
        };
        match probe.await {
            Err(e) if e.is_session_failure() => Err(e),
            Err(_) => Ok(false),
            ok => ok,
        }
    }

    /// Whether a match appears within the explicit wait
    pub async fn is_present(&self, locator: &Locator) -> HarnessResult<bool> {
        absent_as_false(self.waiter().wait_for_present(locator).await)
    }

    /// Whether the first match is present and enabled
    pub async fn is_enabled(&self, locator: &Locator) -> HarnessResult<bool> {
        let probe = async {
            let element = self.waiter().wait_for_present(locator).await?;
            self.driver.is_enabled(&element).await
        };
        match probe.await {
            Err(e) if e.is_session_failure() => Err(e),
            Err(_) => Ok(false),
            ok => ok,
        }
    }

    // =========================================================================
    // WAITS
    // =========================================================================

    /// Wait for a match to be visible
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if nothing becomes visible.
    pub async fn wait_for_visible(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> HarnessResult<ElementRef> {
        self.waiter_for(timeout)
            .wait_for_visible(locator)
            .await
            .map_err(|e| {
                error!(locator = %locator, error = %e, "Element not visible");
                e
            })
    }

    /// Wait for a match to be clickable
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if nothing becomes clickable.
    pub async fn wait_for_clickable(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> HarnessResult<ElementRef> {
        self.waiter_for(timeout)
            .wait_for_clickable(locator)
            .await
            .map_err(|e| {
                error!(locator = %locator, error = %e, "Element not clickable");
                e
            })
    }

    /// Wait until no match is visible
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if a match stays visible.
    pub async fn wait_for_invisible(
        &self,
        locator: &Locator,
        timeout: Option<Duration>,
    ) -> HarnessResult<()> {
        self.waiter_for(timeout)
            .wait_for_invisible(locator)
            .await
            .map_err(|e| {
                error!(locator = %locator, error = %e, "Element still visible");
                e
            })
    }

    /// Wait for the URL to contain `fragment`
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] with the last URL seen.
    pub async fn wait_for_url_contains(
        &self,
        fragment: &str,
        timeout: Option<Duration>,
    ) -> HarnessResult<String> {
        self.waiter_for(timeout)
            .wait_for_url_contains(fragment)
            .await
            .map_err(|e| {
                error!(fragment, error = %e, "URL does not contain fragment");
                e
            })
    }

    // =========================================================================
    // SCREENSHOTS
    // =========================================================================

    /// Capture the page into `SCREENSHOTS_DIR`
    ///
    /// # Errors
    ///
    /// Returns an error if the capture or the write fails.
    pub async fn take_screenshot(&self, name: &str) -> HarnessResult<Option<PathBuf>> {
        ScreenshotHandler::from_config(self.config)
            .capture(self.driver, name, None)
            .await
    }
}

/// Timeouts and vanished elements read as `false`; session failures propagate
fn absent_as_false<T>(result: HarnessResult<T>) -> HarnessResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if e.is_session_failure() => Err(e),
        Err(_) => Ok(false),
    }
}

// =============================================================================
// TESTS
// =============================================================================
