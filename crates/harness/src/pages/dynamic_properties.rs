//! Dynamic Properties page: buttons that change a few seconds after load.

use super::base::{BasePage, PageObject};
use super::locators::dynamic_properties::{COLOR_CHANGE, ENABLE_AFTER, VISIBLE_AFTER};
use crate::result::{HarnessError, HarnessResult};
use crate::wait::{WaitOptions, Waiter};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Interval between colour reads
pub const COLOR_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Dynamic Properties page
#[derive(Debug, Clone, Copy)]
pub struct DynamicPropertiesPage<'d> {
    base: BasePage<'d>,
}

impl PageObject for DynamicPropertiesPage<'_> {
    fn url_path(&self) -> &'static str {
        "dynamic-properties"
    }

    fn base(&self) -> &BasePage<'_> {
        &self.base
    }
}

impl<'d> DynamicPropertiesPage<'d> {
    /// Bind to a session
    #[must_use]
    pub const fn new(base: BasePage<'d>) -> Self {
        Self { base }
    }

    /// Load the page
    ///
    /// # Errors
    ///
    /// Returns an error if navigation fails after retries.
    pub async fn open(&self) -> HarnessResult<()> {
        self.base.navigate_to(&self.url()).await
    }

    /// Whether "Visible After 5 Seconds" is shown right now
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn is_visible_after_button_visible(&self) -> HarnessResult<bool> {
        let visible = self.base.is_visible_now(&VISIBLE_AFTER).await?;
        debug!(visible, "Visible-after button");
        Ok(visible)
    }

    /// Wait for "Visible After 5 Seconds" to appear
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn wait_for_visible_after_button(&self, timeout: Duration) -> HarnessResult<bool> {
        let appeared = self.base.is_visible_within(&VISIBLE_AFTER, timeout).await?;
        if appeared {
            info!(timeout_ms = timeout.as_millis() as u64, "Visible-after button appeared");
        } else {
            warn!(timeout_ms = timeout.as_millis() as u64, "Visible-after button did not appear");
        }
        Ok(appeared)
    }

    /// Whether "Will enable 5 seconds" is enabled
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn is_enable_after_button_enabled(&self) -> HarnessResult<bool> {
        self.base.is_enabled(&ENABLE_AFTER).await
    }

    /// Text colour of "Color Change"
    ///
    /// # Errors
    ///
    /// Returns an error if the button is not present.
    pub async fn color_change_button_color(&self) -> HarnessResult<String> {
        self.base.get_css_property(&COLOR_CHANGE, "color").await
    }

    /// Background colour of "Color Change"
    ///
    /// # Errors
    ///
    /// Returns an error if the button is not present.
    pub async fn color_change_button_background(&self) -> HarnessResult<String> {
        self.base.get_css_property(&COLOR_CHANGE, "background-color").await
    }

    /// Wait for a style property of "Color Change" to leave its current value
    ///
    /// The value read on entry is the baseline. Returns the new value, or
    /// `None` if it never changed within `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the button is not present, or the session is gone.
    pub async fn wait_for_color_change(
        &self,
        property: &str,
        timeout: Duration,
    ) -> HarnessResult<Option<String>> {
        let initial = self.base.get_css_property(&COLOR_CHANGE, property).await?;
        let driver = self.base.driver();
        let waiter = Waiter::new(
            driver,
            WaitOptions::new()
                .with_timeout(timeout)
                .with_poll_interval(COLOR_POLL_INTERVAL),
        );
        let baseline = initial.as_str();
        let changed = waiter
            .poll(&format!("{property} change on {COLOR_CHANGE}"), || async move {
                let element = waiter.wait_for_present(&COLOR_CHANGE).await?;
                let current = driver.css_value(&element, property).await?;
                Ok::<_, HarnessError>((current != baseline).then_some(current))
            })
            .await;

        match changed {
            Ok(current) => {
                info!(property, from = %initial, to = %current, "Color changed");
                Ok(Some(current))
            }
            Err(e) if e.is_session_failure() => Err(e),
            Err(e) => {
                warn!(property, value = %initial, error = %e, "Color did not change");
                Ok(None)
            }
        }
    }
}
