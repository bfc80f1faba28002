//! Wait Mechanisms
//!
//! Explicit waits over a [`Driver`]. Every primitive polls the live page
//! until its condition holds or the timeout expires; nothing is probed
//! once and trusted.
//!
//! Probe errors (stale handles, elements not yet rendered) count as "not yet"
//! and the last one is carried into the [`HarnessError::Timeout`]. A dead
//! session aborts the wait immediately.

use crate::config::HarnessConfig;
use crate::driver::{Driver, ElementRef};
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use std::cell::RefCell;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (15 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 15_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout
    pub timeout: Duration,
    /// Polling interval
    pub poll_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from `EXPLICIT_WAIT` and `POLL_INTERVAL_MS`
    #[must_use]
    pub const fn from_config(config: &HarnessConfig) -> Self {
        Self {
            timeout: config.explicit_wait,
            poll_interval: config.poll_interval,
        }
    }

    /// Set timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Polls a driver until a condition holds
#[derive(Debug, Clone, Copy)]
pub struct Waiter<'d> {
    driver: &'d dyn Driver,
    options: WaitOptions,
}

impl<'d> Waiter<'d> {
    /// Create a waiter over `driver`
    #[must_use]
    pub const fn new(driver: &'d dyn Driver, options: WaitOptions) -> Self {
        Self { driver, options }
    }

    /// Same waiter with a different timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Effective options
    #[must_use]
    pub const fn options(&self) -> WaitOptions {
        self.options
    }

    /// Poll `probe` until it yields a value
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] when the timeout expires, or the
    /// probe's error immediately if the session is gone.
    pub async fn poll<T, F, Fut>(&self, description: &str, mut probe: F) -> HarnessResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<Option<T>>>,
    {
        let start = Instant::now();
        let timeout = self.options.timeout;
        let mut last_error = None;

        loop {
            match probe().await {
                Ok(Some(value)) => {
                    trace!(
                        waited_for = description,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "Wait satisfied"
                    );
                    return Ok(value);
                }
                Ok(None) => {}
                Err(e) if e.is_session_failure() => return Err(e),
                Err(e) => last_error = Some(e.to_string()),
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                break;
            }
            let pause = self.options.poll_interval.min(timeout - elapsed);
            tokio::time::sleep(pause).await;
        }

        debug!(waited_for = description, timeout_ms = timeout.as_millis() as u64, "Wait timed out");
        Err(HarnessError::Timeout {
            waited_for: description.to_string(),
            ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            last_error,
        })
    }

    /// Wait until an async predicate returns `true`
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] when the predicate never holds.
    pub async fn wait_until<F, Fut>(&self, description: &str, mut predicate: F) -> HarnessResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = HarnessResult<bool>>,
    {
        self.poll(description, || {
            let check = predicate();
            async move { Ok(check.await?.then_some(())) }
        })
        .await
    }

    /// Wait for at least one element to exist
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if nothing matches in time.
    pub async fn wait_for_present(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let driver = self.driver;
        self.poll(&format!("presence of {locator}"), || async move {
            Ok(driver.find_all(locator).await?.into_iter().next())
        })
        .await
    }

    /// Wait for a matching element to be displayed
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if no match is displayed in time.
    pub async fn wait_for_visible(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let driver = self.driver;
        self.poll(&format!("visibility of {locator}"), || async move {
            for element in driver.find_all(locator).await? {
                if driver.is_displayed(&element).await? {
                    return Ok(Some(element));
                }
            }
            Ok(None)
        })
        .await
    }

    /// Wait for a matching element to exist, be displayed and be enabled
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if no match becomes clickable in time.
    pub async fn wait_for_clickable(&self, locator: &Locator) -> HarnessResult<ElementRef> {
        let driver = self.driver;
        self.poll(&format!("clickability of {locator}"), || async move {
            for element in driver.find_all(locator).await? {
                if driver.is_displayed(&element).await? && driver.is_enabled(&element).await? {
                    return Ok(Some(element));
                }
            }
            Ok(None)
        })
        .await
    }

    /// Wait until no matching element is displayed
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if a match stays visible.
    pub async fn wait_for_invisible(&self, locator: &Locator) -> HarnessResult<()> {
        let driver = self.driver;
        self.poll(&format!("invisibility of {locator}"), || async move {
            for element in driver.find_all(locator).await? {
                if driver.is_displayed(&element).await? {
                    return Ok(None);
                }
            }
            Ok(Some(()))
        })
        .await
    }

    /// Wait for the current URL to contain `fragment`; returns the URL
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] carrying the last URL seen.
    pub async fn wait_for_url_contains(&self, fragment: &str) -> HarnessResult<String> {
        let driver = self.driver;
        let last_url = RefCell::new(String::new());
        let seen = &last_url;
        let result = self
            .poll(&format!("URL containing {fragment:?}"), || async move {
                let url = driver.current_url().await?;
                let found = url.contains(fragment);
                seen.replace(url.clone());
                Ok(found.then_some(url))
            })
            .await;
        result.map_err(|e| match e {
            HarnessError::Timeout {
                waited_for, ms, ..
            } => HarnessError::Timeout {
                waited_for,
                ms,
                last_error: Some(format!("current URL is {}", last_url.borrow())),
            },
            other => other,
        })
    }

    /// Wait for `document.readyState == "complete"`
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if the document never completes.
    pub async fn wait_for_document_ready(&self) -> HarnessResult<()> {
        let driver = self.driver;
        self.poll("document ready state", || async move {
            Ok((driver.ready_state().await? == "complete").then_some(()))
        })
        .await
    }

    /// Wait for more than `count` matching elements; returns the count
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if the count never exceeds `count`.
    pub async fn wait_for_count_above(
        &self,
        locator: &Locator,
        count: usize,
    ) -> HarnessResult<usize> {
        let driver = self.driver;
        self.poll(&format!("more than {count} of {locator}"), || async move {
            let found = driver.find_all(locator).await?.len();
            Ok((found > count).then_some(found))
        })
        .await
    }
}

/// Wait for a fixed duration (settle delays only; prefer conditions)
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{MockDom, MockDriver, MockPage};

    fn fast() -> WaitOptions {
        WaitOptions::new()
            .with_timeout(Duration::from_millis(200))
            .with_poll_interval(Duration::from_millis(5))
    }

    fn delayed_button(after: Duration) -> MockPage {
        MockPage::new(MockDom::new()).with_timer(after, |dom| {
            let body = dom.body();
            dom.append_text(body, "button", &[("id", "late"), ("disabled", "")], "Late");
        })
    }

    mod options {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout, Duration::from_secs(15));
            assert_eq!(opts.poll_interval, Duration::from_millis(250));
        }

        #[test]
        fn test_from_config() {
            let opts = WaitOptions::from_config(&HarnessConfig::fast());
            assert_eq!(opts.timeout, Duration::from_millis(500));
        }
    }

    mod polling {
        use super::*;

        #[tokio::test]
        async fn test_poll_returns_first_value() {
            let driver = MockDriver::new();
            let waiter = Waiter::new(&driver, fast());
            let mut calls = 0;
            let value = waiter
                .poll("third call", || {
                    calls += 1;
                    let n = calls;
                    async move { Ok((n >= 3).then_some(n)) }
                })
                .await
                .unwrap();
            assert_eq!(value, 3);
        }

        #[tokio::test]
        async fn test_timeout_carries_last_error() {
            let driver = MockDriver::new();
            let waiter = Waiter::new(&driver, fast().with_timeout(Duration::from_millis(20)));
            let err = waiter
                .poll::<(), _, _>("never", || async {
                    Err(HarnessError::ElementNotFound {
                        locator: "css=#nope".to_string(),
                    })
                })
                .await
                .unwrap_err();
            match err {
                HarnessError::Timeout {
                    waited_for,
                    ms,
                    last_error,
                } => {
                    assert_eq!(waited_for, "never");
                    assert_eq!(ms, 20);
                    assert!(last_error.unwrap().contains("css=#nope"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_dead_session_aborts() {
            let driver = MockDriver::new();
            driver.crash();
            let waiter = Waiter::new(&driver, fast());
            let err = waiter.wait_for_document_ready().await.unwrap_err();
            assert!(err.is_session_failure());
        }
    }

    mod conditions {
        use super::*;

        #[tokio::test]
        async fn test_visible_then_clickable() {
            let driver = MockDriver::new();
            driver.load(delayed_button(Duration::from_millis(20)));
            let waiter = Waiter::new(&driver, fast());
            let late = Locator::id("late");

            waiter.wait_for_visible(&late).await.unwrap();
            let err = waiter
                .with_timeout(Duration::from_millis(30))
                .wait_for_clickable(&late)
                .await
                .unwrap_err();
            assert!(matches!(err, HarnessError::Timeout { .. }));

            driver.with_dom(|dom| {
                let id = dom.by_id("late").unwrap();
                dom.remove_attr(id, "disabled");
            });
            waiter.wait_for_clickable(&late).await.unwrap();
        }

        #[tokio::test]
        async fn test_invisible() {
            let driver = MockDriver::new();
            let mut dom = MockDom::new();
            let body = dom.body();
            let banner = dom.append(body, "div", &[("id", "banner")]);
            dom.set_hidden(banner, true);
            driver.load(MockPage::new(dom));

            Waiter::new(&driver, fast())
                .wait_for_invisible(&Locator::id("banner"))
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_url_contains_reports_current_url() {
            let driver = MockDriver::new();
            driver.navigate("https://demoqa.com/elements").await.unwrap();
            let waiter = Waiter::new(&driver, fast().with_timeout(Duration::from_millis(20)));

            let url = waiter.wait_for_url_contains("demoqa.com/elements").await.unwrap();
            assert_eq!(url, "https://demoqa.com/elements");

            let err = waiter.wait_for_url_contains("demoqa.com/books").await.unwrap_err();
            assert!(err.to_string().contains("current URL is https://demoqa.com/elements"));
        }

        #[tokio::test]
        async fn test_count_above() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/books").await.unwrap();
            let count = Waiter::new(&driver, fast())
                .wait_for_count_above(&Locator::css(".rt-tr-group"), 5)
                .await
                .unwrap();
            assert_eq!(count, 10);
        }

        #[tokio::test]
        async fn test_wait_until() {
            let driver = MockDriver::new();
            let waiter = Waiter::new(&driver, fast());
            let mut polls = 0;
            waiter
                .wait_until("two polls", || {
                    polls += 1;
                    let done = polls > 1;
                    async move { Ok(done) }
                })
                .await
                .unwrap();
            assert_eq!(polls, 2);
        }
    }
}
