//! Harness configuration.
//!
//! Settings come from environment variables with fixed defaults and are
//! loaded once per process. The binary applies command-line overrides on
//! top of [`HarnessConfig::from_env`] and hands the result to every
//! component explicitly.

use crate::result::{HarnessError, HarnessResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Default UI root
pub const DEFAULT_BASE_URL: &str = "https://demoqa.com";

/// Default reference API root
pub const DEFAULT_API_BASE_URL: &str = "https://demoqa.com/BookStore/v1";

/// Default explicit wait (seconds)
pub const DEFAULT_EXPLICIT_WAIT_SECS: u64 = 15;

/// Default document-ready timeout (seconds)
pub const DEFAULT_PAGE_LOAD_TIMEOUT_SECS: u64 = 60;

/// Default extra attempts for click and navigation
pub const DEFAULT_MAX_RETRIES: u32 = 2;

// =============================================================================
// BROWSER KIND
// =============================================================================

/// Browser family to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Google Chrome
    Chrome,
    /// Chromium
    Chromium,
}

impl FromStr for BrowserKind {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "chromium" => Ok(Self::Chromium),
            "firefox" => Err(HarnessError::config(
                "BROWSER=firefox is not supported: the driver speaks the Chrome DevTools protocol",
            )),
            other => Err(HarnessError::config(format!("unknown browser '{other}'"))),
        }
    }
}

impl std::fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chrome => write!(f, "chrome"),
            Self::Chromium => write!(f, "chromium"),
        }
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Effective harness configuration
#[derive(Debug, Clone, Serialize)]
pub struct HarnessConfig {
    /// Browser family
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Browser window size
    pub window_size: (u32, u32),
    /// Browser executable (None = auto-detect)
    pub chrome_path: Option<PathBuf>,
    /// Default timeout for wait primitives
    pub explicit_wait: Duration,
    /// Timeout for document-ready after navigation
    pub page_load_timeout: Duration,
    /// Polling interval for waits
    pub poll_interval: Duration,
    /// UI root
    pub base_url: String,
    /// Reference API root
    pub api_base_url: String,
    /// Console log level
    pub log_level: String,
    /// Master screenshot switch
    pub take_screenshots: bool,
    /// Capture a screenshot when a scenario fails
    pub screenshot_on_failure: bool,
    /// Extra attempts for click and navigation
    pub max_retries: u32,
    /// Pause between navigation attempts
    pub retry_delay: Duration,
    /// Pause between click attempts
    pub click_retry_delay: Duration,
    /// Pause after a tree mutation before trusting rendered state
    pub settle_delay: Duration,
    /// Pause after navigation and other mutating steps
    pub action_delay: Duration,
    /// Report output directory
    pub reports_dir: PathBuf,
    /// Log output directory
    pub logs_dir: PathBuf,
    /// Screenshot output directory
    pub screenshots_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chrome,
            headless: false,
            window_size: (1920, 1080),
            chrome_path: None,
            explicit_wait: Duration::from_secs(DEFAULT_EXPLICIT_WAIT_SECS),
            page_load_timeout: Duration::from_secs(DEFAULT_PAGE_LOAD_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(250),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            log_level: "INFO".to_string(),
            take_screenshots: true,
            screenshot_on_failure: true,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_secs(2),
            click_retry_delay: Duration::from_secs(1),
            settle_delay: Duration::from_millis(500),
            action_delay: Duration::from_millis(1000),
            reports_dir: PathBuf::from("reports"),
            logs_dir: PathBuf::from("logs"),
            screenshots_dir: PathBuf::from("reports/screenshots"),
        }
    }
}

impl HarnessConfig {
    /// Load configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if a variable holds an invalid value.
    pub fn from_env() -> HarnessResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Config`] if a variable holds an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> HarnessResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(v) = get("BROWSER") {
            config.browser = v.parse()?;
        }
        if let Some(v) = get("HEADLESS") {
            config.headless = parse_bool("HEADLESS", &v)?;
        }
        if let Some(v) = get("WINDOW_SIZE") {
            config.window_size = parse_window_size(&v)?;
        }
        if let Some(v) = get("CHROME_PATH") {
            config.chrome_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("EXPLICIT_WAIT") {
            config.explicit_wait = Duration::from_secs(parse_num("EXPLICIT_WAIT", &v)?);
        }
        if let Some(v) = get("PAGE_LOAD_TIMEOUT") {
            config.page_load_timeout = Duration::from_secs(parse_num("PAGE_LOAD_TIMEOUT", &v)?);
        }
        if let Some(v) = get("POLL_INTERVAL_MS") {
            config.poll_interval = Duration::from_millis(parse_num("POLL_INTERVAL_MS", &v)?);
        }
        if let Some(v) = get("BASE_URL") {
            config.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("API_BASE_URL") {
            config.api_base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = get("LOG_LEVEL") {
            config.log_level = v.to_ascii_uppercase();
        }
        if let Some(v) = get("TAKE_SCREENSHOTS") {
            config.take_screenshots = parse_bool("TAKE_SCREENSHOTS", &v)?;
        }
        if let Some(v) = get("SCREENSHOT_ON_FAILURE") {
            config.screenshot_on_failure = parse_bool("SCREENSHOT_ON_FAILURE", &v)?;
        }
        if let Some(v) = get("MAX_RETRIES") {
            config.max_retries = parse_num("MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("RETRY_DELAY") {
            config.retry_delay = Duration::from_secs(parse_num("RETRY_DELAY", &v)?);
        }
        if let Some(v) = get("CLICK_RETRY_DELAY") {
            config.click_retry_delay = Duration::from_secs(parse_num("CLICK_RETRY_DELAY", &v)?);
        }
        if let Some(v) = get("SETTLE_DELAY_MS") {
            config.settle_delay = Duration::from_millis(parse_num("SETTLE_DELAY_MS", &v)?);
        }
        if let Some(v) = get("ACTION_DELAY_MS") {
            config.action_delay = Duration::from_millis(parse_num("ACTION_DELAY_MS", &v)?);
        }
        if let Some(v) = get("REPORTS_DIR") {
            config.reports_dir = PathBuf::from(v);
            config.screenshots_dir = config.reports_dir.join("screenshots");
        }
        if let Some(v) = get("LOGS_DIR") {
            config.logs_dir = PathBuf::from(v);
        }
        if let Some(v) = get("SCREENSHOTS_DIR") {
            config.screenshots_dir = PathBuf::from(v);
        }

        Ok(config)
    }

    /// Configuration with every delay shortened, for in-memory runs
    #[must_use]
    pub fn fast() -> Self {
        Self {
            explicit_wait: Duration::from_millis(500),
            page_load_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(5),
            retry_delay: Duration::from_millis(5),
            click_retry_delay: Duration::from_millis(5),
            settle_delay: Duration::from_millis(1),
            action_delay: Duration::from_millis(1),
            take_screenshots: false,
            ..Self::default()
        }
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set the UI root
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the reference API root
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Redirect every output directory below `root`
    #[must_use]
    pub fn with_output_root(mut self, root: &Path) -> Self {
        self.reports_dir = root.join("reports");
        self.logs_dir = root.join("logs");
        self.screenshots_dir = root.join("reports").join("screenshots");
        self
    }

    /// Create the report, log and screenshot directories
    ///
    /// # Errors
    ///
    /// Returns an I/O error if a directory cannot be created.
    pub fn ensure_directories(&self) -> HarnessResult<()> {
        for dir in [&self.reports_dir, &self.logs_dir, &self.screenshots_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Absolute URL for a path below the UI root
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn parse_bool(key: &str, value: &str) -> HarnessResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(HarnessError::config(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}

fn parse_num<T: FromStr>(key: &str, value: &str) -> HarnessResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| HarnessError::config(format!("{key} must be a number, got '{value}'")))
}

fn parse_window_size(value: &str) -> HarnessResult<(u32, u32)> {
    let (w, h) = value
        .split_once([',', 'x'])
        .ok_or_else(|| {
            HarnessError::config(format!("WINDOW_SIZE must be WIDTH,HEIGHT, got '{value}'"))
        })?;
    Ok((parse_num("WINDOW_SIZE", w)?, parse_num("WINDOW_SIZE", h)?))
}
