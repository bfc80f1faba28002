//! Screenshot capture with sanitized, timestamped file names.

use crate::config::HarnessConfig;
use crate::driver::Driver;
use crate::result::{HarnessError, HarnessResult};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Longest sanitized name kept before suffix and timestamp
pub const MAX_NAME_LEN: usize = 200;

/// Name used when sanitizing leaves nothing
pub const FALLBACK_NAME: &str = "screenshot";

/// Writes PNG screenshots into one directory
#[derive(Debug, Clone)]
pub struct ScreenshotHandler {
    dir: PathBuf,
    enabled: bool,
}

impl ScreenshotHandler {
    /// Create a handler writing into `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            dir: dir.into(),
            enabled,
        }
    }

    /// Handler for `SCREENSHOTS_DIR`, enabled by `TAKE_SCREENSHOTS`
    #[must_use]
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.screenshots_dir.clone(), config.take_screenshots)
    }

    /// Output directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether captures are written at all
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Capture the current page
    ///
    /// Returns `None` when screenshots are disabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot capture or the file cannot be written.
    pub async fn capture(
        &self,
        driver: &dyn Driver,
        name: &str,
        suffix: Option<&str>,
    ) -> HarnessResult<Option<PathBuf>> {
        if !self.enabled {
            debug!(name, "Screenshots disabled, skipping capture");
            return Ok(None);
        }

        let shot = driver.screenshot().await.map_err(|e| {
            error!(name, error = %e, "Screenshot capture failed");
            e
        })?;
        if !shot.is_valid() {
            return Err(HarnessError::Screenshot {
                message: format!("driver returned {} bytes that are not a PNG", shot.size_bytes()),
            });
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let taken: DateTime<Local> = shot.timestamp.into();
        let path = self.dir.join(file_name(name, suffix, &taken));
        tokio::fs::write(&path, &shot.data).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write screenshot");
            e
        })?;

        info!(
            path = %path.display(),
            size_kb = format!("{:.2}", shot.size_bytes() as f64 / 1024.0),
            "Screenshot saved"
        );
        Ok(Some(path))
    }
}

/// Make `name` safe for every filesystem the harness runs on
///
/// Runs of `<>:"/\|?*` and whitespace become a single `_`, leading and
/// trailing `_` are dropped, and the result is capped at [`MAX_NAME_LEN`].
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_whitespace() || "<>:\"/\\|?*".contains(c) {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed: String = out.trim_matches('_').chars().take(MAX_NAME_LEN).collect();
    let trimmed = trimmed.trim_end_matches('_');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `{sanitized}[_SUFFIX]_{YYYYmmdd_HHMMSS_mmm}.png`
#[must_use]
pub fn file_name(name: &str, suffix: Option<&str>, timestamp: &DateTime<Local>) -> String {
    let mut file = sanitize_filename(name);
    if let Some(suffix) = suffix.filter(|s| !s.is_empty()) {
        file.push('_');
        file.push_str(suffix);
    }
    file.push('_');
    file.push_str(&timestamp.format("%Y%m%d_%H%M%S_%3f").to_string());
    file.push_str(".png");
    file
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;
    use chrono::TimeZone;
    use proptest::prelude::*;

    mod sanitize {
        use super::*;

        #[test]
        fn test_replaces_reserved_characters() {
            assert_eq!(sanitize_filename("TC_001 - Verify: a/b"), "TC_001_-_Verify_a_b");
        }

        #[test]
        fn test_collapses_and_trims() {
            assert_eq!(sanitize_filename("  <<hello>>  "), "hello");
            assert_eq!(sanitize_filename("a__b"), "a_b");
        }

        #[test]
        fn test_empty_falls_back() {
            assert_eq!(sanitize_filename(""), FALLBACK_NAME);
            assert_eq!(sanitize_filename("???"), FALLBACK_NAME);
        }

        #[test]
        fn test_caps_length() {
            let long = "x".repeat(500);
            assert_eq!(sanitize_filename(&long).len(), MAX_NAME_LEN);
        }

        proptest! {
            #[test]
            fn prop_output_is_safe(name in ".{0,300}") {
                let out = sanitize_filename(&name);
                prop_assert!(!out.is_empty());
                prop_assert!(out.chars().count() <= MAX_NAME_LEN);
                prop_assert!(!out.chars().any(|c| c.is_whitespace() || "<>:\"/\\|?*".contains(c)));
                prop_assert!(!out.starts_with('_') && !out.ends_with('_'));
                prop_assert!(!out.contains("__"));
            }

            #[test]
            fn prop_idempotent(name in ".{0,100}") {
                let once = sanitize_filename(&name);
                prop_assert_eq!(sanitize_filename(&once), once);
            }
        }
    }

    mod naming {
        use super::*;

        #[test]
        fn test_file_name_with_suffix() {
            let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
            assert_eq!(
                file_name("TC_002", Some("FAILED"), &ts),
                "TC_002_FAILED_20240309_140507_000.png"
            );
        }

        #[test]
        fn test_file_name_without_suffix() {
            let ts = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
            assert_eq!(file_name("home page", None, &ts), "home_page_20240309_140507_000.png");
            assert_eq!(file_name("home", Some(""), &ts), "home_20240309_140507_000.png");
        }
    }

    mod capture {
        use super::*;

        #[tokio::test]
        async fn test_capture_writes_png() {
            let dir = tempfile::tempdir().unwrap();
            let handler = ScreenshotHandler::new(dir.path().join("shots"), true);
            let driver = MockDriver::new();

            let path = handler
                .capture(&driver, "TC_001 - login", Some("FAILED"))
                .await
                .unwrap()
                .unwrap();

            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with("TC_001_-_login_FAILED_"));
            assert!(name.ends_with(".png"));
            assert!(std::fs::read(&path).unwrap().starts_with(b"\x89PNG"));
        }

        #[tokio::test]
        async fn test_disabled_handler_writes_nothing() {
            let dir = tempfile::tempdir().unwrap();
            let handler = ScreenshotHandler::new(dir.path(), false);
            let driver = MockDriver::new();
            assert!(handler.capture(&driver, "x", None).await.unwrap().is_none());
            assert!(!driver.was_called("screenshot"));
        }

        #[tokio::test]
        async fn test_invalid_payload_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let handler = ScreenshotHandler::new(dir.path(), true);
            let driver = MockDriver::new();
            driver.set_screenshot(b"not a png".to_vec());
            let err = handler.capture(&driver, "x", None).await.unwrap_err();
            assert!(matches!(err, HarnessError::Screenshot { .. }));
        }
    }
}
