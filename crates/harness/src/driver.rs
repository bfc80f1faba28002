//! Driver - abstract browser automation seam.
//!
//! Page objects, the tree inspector and the wait primitives only ever talk
//! to a [`Driver`]. Two implementations exist:
//!
//! - `ChromiumDriver` (feature `browser`) drives Chrome over CDP
//! - [`MockDriver`](crate::mock::MockDriver) runs against an in-memory DOM
//!
//! Element handles are opaque [`ElementRef`]s. A handle whose element left the
//! document yields [`HarnessError::StaleElement`](crate::HarnessError::StaleElement).

use crate::locator::Locator;
use crate::result::HarnessResult;
use async_trait::async_trait;
use std::fmt;
use std::time::SystemTime;

/// Opaque handle to a located element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    /// Wrap a driver-specific element id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Driver-specific id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Keys that can be pressed on a focused element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Enter / Return
    Enter,
    /// Tab
    Tab,
    /// Escape
    Escape,
    /// Select the element's whole content (Ctrl+A)
    SelectAll,
}

impl Key {
    /// DevTools key name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Enter => "Enter",
            Self::Tab => "Tab",
            Self::Escape => "Escape",
            Self::SelectAll => "a",
        }
    }
}

/// First eight bytes of every PNG file
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Screenshot data with metadata
#[derive(Debug, Clone)]
pub struct Screenshot {
    /// Raw PNG data
    pub data: Vec<u8>,
    /// Timestamp when screenshot was taken
    pub timestamp: SystemTime,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            timestamp: SystemTime::now(),
        }
    }

    /// Get the size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check that the payload carries a PNG signature
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.data.starts_with(PNG_SIGNATURE)
    }
}

/// Abstract driver trait for browser automation
///
/// Every method takes `&self`; implementations keep their session state
/// behind interior synchronisation so one driver can be shared by reference
/// across the page objects of a scenario.
#[async_trait]
pub trait Driver: Send + Sync + fmt::Debug {
    /// Navigate to URL
    async fn navigate(&self, url: &str) -> HarnessResult<()>;

    /// Get current URL
    async fn current_url(&self) -> HarnessResult<String>;

    /// `document.readyState` of the current page
    async fn ready_state(&self) -> HarnessResult<String>;

    /// Reload page
    async fn refresh(&self) -> HarnessResult<()>;

    /// All elements matching `locator`, in document order
    async fn find_all(&self, locator: &Locator) -> HarnessResult<Vec<ElementRef>>;

    /// Elements matching `locator` below `scope`
    async fn find_within(
        &self,
        scope: &ElementRef,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementRef>>;

    /// Parent element, `None` at the document root
    async fn parent(&self, element: &ElementRef) -> HarnessResult<Option<ElementRef>>;

    /// Direct child elements
    async fn children(&self, element: &ElementRef) -> HarnessResult<Vec<ElementRef>>;

    /// Lower-case tag name
    async fn tag_name(&self, element: &ElementRef) -> HarnessResult<String>;

    /// Rendered text
    async fn text(&self, element: &ElementRef) -> HarnessResult<String>;

    /// Attribute value
    async fn attribute(&self, element: &ElementRef, name: &str) -> HarnessResult<Option<String>>;

    /// DOM property value (e.g. `indeterminate`, `value`)
    async fn property(&self, element: &ElementRef, name: &str)
        -> HarnessResult<serde_json::Value>;

    /// Computed style value
    async fn css_value(&self, element: &ElementRef, name: &str) -> HarnessResult<String>;

    /// Element is rendered and not hidden
    async fn is_displayed(&self, element: &ElementRef) -> HarnessResult<bool>;

    /// Element is not disabled
    async fn is_enabled(&self, element: &ElementRef) -> HarnessResult<bool>;

    /// Checkbox/radio is checked or option is selected
    async fn is_selected(&self, element: &ElementRef) -> HarnessResult<bool>;

    /// Element fails HTML constraint validation (`:invalid`)
    async fn is_invalid(&self, element: &ElementRef) -> HarnessResult<bool>;

    /// Scroll element to the centre of the viewport
    async fn scroll_into_view(&self, element: &ElementRef) -> HarnessResult<()>;

    /// Native click at the element's centre
    ///
    /// Fails with `ClickIntercepted` if another element would receive the click.
    async fn click(&self, element: &ElementRef) -> HarnessResult<()>;

    /// Programmatic `element.click()`
    async fn js_click(&self, element: &ElementRef) -> HarnessResult<()>;

    /// Clear an input's value
    async fn clear(&self, element: &ElementRef) -> HarnessResult<()>;

    /// Type text into an element
    async fn send_keys(&self, element: &ElementRef, text: &str) -> HarnessResult<()>;

    /// Press a key on an element
    async fn press_key(&self, element: &ElementRef, key: Key) -> HarnessResult<()>;

    /// Remove elements by id; missing ids are ignored
    async fn remove_elements(&self, ids: &[&str]) -> HarnessResult<()>;

    /// Execute JavaScript in page context
    async fn execute_script(&self, script: &str) -> HarnessResult<serde_json::Value>;

    /// Take screenshot
    async fn screenshot(&self) -> HarnessResult<Screenshot>;

    /// Close the browser gracefully
    async fn close(&self) -> HarnessResult<()>;

    /// Kill the browser process
    async fn force_close(&self) -> HarnessResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_element_ref() {
        let el = ElementRef::new("17");
        assert_eq!(el.id(), "17");
        assert_eq!(el.to_string(), "element#17");
    }

    #[test]
    fn test_key_names() {
        assert_eq!(Key::Enter.name(), "Enter");
        assert_eq!(Key::SelectAll.name(), "a");
    }

    #[test]
    fn test_screenshot_validity() {
        assert!(Screenshot::new(PNG_SIGNATURE.to_vec()).is_valid());
        assert!(!Screenshot::new(vec![0x89, 0x50]).is_valid());
        assert!(!Screenshot::new(vec![]).is_valid());
        assert_eq!(Screenshot::new(vec![0; 2048]).size_bytes(), 2048);
    }
}
