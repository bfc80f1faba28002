//! Landing page and the section sidebar.

use super::base::{BasePage, PageObject};
use super::locators::home;
use crate::locator::Locator;
use crate::result::HarnessResult;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long a card or menu entry may take to render
const MENU_TIMEOUT: Duration = Duration::from_secs(10);

/// Sidebar entries per section, in display order
pub const SECTIONS: &[(&str, &[&str])] = &[
    (
        "Elements",
        &[
            "Text Box",
            "Check Box",
            "Radio Button",
            "Web Tables",
            "Buttons",
            "Links",
            "Broken Links - Images",
            "Upload and Download",
            "Dynamic Properties",
        ],
    ),
    ("Forms", &["Practice Form"]),
    (
        "Book Store Application",
        &["Login", "Book Store", "Profile", "Book Store API"],
    ),
];

/// Known entries of a section, empty for an unknown one
#[must_use]
pub fn known_items(section: &str) -> &'static [&'static str] {
    match SECTIONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(section.trim()))
    {
        Some(&(_, items)) => items,
        None => &[],
    }
}

/// Locator for a sidebar entry
///
/// `Broken Links - Images` is labelled inconsistently across site versions
/// and is matched by its prefix.
#[must_use]
pub fn menu_locator(item: &str) -> Locator {
    match item {
        "Broken Links - Images" => home::menu_item_containing("Broken Links"),
        other => home::menu_item(other),
    }
}

/// DemoQA landing page
#[derive(Debug, Clone, Copy)]
pub struct HomePage<'d> {
    base: BasePage<'d>,
}

impl PageObject for HomePage<'_> {
    fn url_path(&self) -> &'static str {
        ""
    }

    fn base(&self) -> &BasePage<'_> {
        &self.base
    }
}

impl<'d> HomePage<'d> {
    /// Bind to a session
    #[must_use]
    pub const fn new(base: BasePage<'d>) -> Self {
        Self { base }
    }

    /// Load the landing page
    ///
    /// # Errors
    ///
    /// Returns an error if navigation fails after retries.
    pub async fn open(&self) -> HarnessResult<()> {
        self.base.navigate_to(&self.url()).await
    }

    /// Click a category card (`Elements`, `Forms`, `Book Store Application`, ...)
    ///
    /// # Errors
    ///
    /// Returns an error if the card does not render or the click fails.
    pub async fn click_card(&self, name: &str) -> HarnessResult<()> {
        let card = home::card(name);
        self.base.wait_for_visible(&card, Some(MENU_TIMEOUT)).await?;
        self.base.click_element(&card).await?;
        info!(card = name, "Clicked card");
        Ok(())
    }

    /// Entries of `section` currently shown in the sidebar
    ///
    /// Waits for the section's first entry, then reports every known entry
    /// that is visible. A collapsed or unknown section yields nothing.
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn menu_items(&self, section: &str) -> HarnessResult<Vec<String>> {
        let known = known_items(section);
        let Some(first) = known.first() else {
            warn!(section, "No menu entries known for section");
            return Ok(Vec::new());
        };
        if !self.base.is_visible(&menu_locator(first)).await? {
            debug!(section, "Section menu not shown");
            return Ok(Vec::new());
        }

        let mut items = Vec::with_capacity(known.len());
        for item in known {
            if self.base.is_visible_now(&menu_locator(item)).await? {
                items.push((*item).to_string());
            }
        }
        info!(section, items = ?items, "Found menu items");
        Ok(items)
    }

    /// Whether the sidebar shows any entry of `section`
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn is_menu_expanded(&self, section: &str) -> HarnessResult<bool> {
        let expanded = !self.menu_items(section).await?.is_empty();
        info!(section, expanded, "Menu expansion");
        Ok(expanded)
    }

    /// Click a sidebar entry by label
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not shown or the click fails.
    pub async fn navigate_to_menu_item(&self, item: &str) -> HarnessResult<()> {
        let locator = menu_locator(item);
        self.base.wait_for_visible(&locator, Some(MENU_TIMEOUT)).await?;
        self.base.click_element(&locator).await?;
        info!(item, "Navigated to menu item");
        Ok(())
    }

    /// Click `section` in the sidebar under `category`
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is not shown or the click fails.
    pub async fn navigate_to_section(&self, category: &str, section: &str) -> HarnessResult<()> {
        let locator = menu_locator(section);
        self.base.wait_for_visible(&locator, Some(MENU_TIMEOUT)).await?;
        self.base.click_element(&locator).await?;
        info!(category, section, "Navigated to section");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::driver::Driver;
    use crate::mock::MockDriver;

    async fn landing(driver: &MockDriver, config: &HarnessConfig) {
        HomePage::new(BasePage::new(driver, config)).open().await.unwrap();
    }

    #[test]
    fn test_known_items() {
        assert_eq!(known_items("Elements").len(), 9);
        assert_eq!(known_items("forms"), &["Practice Form"]);
        assert!(known_items("Widgets").is_empty());
    }

    #[test]
    fn test_broken_links_matched_by_prefix() {
        assert!(menu_locator("Broken Links - Images").to_string().contains("text*="));
        assert!(menu_locator("Links").to_string().contains("text="));
    }

    #[tokio::test]
    async fn test_url_is_site_root() {
        let driver = MockDriver::demoqa();
        let config = HarnessConfig::fast();
        let page = HomePage::new(BasePage::new(&driver, &config));
        assert_eq!(page.url(), "https://demoqa.com/");
        assert_eq!(page.page_name(), "HomePage");
    }

    #[tokio::test]
    async fn test_elements_card_opens_section() {
        let driver = MockDriver::demoqa();
        let config = HarnessConfig::fast();
        landing(&driver, &config).await;
        let page = HomePage::new(BasePage::new(&driver, &config));

        page.click_card("Elements").await.unwrap();

        assert!(driver.current_url().await.unwrap().ends_with("/elements"));
        assert!(page.is_menu_expanded("Elements").await.unwrap());
        assert_eq!(page.menu_items("Elements").await.unwrap(), known_items("Elements"));
    }

    #[tokio::test]
    async fn test_other_sections_stay_collapsed() {
        let driver = MockDriver::demoqa();
        let config = HarnessConfig::fast();
        landing(&driver, &config).await;
        let page = HomePage::new(BasePage::new(&driver, &config));

        page.click_card("Forms").await.unwrap();

        assert!(page.is_menu_expanded("Forms").await.unwrap());
        assert!(!page.is_menu_expanded("Elements").await.unwrap());
        assert!(page.menu_items("Widgets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_book_store_card_and_menu() {
        let driver = MockDriver::demoqa();
        let config = HarnessConfig::fast();
        landing(&driver, &config).await;
        let page = HomePage::new(BasePage::new(&driver, &config));

        page.click_card("Book Store Application").await.unwrap();

        assert!(driver.current_url().await.unwrap().contains("/books"));
        assert_eq!(
            page.menu_items("Book Store Application").await.unwrap(),
            vec!["Login", "Book Store", "Profile", "Book Store API"]
        );
    }

    #[tokio::test]
    async fn test_navigate_to_menu_item() {
        let driver = MockDriver::demoqa();
        let config = HarnessConfig::fast();
        landing(&driver, &config).await;
        let page = HomePage::new(BasePage::new(&driver, &config));

        page.click_card("Elements").await.unwrap();
        page.navigate_to_section("Elements", "Check Box").await.unwrap();
        assert!(driver.current_url().await.unwrap().ends_with("/checkbox"));

        page.navigate_to_menu_item("Dynamic Properties").await.unwrap();
        assert!(driver.current_url().await.unwrap().ends_with("/dynamic-properties"));
    }

    #[tokio::test]
    async fn test_missing_card_fails() {
        let driver = MockDriver::demoqa();
        let config = HarnessConfig::fast();
        landing(&driver, &config).await;
        let page = HomePage::new(BasePage::new(&driver, &config));
        assert!(page.click_card("Nonexistent").await.is_err());
    }
}
