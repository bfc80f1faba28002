//! Book Store page: the react-table book list and its search box.

use super::base::{BasePage, PageObject};
use super::locators::book_store::{
    AUTHOR_CELL, FIRST_TITLE, IMAGE_CELL, NO_DATA, PUBLISHER_CELL, ROWS, SEARCH_INPUT, TABLE,
    TITLE_CELL,
};
use crate::driver::{Driver, ElementRef};
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use crate::wait::pause;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// One populated table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiBook {
    /// Title cell text
    pub title: String,
    /// Author cell text
    pub author: String,
    /// Publisher cell text
    pub publisher: String,
    /// Cover image `src`, if the row has an image
    pub image: Option<String>,
}

impl UiBook {
    /// Cell value by table column heading, case-insensitive
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name.trim().to_ascii_lowercase().as_str() {
            "title" => Some(&self.title),
            "author" => Some(&self.author),
            "publisher" => Some(&self.publisher),
            "image" => self.image.as_deref(),
            _ => None,
        }
    }
}

/// Whether an image `src` points at a real cover
#[must_use]
pub fn is_valid_image_src(src: Option<&str>) -> bool {
    src.map(str::trim)
        .is_some_and(|s| !s.is_empty() && !s.ends_with("undefined"))
}

/// Book Store page
#[derive(Debug, Clone, Copy)]
pub struct BookStorePage<'d> {
    base: BasePage<'d>,
}

impl PageObject for BookStorePage<'_> {
    fn url_path(&self) -> &'static str {
        "books"
    }

    fn base(&self) -> &BasePage<'_> {
        &self.base
    }
}

impl<'d> BookStorePage<'d> {
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

    /// Wait until the table holds data
    ///
    /// The table renders empty rows first and fills them once the catalogue
    /// arrives, so this waits for the container, then a visible row, then a
    /// non-empty first title (or the "No rows found" placeholder), and then
    /// pauses for the action delay.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Timeout`] if any stage does not complete.
    pub async fn wait_for_table(&self) -> HarnessResult<()> {
        let driver = self.base.driver();
        let waiter = self.base.waiter();
        let result = async {
            waiter.wait_for_present(&TABLE).await?;
            debug!("Book table is present");
            waiter.wait_for_visible(&ROWS).await?;
            debug!("Book rows are visible");
            waiter
                .wait_until("first book title to be filled", || async move {
                    if let Some(cell) = driver.find_all(&FIRST_TITLE).await?.first() {
                        if !driver.text(cell).await?.trim().is_empty() {
                            return Ok(true);
                        }
                    }
                    for placeholder in driver.find_all(&NO_DATA).await? {
                        if driver.is_displayed(&placeholder).await? {
                            return Ok(true);
                        }
                    }
                    Ok::<_, HarnessError>(false)
                })
                .await
        }
        .await;
        result.map_err(|e| {
            error!(error = %e, "Book table did not load");
            e
        })?;

        info!("Book table loaded");
        pause(self.base.config().action_delay).await;
        Ok(())
    }

    /// Every populated row, in display order
    ///
    /// Padding rows with an empty title are skipped. A table that never
    /// loads yields no books.
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn books(&self) -> HarnessResult<Vec<UiBook>> {
        match self.wait_for_table().await {
            Ok(()) => {}
            Err(e) if e.is_session_failure() => return Err(e),
            Err(e) => {
                info!(error = %e, "Book table did not load, assuming no results");
                return Ok(Vec::new());
            }
        }

        let driver = self.base.driver();
        let mut books = Vec::new();
        for row in self.base.find_all(&ROWS).await? {
            match read_row(driver, &row).await {
                Ok(Some(book)) => books.push(book),
                Ok(None) => {}
                Err(e) if e.is_session_failure() => return Err(e),
                Err(e) => warn!(error = %e, "Could not read book row"),
            }
        }
        info!(count = books.len(), "Retrieved books from page");
        Ok(books)
    }

    /// Number of populated rows
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn book_count(&self) -> HarnessResult<usize> {
        Ok(self.books().await?.len())
    }

    /// Row whose title matches, ignoring case and surrounding whitespace
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn book_by_title(&self, title: &str) -> HarnessResult<Option<UiBook>> {
        let wanted = title.trim().to_lowercase();
        let found = self
            .books()
            .await?
            .into_iter()
            .find(|b| b.title.trim().to_lowercase() == wanted);
        match &found {
            Some(_) => info!(title, "Found book"),
            None => warn!(title, "Book not found"),
        }
        Ok(found)
    }

    /// Type `text` into the search box
    ///
    /// Uses the first visible, enabled search input and pauses for the
    /// filter to apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the table never loads or no search input is usable.
    pub async fn search(&self, text: &str) -> HarnessResult<()> {
        self.wait_for_table().await?;
        let driver = self.base.driver();
        let result = async {
            let input = self.base.waiter().wait_for_clickable(&SEARCH_INPUT).await?;
            driver.clear(&input).await?;
            driver.send_keys(&input, text).await
        }
        .await;
        result.map_err(|e| {
            error!(query = text, error = %e, "Search failed");
            e
        })?;
        pause(self.base.config().action_delay).await;
        info!(query = text, "Searched for book");
        Ok(())
    }

    /// Whether the "No rows found" placeholder is shown
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn is_no_data_shown(&self) -> HarnessResult<bool> {
        self.base.is_visible_now(&NO_DATA).await
    }

    /// Whether the row titled `title` shows a real cover image
    ///
    /// # Errors
    ///
    /// Returns an error if the table never loads.
    pub async fn is_book_image_displayed(&self, title: &str) -> HarnessResult<bool> {
        self.wait_for_table().await?;
        let driver = self.base.driver();
        let wanted = title.trim().to_lowercase();

        for row in self.base.find_all(&ROWS).await? {
            let Some(cell) = first_within(driver, &row, &TITLE_CELL).await? else {
                continue;
            };
            if driver.text(&cell).await?.trim().to_lowercase() != wanted {
                continue;
            }
            let Some(image) = first_within(driver, &row, &IMAGE_CELL).await? else {
                warn!(title, "Book row has no image");
                return Ok(false);
            };
            let displayed = driver.is_displayed(&image).await?;
            let src = driver.attribute(&image, "src").await?;
            let valid = displayed && is_valid_image_src(src.as_deref());
            if valid {
                info!(title, src = src.as_deref().unwrap_or_default(), "Book image displayed");
            } else {
                warn!(title, displayed, src = ?src, "Book image not properly displayed");
            }
            return Ok(valid);
        }

        warn!(title, "Book not found while checking image");
        Ok(false)
    }
}

async fn first_within(
    driver: &dyn Driver,
    scope: &ElementRef,
    locator: &Locator,
) -> HarnessResult<Option<ElementRef>> {
    Ok(driver.find_within(scope, locator).await?.into_iter().next())
}

async fn cell_text(
    driver: &dyn Driver,
    row: &ElementRef,
    locator: &Locator,
) -> HarnessResult<String> {
    match first_within(driver, row, locator).await? {
        Some(cell) => Ok(driver.text(&cell).await?.trim().to_string()),
        None => Err(HarnessError::ElementNotFound {
            locator: locator.to_string(),
        }),
    }
}

async fn read_row(driver: &dyn Driver, row: &ElementRef) -> HarnessResult<Option<UiBook>> {
    let title = cell_text(driver, row, &TITLE_CELL).await?;
    if title.is_empty() {
        return Ok(None);
    }
    let image = match first_within(driver, row, &IMAGE_CELL).await? {
        Some(img) => driver.attribute(&img, "src").await?,
        None => None,
    };
    Ok(Some(UiBook {
        title,
        author: cell_text(driver, row, &AUTHOR_CELL).await?,
        publisher: cell_text(driver, row, &PUBLISHER_CELL).await?,
        image,
    }))
}
