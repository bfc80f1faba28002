//! Book Store steps: API cross-validation and table search.

use super::{StepArgs, StepFuture, StepRegistry, World};
use crate::result::{ensure, HarnessResult};
use tracing::{error, info, warn};

/// Register the Book Store steps
///
/// # Errors
///
/// Returns a config error if a pattern does not compile.
pub fn register(registry: &mut StepRegistry) -> HarnessResult<()> {
    registry.register(r#"the user sends a GET request to endpoint "([^"]+)""#, send_get)?;
    registry.register(r"the API response should have HTTP status code (\d+)", status_code)?;
    registry.register(r#"the API response should contain a "books" array"#, books_array)?;
    registry.register(
        r"the number of books displayed on UI should match the API response count",
        count_matches,
    )?;
    registry.register(
        r"for each book, the UI data should exactly match the API response data",
        data_matches,
    )?;
    registry.register(
        r"all book images should be displayed with valid URLs from API",
        images_displayed,
    )?;
    registry.register(r"no books should be displayed in the results", no_books)?;
    registry.register(r"the search result count should be (\d+)", result_count)?;
    registry.register(
        r#"an appropriate "No rows found" message should be displayed"#,
        no_rows_message,
    )?;
    registry.register(
        r"the user waits for the book list table to be fully loaded",
        wait_for_table,
    )?;
    registry.register(
        r#"the user searches for "([^"]*)" on the Book Store page"#,
        search,
    )?;
    Ok(())
}

fn send_get(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let endpoint = args.get(0)?;
        let response = world
            .api_client()?
            .get_books_at(endpoint)
            .await
            .map_err(|e| {
                error!(endpoint, error = %e, "API request failed");
                e
            })?;
        info!(
            endpoint,
            status = response.status,
            books = response.body.books.len(),
            "API responded"
        );
        world.api_response = Some(response);
        Ok(())
    })
}

fn status_code(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected: u16 = args.parse(0)?;
        let actual = world.api_response()?.status;
        ensure(actual == expected, || {
            format!("Expected HTTP status {expected}, but got {actual}")
        })
    })
}

fn books_array(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        // An absent array deserialises as empty; an empty catalogue is still an array.
        let response = world.api_response()?;
        info!(books = response.body.books.len(), "API response has a books array");
        Ok(())
    })
}

fn count_matches(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.book_store();
        page.wait_for_table().await?;
        let ui_books = page.books().await?;
        let api_count = world.api_response()?.body.books.len();
        let ui_count = ui_books.len();
        world.ui_books = ui_books;
        ensure(ui_count == api_count, || {
            format!(
                "Book count mismatch - UI displays {ui_count} books, API returned {api_count} books"
            )
        })
    })
}

fn data_matches(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let fields = args.table()?.column("Field")?;
        let api_books = &world.api_response()?.body.books;
        let mut errors = Vec::new();

        for ui_book in &world.ui_books {
            let title = ui_book.title.trim();
            let Some(api_book) = api_books.iter().find(|b| b.title.trim() == title) else {
                errors.push(format!("Book '{title}' found in UI but not in API response"));
                continue;
            };
            for field in &fields {
                let ui_value = ui_book.field(field).unwrap_or_default().trim();
                let api_value = api_book.field(field).unwrap_or_default();
                if ui_value != api_value.trim() {
                    errors.push(format!(
                        "Field '{field}' mismatch for book '{title}': UI='{ui_value}', API='{}'",
                        api_value.trim()
                    ));
                }
            }
        }

        info!(
            books = world.ui_books.len(),
            fields = ?fields,
            errors = errors.len(),
            "Compared UI books with API"
        );
        ensure(errors.is_empty(), || {
            format!("Data validation errors:\n{}", errors.join("\n"))
        })
    })
}

fn images_displayed(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.book_store();
        let mut missing = Vec::new();
        for book in &world.api_response()?.body.books {
            if !page.is_book_image_displayed(&book.title).await? {
                missing.push(book.title.clone());
            }
        }
        ensure(missing.is_empty(), || {
            format!(
                "Images not displayed for {} books: {}",
                missing.len(),
                missing.join(", ")
            )
        })
    })
}

fn no_books(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let count = world.book_store().book_count().await?;
        ensure(count == 0, || {
            format!("Expected no books to be displayed, but found {count} books")
        })
    })
}

fn result_count(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected: usize = args.parse(0)?;
        let actual = world.book_store().book_count().await?;
        ensure(actual == expected, || {
            format!("Expected {expected} books in search results, but found {actual}")
        })
    })
}

fn no_rows_message(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.book_store();
        let count = page.book_count().await?;
        ensure(count == 0, || {
            format!("Expected 'No rows found' state with 0 books, but found {count} books")
        })?;
        if !page.is_no_data_shown().await? {
            warn!("Table is empty but the 'No rows found' placeholder is not shown");
        }
        Ok(())
    })
}

fn wait_for_table(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move { world.book_store().wait_for_table().await })
}

fn search(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let query = args.get(0)?;
        world.book_store().search(query).await
    })
}
