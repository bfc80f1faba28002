//! Steps shared by every feature: launching, cards, sidebar navigation, URLs.

use super::{as_assertion, StepArgs, StepFuture, StepRegistry, World};
use crate::result::{ensure, HarnessResult};
use crate::wait::pause;
use std::collections::BTreeSet;
use tracing::{error, info};

/// Sidebar group whose entries are compared in display order
const ORDERED_SECTION: &str = "Book Store Application";

/// Register the shared steps
///
/// # Errors
///
/// Returns a config error if a pattern does not compile.
pub fn register(registry: &mut StepRegistry) -> HarnessResult<()> {
    registry.register(r"the user has launched the DEMOQA application", launch)?;
    registry.register(r#"the user clicks on "([^"]+)" card"#, click_card)?;
    registry.register(
        r#"the user navigates to "([^"]+)" section under "([^"]+)""#,
        navigate_to_section,
    )?;
    registry.register(
        r#"the user should be navigated to a URL containing "([^"]+)""#,
        url_contains,
    )?;
    registry.register(r#"the menu list for "([^"]+)" should be expanded"#, menu_expanded)?;
    registry.register(r#"the menu list items for "([^"]+)" should be"#, menu_items)?;
    Ok(())
}

fn launch(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let home = world.home();
        home.open().await?;
        let url = world.base().current_url().await?;
        ensure(url.contains(world.config().base_url.trim_start_matches("https://")), || {
            format!("Failed to launch DEMOQA application. Current URL: {url}")
        })?;
        info!(url = %url, "Application launched");
        Ok(())
    })
}

fn click_card(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let card = args.get(0)?;
        world.home().click_card(card).await.map_err(|e| {
            error!(card, error = %e, "Failed to click card");
            e
        })
    })
}

fn navigate_to_section(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let section = args.get(0)?;
        let category = args.get(1)?;
        world
            .home()
            .navigate_to_section(category, section)
            .await
            .map_err(|e| {
                error!(section, category, error = %e, "Failed to navigate to section");
                e
            })?;
        if section == "Practice Form" {
            world.form_visited = true;
        }
        pause(world.config().action_delay).await;
        Ok(())
    })
}

fn url_contains(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let fragment = args.get(0)?;
        let base = world.base();
        match base.wait_for_url_contains(fragment, None).await {
            Ok(url) => {
                info!(url = %url, fragment, "URL verified");
                Ok(())
            }
            Err(e) if e.is_session_failure() => Err(e),
            Err(e) => {
                let current = base.current_url().await.unwrap_or_default();
                error!(fragment, current = %current, error = %e, "URL verification failed");
                Err(as_assertion(
                    e,
                    &format!("Expected URL to contain '{fragment}', but got: {current}"),
                ))
            }
        }
    })
}

fn menu_expanded(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let section = args.get(0)?;
        let expanded = world.home().is_menu_expanded(section).await?;
        ensure(expanded, || format!("{section} menu is not expanded as expected"))
    })
}

/// Expected entries: the `Items` column when present, else the first column
fn expected_items(args: &StepArgs) -> HarnessResult<Vec<String>> {
    let table = args.table()?;
    let column = match table.column("Items") {
        Ok(column) => column,
        Err(_) => table.column_at(0),
    };
    Ok(column.into_iter().map(str::to_string).collect())
}

fn menu_items(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let section = args.get(0)?;
        let expected = expected_items(&args)?;
        let actual = world.home().menu_items(section).await?;

        if section == ORDERED_SECTION {
            ensure(actual == expected, || {
                format!("Menu items mismatch - Expected: {expected:?}, Actual: {actual:?}")
            })
        } else {
            let expected_set: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
            let actual_set: BTreeSet<&str> = actual.iter().map(String::as_str).collect();
            ensure(expected_set == actual_set, || {
                format!(
                    "{section} menu items mismatch - Expected: {expected_set:?}, \
                     Actual: {actual_set:?}"
                )
            })
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::HarnessConfig;
    use crate::feature::{DataTable, StepSpec};
    use crate::mock::MockDriver;
    use crate::result::HarnessError;
    use std::sync::Arc;

    fn setup() -> (StepRegistry, World) {
        let mut registry = StepRegistry::new();
        register(&mut registry).unwrap();
        let world = World::new(Arc::new(MockDriver::demoqa()), Arc::new(HarnessConfig::fast()));
        (registry, world)
    }

    fn step(text: &str) -> StepSpec {
        StepSpec {
            keyword: "Given".into(),
            text: text.into(),
            table: None,
        }
    }

    fn with_table(text: &str, rows: &[&[&str]]) -> StepSpec {
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|c| (*c).to_string()).collect())
            .collect();
        StepSpec {
            keyword: "Then".into(),
            text: text.into(),
            table: Some(DataTable::from_rows(rows)),
        }
    }

    #[tokio::test]
    async fn test_elements_navigation() {
        let (registry, mut world) = setup();
        for text in [
            "the user has launched the DEMOQA application",
            r#"the user clicks on "Elements" card"#,
            r#"the user should be navigated to a URL containing "demoqa.com/elements""#,
            r#"the menu list for "Elements" should be expanded"#,
        ] {
            registry.run(&mut world, &step(text)).await.unwrap();
        }

        let items = with_table(
            r#"the menu list items for "Elements" should be"#,
            &[
                &["Items"],
                &["Check Box"],
                &["Text Box"],
                &["Radio Button"],
                &["Web Tables"],
                &["Buttons"],
                &["Links"],
                &["Broken Links - Images"],
                &["Upload and Download"],
                &["Dynamic Properties"],
            ],
        );
        registry.run(&mut world, &items).await.unwrap();
    }

    #[tokio::test]
    async fn test_book_store_items_are_ordered() {
        let (registry, mut world) = setup();
        registry
            .run(&mut world, &step("the user has launched the DEMOQA application"))
            .await
            .unwrap();
        registry
            .run(&mut world, &step(r#"the user clicks on "Book Store Application" card"#))
            .await
            .unwrap();

        let ordered = with_table(
            r#"the menu list items for "Book Store Application" should be"#,
            &[&["Items"], &["Login"], &["Book Store"], &["Profile"], &["Book Store API"]],
        );
        registry.run(&mut world, &ordered).await.unwrap();

        let shuffled = with_table(
            r#"the menu list items for "Book Store Application" should be"#,
            &[&["Items"], &["Book Store"], &["Login"], &["Profile"], &["Book Store API"]],
        );
        let err = registry.run(&mut world, &shuffled).await.unwrap_err();
        assert!(err.is_assertion());
    }

    #[tokio::test]
    async fn test_wrong_url_is_assertion() {
        let (registry, mut world) = setup();
        registry
            .run(&mut world, &step("the user has launched the DEMOQA application"))
            .await
            .unwrap();
        let err = registry
            .run(
                &mut world,
                &step(r#"the user should be navigated to a URL containing "demoqa.com/forms""#),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::Assertion { ref message } if message.contains("demoqa.com/forms")
        ));
    }

    #[tokio::test]
    async fn test_practice_form_marks_world() {
        let (registry, mut world) = setup();
        registry
            .run(&mut world, &step("the user has launched the DEMOQA application"))
            .await
            .unwrap();
        registry
            .run(&mut world, &step(r#"the user clicks on "Forms" card"#))
            .await
            .unwrap();
        registry
            .run(
                &mut world,
                &step(r#"the user navigates to "Practice Form" section under "Forms""#),
            )
            .await
            .unwrap();
        assert!(world.form_visited);
        let url = world.driver().current_url().await.unwrap();
        assert!(url.ends_with("/automation-practice-form"));
    }
}
