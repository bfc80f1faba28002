//! Dynamic Properties steps: delayed visibility and colour change.

use super::{StepArgs, StepFuture, StepRegistry, World};
use crate::result::{ensure, HarnessError, HarnessResult};
use crate::wait::pause;
use std::time::Duration;
use tracing::info;

const PAGE_PATH: &str = "demoqa.com/dynamic-properties";

/// Wait for the delayed button and for the text colour
const APPEAR_TIMEOUT: Duration = Duration::from_secs(10);

/// Fallback wait on the background colour
const BACKGROUND_TIMEOUT: Duration = Duration::from_secs(1);

/// Register the Dynamic Properties steps
///
/// # Errors
///
/// Returns a config error if a pattern does not compile.
pub fn register(registry: &mut StepRegistry) -> HarnessResult<()> {
    registry.register(r"the user is on the Dynamic Properties page", on_page)?;
    registry.register(r"the user loads the page", load_page)?;
    registry.register(
        concat!(
            r#"the user waits fluently for the button with text "Visible After 5 Seconds" "#,
            "to be displayed"
        ),
        wait_visible_after,
    )?;
    registry.register(
        r#"the button with text "Visible After 5 Seconds" should be visible on the page"#,
        visible_after_shown,
    )?;
    registry.register(
        r#"the user captures the initial color of the "Color Change" button"#,
        capture_colors,
    )?;
    registry.register(
        r#"the user waits for the "Color Change" button color to change"#,
        wait_color_change,
    )?;
    registry.register(
        r#"the "Color Change" button should have a different color than initially"#,
        color_differs,
    )?;
    Ok(())
}

fn on_page(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let url = world.base().current_url().await?;
        ensure(url.contains(PAGE_PATH), || {
            format!("Expected to be on the Dynamic Properties page, but got: {url}")
        })
    })
}

fn load_page(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        world.base().refresh_page().await?;
        pause(world.config().action_delay).await;
        Ok(())
    })
}

fn wait_visible_after(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let appeared = world
            .dynamic_properties()
            .wait_for_visible_after_button(APPEAR_TIMEOUT)
            .await?;
        ensure(appeared, || {
            "Button 'Visible After 5 Seconds' did not appear within timeout".to_string()
        })
    })
}

fn visible_after_shown(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let visible = world.dynamic_properties().is_visible_after_button_visible().await?;
        ensure(visible, || "Button 'Visible After 5 Seconds' is not visible".to_string())
    })
}

fn capture_colors(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.dynamic_properties();
        let color = page.color_change_button_color().await?;
        let background = page.color_change_button_background().await?;
        info!(color = %color, background = %background, "Captured initial colours");
        world.initial_color = Some(color);
        world.initial_background = Some(background);
        Ok(())
    })
}

fn wait_color_change(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.dynamic_properties();

        // The change may already have happened since the capture.
        let current = page.color_change_button_color().await?;
        if world.initial_color.as_deref().is_some_and(|initial| initial != current) {
            info!(color = %current, "Color already changed");
            return Ok(());
        }

        let changed = match page.wait_for_color_change("color", APPEAR_TIMEOUT).await? {
            Some(color) => Some(color),
            None => {
                page.wait_for_color_change("background-color", BACKGROUND_TIMEOUT)
                    .await?
            }
        };
        ensure(changed.is_some(), || {
            "Button color did not change within timeout period".to_string()
        })
    })
}

fn color_differs(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let (Some(initial_color), Some(initial_background)) =
            (world.initial_color.as_deref(), world.initial_background.as_deref())
        else {
            return Err(HarnessError::assertion(
                "initial colours were not captured in this scenario",
            ));
        };
        let page = world.dynamic_properties();
        let color = page.color_change_button_color().await?;
        let background = page.color_change_button_background().await?;
        ensure(color != initial_color || background != initial_background, || {
            format!(
                "No color change detected! Text: {initial_color} -> {color}, \
                 Background: {initial_background} -> {background}"
            )
        })
    })
}
