//! Check Box tree steps: expansion and cascading selection.

use super::{StepArgs, StepFuture, StepRegistry, World};
use crate::pages::CheckboxPage;
use crate::result::{ensure, HarnessResult};
use crate::tree::CheckState;
use crate::wait::pause;
use tracing::{info, warn};

/// Fewer visible nodes than this means the hierarchy is incomplete
const MIN_VISIBLE_NODES: usize = 10;

/// Parent shared by the multi-selection scenario's nodes
const COMMON_PARENT: &str = "Documents";

/// Branches the multi-selection scenario leaves alone
const UNRELATED_NODES: [&str; 2] = ["Desktop", "Downloads"];

/// Register the Check Box steps
///
/// # Errors
///
/// Returns a config error if a pattern does not compile.
pub fn register(registry: &mut StepRegistry) -> HarnessResult<()> {
    registry.register(
        r#"the user should be able to see "([^"]+)" in the tree node"#,
        node_visible,
    )?;
    registry.register(r"the user clicks on the expand all \(\+\) button", expand_all)?;
    registry.register(
        r"the user expands the tree at all levels through expand all \(\+\) button",
        expand_and_verify,
    )?;
    registry.register(r"all tree nodes should be expanded at all levels", tree_expanded)?;
    registry.register(r"all expandable nodes should show collapse \(-\) icons", collapse_icons)?;
    registry.register(
        r"the tree structure should display the complete hierarchy",
        complete_hierarchy,
    )?;
    registry.register(r"the following nodes should be visible", nodes_visible)?;
    registry.register(r#"the user selects the node "([^"]+)" in the checkbox tree"#, select_node)?;
    registry.register(
        r#"the user deselects the node "([^"]+)" in the checkbox tree"#,
        deselect_node,
    )?;
    registry.register(
        r#"all child nodes under "([^"]+)" should be automatically checked"#,
        children_checked,
    )?;
    registry.register(
        r#"all ancestor nodes of "([^"]+)" should show indeterminate state"#,
        ancestors_indeterminate,
    )?;
    registry.register(
        r#"all sibling nodes of "([^"]+)" should remain unchecked"#,
        siblings_unchecked,
    )?;
    registry.register(
        r#"the selection result should display all items from "([^"]+)" branch"#,
        result_has_branch,
    )?;
    registry.register(
        r"both selected nodes and all their children should be checked",
        selections_checked,
    )?;
    registry.register(
        r"the common parent node should show indeterminate state",
        common_parent_indeterminate,
    )?;
    registry.register(r"unrelated nodes should remain unchecked", unrelated_unchecked)?;
    registry.register(
        r"the selection result should include items from all selected branches",
        result_has_all_branches,
    )?;
    registry.register(
        r#"the node "([^"]+)" and all its children should be checked"#,
        subtree_checked,
    )?;
    registry.register(
        r#"the node "([^"]+)" and all its children should be unchecked"#,
        subtree_unchecked,
    )?;
    registry.register(
        r"all ancestor nodes should return to unchecked state",
        root_unchecked,
    )?;
    registry.register(r"the selection result should be empty", result_empty)?;
    Ok(())
}

/// Let the widget finish cascading before reading state
async fn settle(world: &World) {
    pause(world.config().settle_delay).await;
}

/// Labels among `labels` whose state fails `accept`
async fn offenders(
    page: &CheckboxPage<'_>,
    labels: &[String],
    accept: impl Fn(CheckState) -> bool,
) -> HarnessResult<Vec<String>> {
    let inspector = page.inspector();
    let mut wrong = Vec::new();
    for label in labels {
        let state = inspector.state_of(label).await?;
        if !accept(state) {
            wrong.push(format!("{label} (state: {})", state.as_str()));
        }
    }
    Ok(wrong)
}

async fn check_subtree(page: &CheckboxPage<'_>, label: &str, checked: bool) -> HarnessResult<()> {
    let inspector = page.inspector();
    let state = inspector.state_of(label).await?;
    if checked {
        ensure(state.is_checked(), || format!("Node '{label}' is not checked"))?;
    } else {
        ensure(state == CheckState::Unchecked, || {
            format!("Node '{label}' is still {}", state.as_str())
        })?;
    }
    let descendants = inspector.descendants_of(label).await?;
    let wrong = offenders(page, &descendants, |s| s.is_checked() == checked).await?;
    ensure(wrong.is_empty(), || {
        let expected = if checked { "Unchecked" } else { "Still checked" };
        format!("{expected} descendants of '{label}': {wrong:?}")
    })
}

fn node_visible(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let label = args.get(0)?;
        let exists = world.checkbox().inspector().exists(label).await?;
        ensure(exists, || format!("{label} node not visible"))
    })
}

fn expand_all(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expanded = world.checkbox().expand_all().await?;
        ensure(expanded, || "Tree expansion failed".to_string())
    })
}

fn expand_and_verify(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.checkbox();
        ensure(page.expand_all().await?, || "Failed to expand tree".to_string())?;
        ensure(page.is_tree_expanded().await?, || {
            "Tree expansion verification failed".to_string()
        })
    })
}

fn tree_expanded(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expanded = world.checkbox().is_tree_expanded().await?;
        ensure(expanded, || "Tree not fully expanded".to_string())
    })
}

fn collapse_icons(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let icons = world.checkbox().collapse_icon_count().await?;
        info!(icons, "Collapse icons shown");
        ensure(icons > 0, || "No collapse icons found".to_string())
    })
}

fn complete_hierarchy(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let visible = world.checkbox().inspector().visible_labels().await?;
        ensure(visible.len() >= MIN_VISIBLE_NODES, || {
            format!("Expected >= {MIN_VISIBLE_NODES} nodes, found {}", visible.len())
        })
    })
}

fn nodes_visible(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let expected = args.table()?.column_at(0);
        let inspector = world.checkbox().inspector();
        let mut missing = Vec::new();
        for node in expected {
            if !inspector.exists(node).await? {
                missing.push(node);
            }
        }
        ensure(missing.is_empty(), || format!("Missing nodes: {missing:?}"))
    })
}

fn select_node(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let label = args.get(0)?;
        let page = world.checkbox();
        ensure(page.inspector().exists(label).await?, || {
            format!("Node '{label}' not found in tree")
        })?;
        page.check_node(label).await?;
        pause(world.config().action_delay).await;
        let state = page.inspector().state_of(label).await?;
        ensure(state.is_checked(), || format!("Failed to check node '{label}'"))?;
        world.selected_nodes.push(label.to_string());
        Ok(())
    })
}

fn deselect_node(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let label = args.get(0)?;
        let page = world.checkbox();
        ensure(page.inspector().exists(label).await?, || format!("Node '{label}' not found"))?;
        page.uncheck_node(label).await?;
        pause(world.config().action_delay).await;
        let state = page.inspector().state_of(label).await?;
        ensure(!state.is_checked(), || format!("Failed to uncheck node '{label}'"))?;
        world.selected_nodes.retain(|n| n != label);
        Ok(())
    })
}

fn children_checked(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let parent = args.get(0)?;
        let page = world.checkbox();
        settle(world).await;
        let descendants = page.inspector().descendants_of(parent).await?;
        if descendants.is_empty() {
            warn!(node = parent, "No descendants found");
            return Ok(());
        }
        let unchecked = offenders(&page, &descendants, |s| s.is_checked()).await?;
        ensure(unchecked.is_empty(), || {
            format!("Unchecked nodes under '{parent}': {unchecked:?}")
        })
    })
}

fn ancestors_indeterminate(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let label = args.get(0)?;
        let page = world.checkbox();
        settle(world).await;
        let ancestors = page.inspector().ancestors_of(label).await?;
        let wrong = offenders(&page, &ancestors, |s| s == CheckState::Indeterminate).await?;
        ensure(wrong.is_empty(), || {
            format!("Ancestors without indeterminate state: {wrong:?}")
        })
    })
}

fn siblings_unchecked(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let label = args.get(0)?;
        let page = world.checkbox();
        settle(world).await;
        let siblings = page.inspector().siblings_of(label).await?;
        let checked = offenders(&page, &siblings, |s| !s.is_checked()).await?;
        ensure(checked.is_empty(), || format!("Checked siblings found: {checked:?}"))
    })
}

fn result_has_branch(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let parent = args.get(0)?;
        let page = world.checkbox();
        settle(world).await;
        let selected = page.selected_items().await?;
        ensure(!selected.is_empty(), || {
            format!("No selected items displayed for '{parent}' branch")
        })?;
        let wanted = parent.to_lowercase();
        ensure(selected.contains(&wanted), || {
            format!("Parent node '{parent}' not in results {selected:?}")
        })
    })
}

fn selections_checked(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.checkbox();
        settle(world).await;
        ensure(!world.selected_nodes.is_empty(), || {
            "No nodes were selected in this scenario".to_string()
        })?;
        for node in &world.selected_nodes {
            check_subtree(&page, node, true).await?;
        }
        Ok(())
    })
}

fn common_parent_indeterminate(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.checkbox();
        settle(world).await;
        let state = page.inspector().state_of(COMMON_PARENT).await?;
        ensure(
            matches!(state, CheckState::Indeterminate | CheckState::Checked),
            || format!("Common parent '{COMMON_PARENT}' state invalid: {}", state.as_str()),
        )
    })
}

fn unrelated_unchecked(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.checkbox();
        settle(world).await;
        let inspector = page.inspector();
        let mut checked = Vec::new();
        for node in UNRELATED_NODES {
            if inspector.exists(node).await? && inspector.state_of(node).await?.is_checked() {
                checked.push(node);
            }
        }
        ensure(checked.is_empty(), || format!("Unrelated nodes are checked: {checked:?}"))
    })
}

fn result_has_all_branches(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.checkbox();
        settle(world).await;
        let selected = page.selected_items().await?;
        ensure(!selected.is_empty(), || {
            "Expected items from multiple branches but got none".to_string()
        })?;
        let missing: Vec<String> = world
            .selected_nodes
            .iter()
            .map(|n| n.to_lowercase())
            .filter(|n| !selected.contains(n))
            .collect();
        ensure(missing.is_empty(), || {
            format!("Selected branches missing from result: {missing:?}")
        })
    })
}

fn subtree_checked(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let label = args.get(0)?;
        let page = world.checkbox();
        settle(world).await;
        check_subtree(&page, label, true).await
    })
}

fn subtree_unchecked(world: &mut World, args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let label = args.get(0)?;
        let page = world.checkbox();
        settle(world).await;
        check_subtree(&page, label, false).await
    })
}

fn root_unchecked(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.checkbox();
        settle(world).await;
        let inspector = page.inspector();
        if inspector.exists("Home").await? {
            let state = inspector.state_of("Home").await?;
            ensure(state == CheckState::Unchecked, || {
                format!("Root node 'Home' should be unchecked but is: {}", state.as_str())
            })?;
        }
        Ok(())
    })
}

fn result_empty(world: &mut World, _args: StepArgs) -> StepFuture<'_> {
    Box::pin(async move {
        let page = world.checkbox();
        settle(world).await;
        let selected = page.selected_items().await?;
        ensure(selected.is_empty(), || format!("Expected empty result but found: {selected:?}"))
    })
}
