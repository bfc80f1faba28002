//! Check Box page: the react-checkbox-tree widget.
//!
//! Mutations go through [`CheckboxPage`]; every read goes through the
//! [`TreeInspector`], which re-reads the rendered markup each time. A
//! mutation only returns once the tree reports the requested state and the
//! settle delay has passed.

use super::base::{BasePage, PageObject};
use super::locators::checkbox::{
    CLOSED_ICONS, COLLAPSE_ALL, EXPAND_ALL, OPEN_ICONS, RESULT, TOGGLE_BUTTONS,
};
use crate::result::{HarnessError, HarnessResult};
use crate::tree::{node_title, CheckState, TreeInspector, TREE_TITLES};
use crate::wait::pause;
use std::time::Duration;
use tracing::{debug, error, info};

/// Wait for the option buttons after expand/collapse all
pub const OPTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Wait for the fully expanded tree to render its nodes
pub const NODES_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait for a clicked node to report its new state
pub const STATE_CHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Rendered titles that prove the tree is expanded beyond its first levels
const EXPANDED_NODE_FLOOR: usize = 10;

/// Parse the result panel text into lower-case node values
///
/// `"You have selected :\ndesktop\nnotes"` yields `["desktop", "notes"]`.
#[must_use]
pub fn parse_selected(text: &str) -> Vec<String> {
    if !text.contains("You have selected") {
        return Vec::new();
    }
    text.rsplit(':')
        .next()
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Check Box page
#[derive(Debug, Clone, Copy)]
pub struct CheckboxPage<'d> {
    base: BasePage<'d>,
}

impl PageObject for CheckboxPage<'_> {
    fn url_path(&self) -> &'static str {
        "checkbox"
    }

    fn base(&self) -> &BasePage<'_> {
        &self.base
    }
}

impl<'d> CheckboxPage<'d> {
    /// Bind to a session
    #[must_use]
    pub const fn new(base: BasePage<'d>) -> Self {
        Self { base }
    }

    /// Read-only view of the tree
    #[must_use]
    pub const fn inspector(&self) -> TreeInspector<'d> {
        TreeInspector::new(self.base.driver(), self.base.waiter())
    }

    /// Load the page
    ///
    /// # Errors
    ///
    /// Returns an error if navigation fails after retries.
    pub async fn open(&self) -> HarnessResult<()> {
        self.base.navigate_to(&self.url()).await
    }

    // =========================================================================
    // EXPANSION
    // =========================================================================

    /// Expand every node; returns whether the tree then reads as expanded
    ///
    /// # Errors
    ///
    /// Returns an error if the button cannot be clicked or the nodes never render.
    pub async fn expand_all(&self) -> HarnessResult<bool> {
        self.base.click_element(&EXPAND_ALL).await?;
        self.base
            .wait_for_visible(&COLLAPSE_ALL, Some(OPTION_TIMEOUT))
            .await?;
        let rendered = self
            .base
            .waiter_for(Some(NODES_TIMEOUT))
            .wait_for_count_above(&TREE_TITLES, EXPANDED_NODE_FLOOR)
            .await
            .map_err(|e| {
                error!(error = %e, "Tree did not render its nodes after Expand all");
                e
            })?;
        let expanded = self.is_tree_expanded().await?;
        info!(nodes = rendered, expanded, "Expanded all nodes");
        Ok(expanded)
    }

    /// Collapse every node; returns whether the tree then reads as collapsed
    ///
    /// # Errors
    ///
    /// Returns an error if the button cannot be clicked.
    pub async fn collapse_all(&self) -> HarnessResult<bool> {
        self.base.click_element(&COLLAPSE_ALL).await?;
        self.base
            .wait_for_visible(&EXPAND_ALL, Some(OPTION_TIMEOUT))
            .await?;
        pause(self.base.config().settle_delay).await;
        let collapsed = self.is_tree_collapsed().await?;
        info!(collapsed, "Collapsed all nodes");
        Ok(collapsed)
    }

    /// Collapse-all control shown, toggles rendered, and no closed toggle left
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn is_tree_expanded(&self) -> HarnessResult<bool> {
        let control = self.base.is_visible_now(&COLLAPSE_ALL).await?;
        let toggles = self.base.find_all(&TOGGLE_BUTTONS).await?.len();
        let closed = self.base.find_all(&CLOSED_ICONS).await?.len();
        let expanded = control && toggles > 0 && closed == 0;
        debug!(control, toggles, closed, expanded, "Tree expansion");
        Ok(expanded)
    }

    /// Expand-all control shown and no open toggle left
    ///
    /// # Errors
    ///
    /// Returns an error only if the browser session is gone.
    pub async fn is_tree_collapsed(&self) -> HarnessResult<bool> {
        let control = self.base.is_visible_now(&EXPAND_ALL).await?;
        let open = self.base.find_all(&OPEN_ICONS).await?.len();
        let collapsed = control && open == 0;
        debug!(control, open, collapsed, "Tree collapse");
        Ok(collapsed)
    }

    /// Number of per-node expand/collapse toggles rendered
    ///
    /// # Errors
    ///
    /// Returns an error if the driver query fails.
    pub async fn collapse_icon_count(&self) -> HarnessResult<usize> {
        Ok(self.base.find_all(&TOGGLE_BUTTONS).await?.len())
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Check a node; no click if it is already checked
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or never reports checked.
    pub async fn check_node(&self, label: &str) -> HarnessResult<()> {
        self.set_node(label, CheckState::Checked).await
    }

    /// Uncheck a node; no click if it is already unchecked
    ///
    /// An indeterminate node takes two clicks: the widget checks it fully
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or never reports unchecked.
    pub async fn uncheck_node(&self, label: &str) -> HarnessResult<()> {
        self.set_node(label, CheckState::Unchecked).await
    }

    /// Click a node's checkbox once, whatever its state
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or the click fails.
    pub async fn toggle_node(&self, label: &str) -> HarnessResult<()> {
        self.base.click_element(&node_title(label)).await?;
        info!(node = label, "Toggled node");
        pause(self.base.config().settle_delay).await;
        Ok(())
    }

    async fn set_node(&self, label: &str, target: CheckState) -> HarnessResult<()> {
        let inspector = self.inspector();
        let mut state = inspector.state_of(label).await?;
        if state == target {
            info!(node = label, state = %state, "Node already in requested state, skipping click");
            return Ok(());
        }

        // checked -> unchecked and unchecked -> checked take one click;
        // indeterminate -> unchecked goes through checked
        let clicks = if state == CheckState::Indeterminate && target == CheckState::Unchecked {
            2
        } else {
            1
        };
        for _ in 0..clicks {
            self.base.click_element(&node_title(label)).await?;
            let expected = if state == CheckState::Checked {
                CheckState::Unchecked
            } else {
                CheckState::Checked
            };
            self.wait_for_state(label, expected).await?;
            state = expected;
        }

        info!(node = label, state = %target, "Node state changed");
        pause(self.base.config().settle_delay).await;
        Ok(())
    }

    async fn wait_for_state(&self, label: &str, expected: CheckState) -> HarnessResult<()> {
        let inspector = self.inspector();
        self.base
            .waiter_for(Some(STATE_CHANGE_TIMEOUT))
            .wait_until(&format!("node {label:?} to be {expected}"), || async move {
                Ok::<_, HarnessError>(inspector.state_of(label).await? == expected)
            })
            .await
            .map_err(|e| {
                error!(node = label, expected = %expected, error = %e, "Node did not reach state");
                e
            })
    }

    /// Node values listed in the result panel, lower-cased
    ///
    /// Empty when nothing is selected (the panel is not rendered).
    ///
    /// # Errors
    ///
    /// Returns an error if the driver query fails.
    pub async fn selected_items(&self) -> HarnessResult<Vec<String>> {
        let driver = self.base.driver();
        let Some(panel) = self.base.find_all(&RESULT).await?.into_iter().next() else {
            debug!("No result panel, selection is empty");
            return Ok(Vec::new());
        };
        let items = parse_selected(&driver.text(&panel).await?);
        debug!(items = ?items, "Selected items");
        Ok(items)
    }
}
