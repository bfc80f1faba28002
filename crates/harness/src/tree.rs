//! Tri-state checkbox tree inspection.
//!
//! The tree widget exposes no data model, so every answer is read back from
//! the rendered markup at the moment of the query. Nothing is cached: the
//! widget re-renders on every check and expand, and a remembered handle or
//! label list would be stale by the next step.
//!
//! State detection is a list of pure strategies over a [`CheckboxSnapshot`],
//! tried in order:
//!
//! 1. the native input's `indeterminate` and `checked` flags
//! 2. the `aria-checked` attribute
//! 3. the icon class (`rct-icon-half-check`, `rct-icon-check`, `rct-icon-uncheck`)
//!
//! Hierarchy is derived from nesting: a node is an `li.rct-node`; its
//! children are the `li` elements of the `ol` directly below it.

use crate::driver::{Driver, ElementRef};
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use crate::wait::Waiter;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// Upper bound on parent hops when climbing the tree
pub const MAX_ANCESTOR_DEPTH: usize = 10;

/// Upper bound on element hops from a title to its `li` container
const MAX_CONTAINER_HOPS: usize = 6;

/// Every node title currently rendered
pub const TREE_TITLES: Locator = Locator::css("span.rct-title");

const CHECKBOX_INPUT: Locator = Locator::css("input[type='checkbox']");
const CHECKBOX_SPAN: Locator = Locator::css("span.rct-checkbox");
const ICON: Locator = Locator::css(".rct-icon");

/// Title span of the node labelled `label`
#[must_use]
pub fn node_title(label: &str) -> Locator {
    TREE_TITLES.with_text(label.to_string())
}

// =============================================================================
// STATE
// =============================================================================

/// Observed state of one tree checkbox
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CheckState {
    /// Node and every descendant selected
    Checked,
    /// Nothing below the node selected
    Unchecked,
    /// Some but not all descendants selected
    Indeterminate,
    /// No strategy could read the markup
    Unknown,
}

impl CheckState {
    /// Lower-case name used in logs and step text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Checked => "checked",
            Self::Unchecked => "unchecked",
            Self::Indeterminate => "indeterminate",
            Self::Unknown => "unknown",
        }
    }

    /// Whether the node counts as checked
    #[must_use]
    pub const fn is_checked(&self) -> bool {
        matches!(self, Self::Checked)
    }
}

impl fmt::Display for CheckState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags of the native checkbox input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFlags {
    /// `input.indeterminate`
    pub indeterminate: bool,
    /// `input.checked`
    pub selected: bool,
}

/// Everything the strategies look at, read in one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckboxSnapshot {
    /// Native input, when one could be resolved
    pub input: Option<InputFlags>,
    /// `aria-checked` on the checkbox span
    pub aria_checked: Option<String>,
    /// `class` of the rendered icon
    pub icon_classes: Option<String>,
}

/// Read the native input flags; indeterminate wins over checked
#[must_use]
pub fn from_input(snapshot: &CheckboxSnapshot) -> Option<CheckState> {
    snapshot.input.map(|flags| {
        if flags.indeterminate {
            CheckState::Indeterminate
        } else if flags.selected {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    })
}

/// `aria-checked`: `true`, `false` or `mixed`
#[must_use]
pub fn from_aria(snapshot: &CheckboxSnapshot) -> Option<CheckState> {
    match snapshot.aria_checked.as_deref()?.trim() {
        "true" => Some(CheckState::Checked),
        "false" => Some(CheckState::Unchecked),
        "mixed" => Some(CheckState::Indeterminate),
        _ => None,
    }
}

/// Icon class tokens
#[must_use]
pub fn from_icon(snapshot: &CheckboxSnapshot) -> Option<CheckState> {
    let classes = snapshot.icon_classes.as_deref()?;
    let has = |token: &str| classes.split_whitespace().any(|c| c == token);
    if has("rct-icon-half-check") {
        Some(CheckState::Indeterminate)
    } else if has("rct-icon-check") {
        Some(CheckState::Checked)
    } else if has("rct-icon-uncheck") {
        Some(CheckState::Unchecked)
    } else {
        None
    }
}

/// Detection strategies in priority order
pub const STRATEGIES: [fn(&CheckboxSnapshot) -> Option<CheckState>; 3] =
    [from_input, from_aria, from_icon];

/// First strategy that recognises the snapshot
#[must_use]
pub fn detect_state(snapshot: &CheckboxSnapshot) -> CheckState {
    STRATEGIES
        .iter()
        .find_map(|strategy| strategy(snapshot))
        .unwrap_or(CheckState::Unknown)
}

// =============================================================================
// INSPECTOR
// =============================================================================

/// Reads node state and hierarchy from the rendered tree
#[derive(Debug, Clone, Copy)]
pub struct TreeInspector<'d> {
    driver: &'d dyn Driver,
    waiter: Waiter<'d>,
}

impl<'d> TreeInspector<'d> {
    /// Inspector over `driver`; `waiter` bounds the wait for a node to render
    #[must_use]
    pub const fn new(driver: &'d dyn Driver, waiter: Waiter<'d>) -> Self {
        Self { driver, waiter }
    }

    /// Whether a node labelled `label` is rendered within the wait
    pub async fn exists(&self, label: &str) -> HarnessResult<bool> {
        match self.waiter.wait_for_present(&node_title(label)).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_session_failure() => Err(e),
            Err(e) => {
                debug!(node = label, error = %e, "Node not found");
                Ok(false)
            }
        }
    }

    /// Read the checkbox markup of a node
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not rendered in time.
    pub async fn snapshot(&self, label: &str) -> HarnessResult<CheckboxSnapshot> {
        let title = self.waiter.wait_for_present(&node_title(label)).await?;
        let Some(label_el) = self.enclosing(&title, "label").await? else {
            warn!(node = label, "Node has no label element");
            return Ok(CheckboxSnapshot::default());
        };

        let input = match self.first_within(&label_el, &CHECKBOX_INPUT).await? {
            Some(input) => Some(InputFlags {
                indeterminate: self
                    .driver
                    .property(&input, "indeterminate")
                    .await?
                    .as_bool()
                    .unwrap_or(false),
                selected: self.driver.is_selected(&input).await?,
            }),
            None => None,
        };

        let span = self.first_within(&label_el, &CHECKBOX_SPAN).await?;
        let (aria_checked, icon_classes) = match span {
            Some(span) => {
                let aria = self.driver.attribute(&span, "aria-checked").await?;
                let icon = match self.first_within(&span, &ICON).await? {
                    Some(icon) => self.driver.attribute(&icon, "class").await?,
                    None => None,
                };
                (aria, icon)
            }
            None => (None, None),
        };

        Ok(CheckboxSnapshot {
            input,
            aria_checked,
            icon_classes,
        })
    }

    /// Tri-state of a node; unreadable markup counts as unchecked
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not rendered in time.
    pub async fn state_of(&self, label: &str) -> HarnessResult<CheckState> {
        let snapshot = self.snapshot(label).await?;
        let state = detect_state(&snapshot);
        if state == CheckState::Unknown {
            warn!(
                node = label,
                snapshot = ?snapshot,
                "Could not determine state, assuming unchecked"
            );
            return Ok(CheckState::Unchecked);
        }
        debug!(node = label, state = %state, "Node state");
        Ok(state)
    }

    /// Labels of the direct children of a node, in display order
    ///
    /// Collapsed nodes render no children and report none.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not rendered in time.
    pub async fn children_of(&self, label: &str) -> HarnessResult<Vec<String>> {
        let item = self.node_item(label).await?;
        let children = match self.child_list(&item).await? {
            Some(list) => self.item_labels(&list).await?,
            None => Vec::new(),
        };
        debug!(node = label, count = children.len(), children = ?children, "Direct children");
        Ok(children)
    }

    /// Every rendered descendant of a node, depth first in pre-order
    ///
    /// # Errors
    ///
    /// Returns an error if a node is not rendered in time.
    pub async fn descendants_of(&self, label: &str) -> HarnessResult<Vec<String>> {
        let mut descendants = Vec::new();
        let mut pending: Vec<String> = self.children_of(label).await?.into_iter().rev().collect();
        while let Some(node) = pending.pop() {
            let children = self.children_of(&node).await?;
            descendants.push(node);
            pending.extend(children.into_iter().rev());
        }
        debug!(node = label, count = descendants.len(), "Descendants");
        Ok(descendants)
    }

    /// Labels of the enclosing nodes, nearest first
    ///
    /// The climb stops after [`MAX_ANCESTOR_DEPTH`] levels.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not rendered in time.
    pub async fn ancestors_of(&self, label: &str) -> HarnessResult<Vec<String>> {
        let mut current = self.node_item(label).await?;
        let mut ancestors = Vec::new();

        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(list) = self.parent_tagged(&current, "ol").await? else {
                break;
            };
            let Some(parent_item) = self.parent_tagged(&list, "li").await? else {
                break;
            };
            match self.item_label(&parent_item).await? {
                Some(text) => ancestors.push(text),
                None => break,
            }
            current = parent_item;
        }

        debug!(node = label, ancestors = ?ancestors, "Ancestors");
        Ok(ancestors)
    }

    /// Labels of the other children of the node's parent list
    ///
    /// # Errors
    ///
    /// Returns an error if the node is not rendered in time.
    pub async fn siblings_of(&self, label: &str) -> HarnessResult<Vec<String>> {
        let item = self.node_item(label).await?;
        let Some(list) = self.parent_tagged(&item, "ol").await? else {
            return Ok(Vec::new());
        };
        let mut siblings = self.item_labels(&list).await?;
        siblings.retain(|s| s != label);
        Ok(siblings)
    }

    /// Labels of every displayed node
    ///
    /// # Errors
    ///
    /// Returns an error if the driver query fails.
    pub async fn visible_labels(&self) -> HarnessResult<Vec<String>> {
        let mut labels = Vec::new();
        for title in self.driver.find_all(&TREE_TITLES).await? {
            if !self.driver.is_displayed(&title).await? {
                continue;
            }
            let text = self.driver.text(&title).await?;
            let text = text.trim();
            if !text.is_empty() {
                labels.push(text.to_string());
            }
        }
        debug!(count = labels.len(), "Visible nodes");
        Ok(labels)
    }

    // =========================================================================
    // DOM WALKING
    // =========================================================================

    /// `li` container of a node
    async fn node_item(&self, label: &str) -> HarnessResult<ElementRef> {
        let title = self.waiter.wait_for_present(&node_title(label)).await?;
        self.enclosing(&title, "li")
            .await?
            .ok_or_else(|| HarnessError::ElementNotFound {
                locator: format!("li container of tree node '{label}'"),
            })
    }

    /// Nearest ancestor with `tag`, within a few hops
    async fn enclosing(
        &self,
        element: &ElementRef,
        tag: &str,
    ) -> HarnessResult<Option<ElementRef>> {
        let mut current = element.clone();
        for _ in 0..MAX_CONTAINER_HOPS {
            match self.driver.parent(&current).await? {
                Some(parent) if self.driver.tag_name(&parent).await?.eq_ignore_ascii_case(tag) => {
                    return Ok(Some(parent));
                }
                Some(parent) => current = parent,
                None => break,
            }
        }
        Ok(None)
    }

    /// Direct parent, only if it has `tag`
    async fn parent_tagged(
        &self,
        element: &ElementRef,
        tag: &str,
    ) -> HarnessResult<Option<ElementRef>> {
        match self.driver.parent(element).await? {
            Some(parent) if self.driver.tag_name(&parent).await?.eq_ignore_ascii_case(tag) => {
                Ok(Some(parent))
            }
            _ => Ok(None),
        }
    }

    /// `ol` directly below a node's `li`
    async fn child_list(&self, item: &ElementRef) -> HarnessResult<Option<ElementRef>> {
        for child in self.driver.children(item).await? {
            if self.driver.tag_name(&child).await?.eq_ignore_ascii_case("ol") {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Non-empty labels of the `li` children of a list
    async fn item_labels(&self, list: &ElementRef) -> HarnessResult<Vec<String>> {
        let mut labels = Vec::new();
        for child in self.driver.children(list).await? {
            if !self.driver.tag_name(&child).await?.eq_ignore_ascii_case("li") {
                continue;
            }
            if let Some(text) = self.item_label(&child).await? {
                labels.push(text);
            }
        }
        Ok(labels)
    }

    /// Own title of an `li` (the first title below it)
    async fn item_label(&self, item: &ElementRef) -> HarnessResult<Option<String>> {
        let Some(title) = self.first_within(item, &TREE_TITLES).await? else {
            return Ok(None);
        };
        let text = self.driver.text(&title).await?;
        let text = text.trim();
        Ok((!text.is_empty()).then(|| text.to_string()))
    }

    async fn first_within(
        &self,
        scope: &ElementRef,
        locator: &Locator,
    ) -> HarnessResult<Option<ElementRef>> {
        Ok(self.driver.find_within(scope, locator).await?.into_iter().next())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::mock::{MockDom, MockDriver, MockPage};
    use crate::wait::WaitOptions;
    use std::time::Duration;

    fn snapshot(
        input: Option<(bool, bool)>,
        aria: Option<&str>,
        icon: Option<&str>,
    ) -> CheckboxSnapshot {
        CheckboxSnapshot {
            input: input.map(|(indeterminate, selected)| InputFlags {
                indeterminate,
                selected,
            }),
            aria_checked: aria.map(str::to_string),
            icon_classes: icon.map(str::to_string),
        }
    }

    fn inspector(driver: &MockDriver) -> TreeInspector<'_> {
        let options = WaitOptions::new()
            .with_timeout(Duration::from_millis(100))
            .with_poll_interval(Duration::from_millis(5));
        TreeInspector::new(driver, Waiter::new(driver, options))
    }

    async fn expanded_tree() -> MockDriver {
        let driver = MockDriver::demoqa();
        driver.navigate("https://demoqa.com/checkbox").await.unwrap();
        let expand = driver
            .find_all(&Locator::css("button[title='Expand all']"))
            .await
            .unwrap();
        driver.click(&expand[0]).await.unwrap();
        driver
    }

    async fn check(driver: &MockDriver, label: &str) {
        let title = driver.find_all(&node_title(label)).await.unwrap();
        driver.click(&title[0]).await.unwrap();
    }

    mod strategies {
        use super::*;

        #[test]
        fn test_input_indeterminate_wins() {
            let s = snapshot(Some((true, true)), Some("true"), Some("rct-icon rct-icon-check"));
            assert_eq!(detect_state(&s), CheckState::Indeterminate);
        }

        #[test]
        fn test_input_selected() {
            assert_eq!(
                from_input(&snapshot(Some((false, true)), None, None)),
                Some(CheckState::Checked)
            );
            assert_eq!(
                from_input(&snapshot(Some((false, false)), None, None)),
                Some(CheckState::Unchecked)
            );
            assert_eq!(from_input(&snapshot(None, None, None)), None);
        }

        #[test]
        fn test_aria_fallback() {
            assert_eq!(
                detect_state(&snapshot(None, Some("mixed"), None)),
                CheckState::Indeterminate
            );
            assert_eq!(detect_state(&snapshot(None, Some("true"), None)), CheckState::Checked);
            assert_eq!(detect_state(&snapshot(None, Some("false"), None)), CheckState::Unchecked);
            assert_eq!(from_aria(&snapshot(None, Some("bogus"), None)), None);
        }

        #[test]
        fn test_icon_fallback_uses_whole_tokens() {
            let half = snapshot(None, Some("bogus"), Some("rct-icon rct-icon-half-check"));
            assert_eq!(detect_state(&half), CheckState::Indeterminate);
            let check = snapshot(None, None, Some("rct-icon rct-icon-check"));
            assert_eq!(detect_state(&check), CheckState::Checked);
            let uncheck = snapshot(None, None, Some("rct-icon rct-icon-uncheck"));
            assert_eq!(detect_state(&uncheck), CheckState::Unchecked);
            let prefix_only = snapshot(None, None, Some("rct-icon-checkmark"));
            assert_eq!(from_icon(&prefix_only), None);
        }

        #[test]
        fn test_nothing_readable_is_unknown() {
            assert_eq!(detect_state(&CheckboxSnapshot::default()), CheckState::Unknown);
        }
    }

    mod traversal {
        use super::*;

        #[tokio::test]
        async fn test_children_in_display_order() {
            let driver = expanded_tree().await;
            let tree = inspector(&driver);
            assert_eq!(
                tree.children_of("Home").await.unwrap(),
                vec!["Desktop", "Documents", "Downloads"]
            );
            assert_eq!(tree.children_of("Office").await.unwrap().len(), 4);
        }

        #[tokio::test]
        async fn test_leaf_has_no_descendants() {
            let driver = expanded_tree().await;
            let tree = inspector(&driver);
            assert!(tree.descendants_of("Notes").await.unwrap().is_empty());
            assert!(tree.children_of("Word File.doc").await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_descendants_pre_order() {
            let driver = expanded_tree().await;
            let tree = inspector(&driver);
            assert_eq!(
                tree.descendants_of("Documents").await.unwrap(),
                vec![
                    "WorkSpace",
                    "React",
                    "Angular",
                    "Veu",
                    "Office",
                    "Public",
                    "Private",
                    "Classified",
                    "General"
                ]
            );
            assert_eq!(tree.descendants_of("Home").await.unwrap().len(), 16);
        }

        #[tokio::test]
        async fn test_ancestors_nearest_first() {
            let driver = expanded_tree().await;
            let tree = inspector(&driver);
            assert_eq!(
                tree.ancestors_of("React").await.unwrap(),
                vec!["WorkSpace", "Documents", "Home"]
            );
            assert!(tree.ancestors_of("Home").await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_siblings() {
            let driver = expanded_tree().await;
            let tree = inspector(&driver);
            assert_eq!(tree.siblings_of("Angular").await.unwrap(), vec!["React", "Veu"]);
        }

        #[tokio::test]
        async fn test_collapsed_tree_shows_root_only() {
            let driver = MockDriver::demoqa();
            driver.navigate("https://demoqa.com/checkbox").await.unwrap();
            let tree = inspector(&driver);
            assert_eq!(tree.visible_labels().await.unwrap(), vec!["Home"]);
            assert!(tree.children_of("Home").await.unwrap().is_empty());
            assert!(!tree.exists("Desktop").await.unwrap());
        }

        #[tokio::test]
        async fn test_ancestor_climb_is_bounded() {
            let driver = MockDriver::new();
            let mut dom = MockDom::new();
            let mut list = dom.append(dom.body(), "ol", &[]);
            for depth in 0..15 {
                let item = dom.append(list, "li", &[("class", "rct-node")]);
                dom.append_text(item, "span", &[("class", "rct-title")], &format!("n{depth}"));
                list = dom.append(item, "ol", &[]);
            }
            driver.load(MockPage::new(dom));

            let ancestors = inspector(&driver).ancestors_of("n14").await.unwrap();
            assert_eq!(ancestors.len(), MAX_ANCESTOR_DEPTH);
            assert_eq!(ancestors[0], "n13");
        }
    }

    mod cascade {
        use super::*;

        #[tokio::test]
        async fn test_checking_branch_checks_descendants() {
            let driver = expanded_tree().await;
            check(&driver, "Documents").await;
            let tree = inspector(&driver);

            assert_eq!(tree.state_of("Documents").await.unwrap(), CheckState::Checked);
            for node in tree.descendants_of("Documents").await.unwrap() {
                assert_eq!(tree.state_of(&node).await.unwrap(), CheckState::Checked, "{node}");
            }
            assert_eq!(tree.state_of("Home").await.unwrap(), CheckState::Indeterminate);
            assert_eq!(tree.state_of("Desktop").await.unwrap(), CheckState::Unchecked);
        }

        #[tokio::test]
        async fn test_partial_selection_and_undo() {
            let driver = expanded_tree().await;
            check(&driver, "React").await;
            let tree = inspector(&driver);

            for ancestor in tree.ancestors_of("React").await.unwrap() {
                assert_eq!(tree.state_of(&ancestor).await.unwrap(), CheckState::Indeterminate);
            }

            check(&driver, "React").await;
            for ancestor in tree.ancestors_of("React").await.unwrap() {
                assert_eq!(tree.state_of(&ancestor).await.unwrap(), CheckState::Unchecked);
            }
        }

        #[tokio::test]
        async fn test_full_coverage_checks_parent() {
            let driver = expanded_tree().await;
            check(&driver, "Word File.doc").await;
            check(&driver, "Excel File.doc").await;
            let tree = inspector(&driver);
            assert_eq!(tree.state_of("Downloads").await.unwrap(), CheckState::Checked);
        }
    }
}
