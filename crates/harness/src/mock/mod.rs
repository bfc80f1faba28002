//! Mock driver for testing page objects without a browser.
//!
//! [`MockDriver`] implements [`Driver`] over an in-memory [`MockDom`].
//! Pages are installed per URL path through routes; each installed page may
//! carry event hooks (widget behaviour reacting to clicks and typing) and
//! timers (mutations that fire after a delay, checked on every driver call).
//!
//! ```rust,ignore
//! let driver = MockDriver::demoqa();
//! driver.navigate("https://demoqa.com/checkbox").await?;
//! ```

mod dom;
pub mod widgets;

pub use dom::{MockDom, MockNode, NodeId};

use crate::driver::{Driver, ElementRef, Key, Screenshot};
use crate::locator::Locator;
use crate::result::{HarnessError, HarnessResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// User interaction delivered to page hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEvent {
    /// Element was clicked (natively or programmatically)
    Click(NodeId),
    /// Element's value changed through typing or clearing
    Input(NodeId),
    /// Key pressed on element
    Key(NodeId, Key),
}

/// Widget behaviour reacting to user interaction
pub type EventHook = Box<dyn Fn(&mut MockDom, &MockEvent) + Send + Sync>;

/// Deferred DOM mutation
pub type TimerFn = Box<dyn FnOnce(&mut MockDom) + Send>;

/// A page as installed by a route
#[derive(Default)]
pub struct MockPage {
    /// Initial document
    pub dom: MockDom,
    /// Event hooks
    pub hooks: Vec<EventHook>,
    /// Deferred mutations, relative to page installation
    pub timers: Vec<(Duration, TimerFn)>,
}

impl MockPage {
    /// Page over an existing document
    #[must_use]
    pub fn new(dom: MockDom) -> Self {
        Self {
            dom,
            hooks: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// Add an event hook
    #[must_use]
    pub fn with_hook(
        mut self,
        hook: impl Fn(&mut MockDom, &MockEvent) + Send + Sync + 'static,
    ) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    /// Add a deferred mutation
    #[must_use]
    pub fn with_timer(
        mut self,
        after: Duration,
        timer: impl FnOnce(&mut MockDom) + Send + 'static,
    ) -> Self {
        self.timers.push((after, Box::new(timer)));
        self
    }
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockPage")
            .field("dom", &self.dom)
            .field("hooks", &self.hooks.len())
            .field("timers", &self.timers.len())
            .finish()
    }
}

/// Builds a fresh page each time its route is visited
pub type RouteFn = Arc<dyn Fn() -> MockPage + Send + Sync>;

struct MockState {
    url: String,
    dom: MockDom,
    generation: u64,
    hooks: Vec<EventHook>,
    timers: Vec<(Instant, TimerFn)>,
    routes: Vec<(String, RouteFn)>,
    history: Vec<String>,
    failures: HashMap<String, u32>,
    js_results: VecDeque<Value>,
    screenshot: Vec<u8>,
    alive: bool,
}

impl MockState {
    fn tick(&mut self) {
        let now = Instant::now();
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.timers)
            .into_iter()
            .partition(|(at, _)| *at <= now);
        self.timers = pending;
        let mut due = due;
        due.sort_by_key(|(at, _)| *at);
        for (_, timer) in due {
            timer(&mut self.dom);
        }
    }

    fn install(&mut self, url: &str) {
        let path = path_of(url);
        let route = self
            .routes
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, r)| Arc::clone(r));
        let page = route.map_or_else(MockPage::default, |build| build());
        let now = Instant::now();
        self.url = url.to_string();
        self.dom = page.dom;
        self.hooks = page.hooks;
        self.timers = page
            .timers
            .into_iter()
            .map(|(after, timer)| (now + after, timer))
            .collect();
        self.generation += 1;
    }

    fn element_ref(&self, node: NodeId) -> ElementRef {
        ElementRef::new(format!("{}:{node}", self.generation))
    }

    fn resolve(&self, element: &ElementRef) -> HarnessResult<NodeId> {
        let stale = || HarnessError::StaleElement {
            id: element.id().to_string(),
        };
        let (generation, node) = element.id().split_once(':').ok_or_else(stale)?;
        let node: NodeId = node.parse().map_err(|_| stale())?;
        if generation != self.generation.to_string() || !self.dom.is_attached(node) {
            return Err(stale());
        }
        Ok(node)
    }

    fn fire(&mut self, event: &MockEvent) {
        for hook in &self.hooks {
            hook(&mut self.dom, event);
        }
    }

    fn obscured_by(&self, node: NodeId) -> Option<String> {
        std::iter::once(node)
            .chain(self.dom.ancestors(node))
            .filter_map(|n| self.dom.attr(n, "data-obscured-by"))
            .find(|overlay| self.dom.by_id(overlay).is_some())
            .map(str::to_string)
    }

    /// Default action of a click: labels forward to their control, controls toggle, links navigate
    fn activate(&mut self, node: NodeId) {
        let tag = self.dom.node(node).map(|n| n.tag.as_str());
        let target = match (tag, self.dom.attr(node, "for")) {
            (Some("label"), Some(for_id)) => self.dom.by_id(for_id).unwrap_or(node),
            _ => node,
        };
        let kind = self.dom.attr(target, "type").map(str::to_string);
        match kind.as_deref() {
            Some("radio") => {
                let name = self.dom.attr(target, "name").map(str::to_string);
                if let Some(name) = name {
                    let group = self
                        .dom
                        .find(self.dom.root(), &Locator::css_owned(format!("input[name='{name}']")))
                        .unwrap_or_default();
                    for radio in group {
                        self.dom.set_prop(radio, "checked", false);
                    }
                }
                self.dom.set_prop(target, "checked", true);
            }
            Some("checkbox") => {
                let checked = self.dom.prop_bool(target, "checked");
                self.dom.set_prop(target, "checked", !checked);
            }
            _ => {}
        }

        self.fire(&MockEvent::Click(node));

        let href = std::iter::once(node)
            .chain(self.dom.ancestors(node))
            .find_map(|n| self.dom.attr(n, "data-href"))
            .map(str::to_string);
        if let Some(href) = href {
            let url = join_url(&self.url, &href);
            self.install(&url);
        }
    }
}

/// Mock driver for unit and integration testing
pub struct MockDriver {
    state: Mutex<MockState>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockDriver")
            .field("url", &state.url)
            .field("alive", &state.alive)
            .field("calls", &state.history.len())
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    /// Create new mock driver on a blank page
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                url: "about:blank".to_string(),
                dom: MockDom::new(),
                generation: 0,
                hooks: Vec::new(),
                timers: Vec::new(),
                routes: Vec::new(),
                history: Vec::new(),
                failures: HashMap::new(),
                js_results: VecDeque::new(),
                screenshot: crate::driver::PNG_SIGNATURE.to_vec(),
                alive: true,
            }),
        }
    }

    /// Mock driver serving the DemoQA pages with default widget options
    #[must_use]
    pub fn demoqa() -> Self {
        Self::demoqa_with(&widgets::SiteOptions::default())
    }

    /// Mock driver serving the DemoQA pages with custom widget options
    #[must_use]
    pub fn demoqa_with(options: &widgets::SiteOptions) -> Self {
        let driver = Self::new();
        widgets::install_demoqa(&driver, options);
        driver
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a page for a URL path (e.g. `/checkbox`, `/` for the home page)
    pub fn route(&self, path: &str, build: impl Fn() -> MockPage + Send + Sync + 'static) {
        let path = normalise_path(path);
        let mut state = self.lock();
        state.routes.retain(|(p, _)| *p != path);
        state.routes.push((path, Arc::new(build)));
    }

    /// Replace the current document directly
    pub fn load(&self, page: MockPage) {
        let mut state = self.lock();
        let now = Instant::now();
        state.dom = page.dom;
        state.hooks = page.hooks;
        state.timers = page
            .timers
            .into_iter()
            .map(|(after, timer)| (now + after, timer))
            .collect();
        state.generation += 1;
    }

    /// Run a closure against the current document
    pub fn with_dom<T>(&self, f: impl FnOnce(&mut MockDom) -> T) -> T {
        let mut state = self.lock();
        state.tick();
        f(&mut state.dom)
    }

    /// Make the next `times` calls of `operation` fail with a driver error
    pub fn fail_next(&self, operation: &str, times: u32) {
        self.lock().failures.insert(operation.to_string(), times);
    }

    /// Queue a result for `execute_script`
    pub fn push_js_result(&self, value: Value) {
        self.lock().js_results.push_back(value);
    }

    /// Set the bytes returned by `screenshot`
    pub fn set_screenshot(&self, data: Vec<u8>) {
        self.lock().screenshot = data;
    }

    /// Simulate a crashed browser: every later call fails with `SessionDead`
    pub fn crash(&self) {
        self.lock().alive = false;
    }

    /// Whether the session is still usable
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.lock().alive
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.lock().history.clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.count_calls(method) > 0
    }

    /// Number of recorded calls of `method`
    #[must_use]
    pub fn count_calls(&self, method: &str) -> usize {
        let prefix = format!("{method}:");
        self.lock()
            .history
            .iter()
            .filter(|c| c.as_str() == method || c.starts_with(&prefix))
            .count()
    }

    /// Forget recorded calls
    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    /// Common prologue: liveness, timers, injected failures, history
    fn call<T>(
        &self,
        operation: &str,
        detail: impl fmt::Display,
        f: impl FnOnce(&mut MockState) -> HarnessResult<T>,
    ) -> HarnessResult<T> {
        let mut state = self.lock();
        if !state.alive {
            return Err(HarnessError::SessionDead {
                message: format!("{operation} on a closed session"),
            });
        }
        state.history.push(format!("{operation}:{detail}"));
        state.tick();
        if let Some(remaining) = state.failures.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(HarnessError::driver(format!("injected {operation} failure")));
            }
        }
        f(&mut *state)
    }
}

fn normalise_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Path component of an absolute URL, without query or fragment
fn path_of(url: &str) -> String {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = without_scheme
        .find('/')
        .map_or("/", |i| &without_scheme[i..]);
    let path = path.split(['?', '#']).next().unwrap_or("/");
    normalise_path(path)
}

fn join_url(current: &str, href: &str) -> String {
    if href.contains("://") {
        return href.to_string();
    }
    let origin = current
        .split_once("://")
        .map(|(scheme, rest)| {
            let host = rest.split('/').next().unwrap_or(rest);
            format!("{scheme}://{host}")
        })
        .unwrap_or_default();
    format!("{origin}{}", normalise_path(href))
}

fn is_valid_value(dom: &MockDom, node: NodeId) -> bool {
    if dom.prop_bool(node, "invalid") {
        return false;
    }
    let value = dom.attr(node, "value").unwrap_or("");
    let required = dom.attr(node, "required").is_some();
    if dom.attr(node, "type") == Some("radio") {
        if !required {
            return true;
        }
        let Some(name) = dom.attr(node, "name") else {
            return dom.prop_bool(node, "checked");
        };
        let group = dom
            .find(dom.root(), &Locator::css_owned(format!("input[name='{name}']")))
            .unwrap_or_default();
        return group.iter().any(|r| dom.prop_bool(*r, "checked"));
    }
    if value.is_empty() {
        return !required;
    }
    if let Some(min) = dom.attr(node, "minlength").and_then(|m| m.parse::<usize>().ok()) {
        if value.chars().count() < min {
            return false;
        }
    }
    if let Some(pattern) = dom.attr(node, "pattern") {
        if let Ok(re) = regex::Regex::new(&format!("^(?:{pattern})$")) {
            if !re.is_match(value) {
                return false;
            }
        }
    }
    if dom.attr(node, "type") == Some("email") && !value.contains('@') {
        return false;
    }
    true
}

pub(crate) fn is_invalid_control(dom: &MockDom, node: NodeId) -> bool {
    !is_valid_value(dom, node)
}

#[async_trait]
impl Driver for MockDriver {
    async fn navigate(&self, url: &str) -> HarnessResult<()> {
        self.call("navigate", url, |state| {
            state.install(url);
            Ok(())
        })
    }

    async fn current_url(&self) -> HarnessResult<String> {
        self.call("current_url", "", |state| Ok(state.url.clone()))
    }

    async fn ready_state(&self) -> HarnessResult<String> {
        self.call("ready_state", "", |state| Ok(state.dom.ready_state.clone()))
    }

    async fn refresh(&self) -> HarnessResult<()> {
        self.call("refresh", "", |state| {
            let url = state.url.clone();
            state.install(&url);
            Ok(())
        })
    }

    async fn find_all(&self, locator: &Locator) -> HarnessResult<Vec<ElementRef>> {
        self.call("find_all", locator, |state| {
            let root = state.dom.root();
            let nodes = state.dom.find(root, locator)?;
            Ok(nodes.into_iter().map(|n| state.element_ref(n)).collect())
        })
    }

    async fn find_within(
        &self,
        scope: &ElementRef,
        locator: &Locator,
    ) -> HarnessResult<Vec<ElementRef>> {
        self.call("find_within", locator, |state| {
            let scope = state.resolve(scope)?;
            let nodes = state.dom.find(scope, locator)?;
            Ok(nodes.into_iter().map(|n| state.element_ref(n)).collect())
        })
    }

    async fn parent(&self, element: &ElementRef) -> HarnessResult<Option<ElementRef>> {
        self.call("parent", element, |state| {
            let node = state.resolve(element)?;
            let parent = state.dom.node(node).and_then(|n| n.parent);
            Ok(parent
                .filter(|p| *p != state.dom.root())
                .map(|p| state.element_ref(p)))
        })
    }

    async fn children(&self, element: &ElementRef) -> HarnessResult<Vec<ElementRef>> {
        self.call("children", element, |state| {
            let node = state.resolve(element)?;
            let children = state.dom.node(node).map(|n| n.children.clone()).unwrap_or_default();
            Ok(children.into_iter().map(|c| state.element_ref(c)).collect())
        })
    }

    async fn tag_name(&self, element: &ElementRef) -> HarnessResult<String> {
        self.call("tag_name", element, |state| {
            let node = state.resolve(element)?;
            Ok(state.dom.node(node).map(|n| n.tag.clone()).unwrap_or_default())
        })
    }

    async fn text(&self, element: &ElementRef) -> HarnessResult<String> {
        self.call("text", element, |state| {
            let node = state.resolve(element)?;
            Ok(state.dom.rendered_text(node))
        })
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> HarnessResult<Option<String>> {
        self.call("attribute", name, |state| {
            let node = state.resolve(element)?;
            Ok(state.dom.attr(node, name).map(str::to_string))
        })
    }

    async fn property(&self, element: &ElementRef, name: &str) -> HarnessResult<Value> {
        self.call("property", name, |state| {
            let node = state.resolve(element)?;
            Ok(match name {
                "value" => Value::String(state.dom.attr(node, "value").unwrap_or("").to_string()),
                "checked" | "indeterminate" => Value::Bool(state.dom.prop_bool(node, name)),
                _ => state.dom.prop(node, name),
            })
        })
    }

    async fn css_value(&self, element: &ElementRef, name: &str) -> HarnessResult<String> {
        self.call("css_value", name, |state| {
            let node = state.resolve(element)?;
            Ok(state.dom.style(node, name))
        })
    }

    async fn is_displayed(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.call("is_displayed", element, |state| {
            let node = state.resolve(element)?;
            Ok(state.dom.is_displayed(node))
        })
    }

    async fn is_enabled(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.call("is_enabled", element, |state| {
            let node = state.resolve(element)?;
            Ok(state.dom.attr(node, "disabled").is_none())
        })
    }

    async fn is_selected(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.call("is_selected", element, |state| {
            let node = state.resolve(element)?;
            Ok(state.dom.prop_bool(node, "checked"))
        })
    }

    async fn is_invalid(&self, element: &ElementRef) -> HarnessResult<bool> {
        self.call("is_invalid", element, |state| {
            let node = state.resolve(element)?;
            Ok(is_invalid_control(&state.dom, node))
        })
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> HarnessResult<()> {
        self.call("scroll_into_view", element, |state| state.resolve(element).map(|_| ()))
    }

    async fn click(&self, element: &ElementRef) -> HarnessResult<()> {
        self.call("click", element, |state| {
            let node = state.resolve(element)?;
            if !state.dom.is_displayed(node) {
                return Err(HarnessError::NotInteractable {
                    locator: element.to_string(),
                    message: "element is not displayed".to_string(),
                });
            }
            if let Some(overlay) = state.obscured_by(node) {
                return Err(HarnessError::ClickIntercepted {
                    locator: element.to_string(),
                    intercepted_by: format!("#{overlay}"),
                });
            }
            if state.dom.attr(node, "disabled").is_some() {
                return Err(HarnessError::NotInteractable {
                    locator: element.to_string(),
                    message: "element is disabled".to_string(),
                });
            }
            state.activate(node);
            Ok(())
        })
    }

    async fn js_click(&self, element: &ElementRef) -> HarnessResult<()> {
        self.call("js_click", element, |state| {
            let node = state.resolve(element)?;
            state.activate(node);
            Ok(())
        })
    }

    async fn clear(&self, element: &ElementRef) -> HarnessResult<()> {
        self.call("clear", element, |state| {
            let node = state.resolve(element)?;
            state.dom.set_attr(node, "value", "");
            state.fire(&MockEvent::Input(node));
            Ok(())
        })
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> HarnessResult<()> {
        self.call("send_keys", text, |state| {
            let node = state.resolve(element)?;
            let replace = state.dom.prop_bool(node, "all_selected");
            let mut value = if replace {
                String::new()
            } else {
                state.dom.attr(node, "value").unwrap_or("").to_string()
            };
            value.push_str(text);
            let max_length =
                state.dom.attr(node, "maxlength").and_then(|m| m.parse::<usize>().ok());
            if let Some(max) = max_length {
                value = value.chars().take(max).collect();
            }
            state.dom.set_attr(node, "value", &value);
            state.dom.set_prop(node, "all_selected", false);
            state.fire(&MockEvent::Input(node));
            Ok(())
        })
    }

    async fn press_key(&self, element: &ElementRef, key: Key) -> HarnessResult<()> {
        self.call("press_key", key.name(), |state| {
            let node = state.resolve(element)?;
            if key == Key::SelectAll {
                state.dom.set_prop(node, "all_selected", true);
            }
            state.fire(&MockEvent::Key(node, key));
            Ok(())
        })
    }

    async fn remove_elements(&self, ids: &[&str]) -> HarnessResult<()> {
        self.call("remove_elements", ids.join(","), |state| {
            for id in ids {
                if let Some(node) = state.dom.by_id(id) {
                    state.dom.detach(node);
                }
            }
            Ok(())
        })
    }

    async fn execute_script(&self, script: &str) -> HarnessResult<Value> {
        self.call("execute_script", script, |state| {
            Ok(state.js_results.pop_front().unwrap_or(Value::Null))
        })
    }

    async fn screenshot(&self) -> HarnessResult<Screenshot> {
        self.call("screenshot", "", |state| {
            if state.screenshot.is_empty() {
                return Err(HarnessError::Screenshot {
                    message: "no mock screenshot set".to_string(),
                });
            }
            Ok(Screenshot::new(state.screenshot.clone()))
        })
    }

    async fn close(&self) -> HarnessResult<()> {
        self.call("close", "", |state| {
            state.alive = false;
            Ok(())
        })
    }

    async fn force_close(&self) -> HarnessResult<()> {
        let mut state = self.lock();
        state.history.push("force_close:".to_string());
        state.alive = false;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn page_with_button() -> MockPage {
        let mut dom = MockDom::new();
        let body = dom.body();
        dom.append_text(body, "button", &[("id", "go"), ("data-obscured-by", "fixedban")], "Go");
        dom.append(body, "div", &[("id", "fixedban")]);
        MockPage::new(dom)
    }

    mod navigation {
        use super::*;

        #[tokio::test]
        async fn test_routes_install_pages() {
            let driver = MockDriver::new();
            driver.route("/checkbox", || {
                let mut dom = MockDom::new();
                let body = dom.body();
                dom.append_text(body, "h1", &[], "Check Box");
                MockPage::new(dom)
            });

            driver.navigate("https://demoqa.com/checkbox?x=1").await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://demoqa.com/checkbox?x=1");
            let found = driver.find_all(&Locator::css("h1")).await.unwrap();
            assert_eq!(found.len(), 1);
        }

        #[tokio::test]
        async fn test_links_navigate() {
            let driver = MockDriver::new();
            driver.route("/", || {
                let mut dom = MockDom::new();
                let body = dom.body();
                dom.append_text(body, "h5", &[("data-href", "/elements")], "Elements");
                MockPage::new(dom)
            });
            driver.navigate("https://demoqa.com").await.unwrap();
            let card = driver.find_all(&Locator::css("h5")).await.unwrap();
            driver.click(&card[0]).await.unwrap();
            assert_eq!(driver.current_url().await.unwrap(), "https://demoqa.com/elements");
        }

        #[tokio::test]
        async fn test_refs_go_stale_after_navigation() {
            let driver = MockDriver::new();
            driver.load(page_with_button());
            let button = driver.find_all(&Locator::id("go")).await.unwrap();
            driver.refresh().await.unwrap();
            let err = driver.text(&button[0]).await.unwrap_err();
            assert!(matches!(err, HarnessError::StaleElement { .. }));
        }
    }

    mod interaction {
        use super::*;

        #[tokio::test]
        async fn test_overlay_intercepts_native_click_only() {
            let driver = MockDriver::new();
            driver.load(page_with_button());
            let button = driver.find_all(&Locator::id("go")).await.unwrap().remove(0);

            let err = driver.click(&button).await.unwrap_err();
            assert!(matches!(err, HarnessError::ClickIntercepted { .. }));
            driver.js_click(&button).await.unwrap();

            driver.remove_elements(&["fixedban", "adplus-anchor"]).await.unwrap();
            driver.click(&button).await.unwrap();
        }

        #[tokio::test]
        async fn test_send_keys_respects_maxlength() {
            let driver = MockDriver::new();
            let mut dom = MockDom::new();
            let body = dom.body();
            dom.append(body, "input", &[("id", "userNumber"), ("maxlength", "10")]);
            driver.load(MockPage::new(dom));

            let input = driver.find_all(&Locator::id("userNumber")).await.unwrap().remove(0);
            driver.send_keys(&input, "012345678901234").await.unwrap();
            assert_eq!(driver.property(&input, "value").await.unwrap(), "0123456789");

            driver.press_key(&input, Key::SelectAll).await.unwrap();
            driver.send_keys(&input, "99").await.unwrap();
            assert_eq!(driver.attribute(&input, "value").await.unwrap().as_deref(), Some("99"));
        }

        #[tokio::test]
        async fn test_label_forwards_to_radio() {
            let driver = MockDriver::new();
            let mut dom = MockDom::new();
            let body = dom.body();
            dom.append(body, "input", &[("id", "r1"), ("type", "radio"), ("name", "gender")]);
            dom.append(body, "input", &[("id", "r2"), ("type", "radio"), ("name", "gender")]);
            dom.append_text(body, "label", &[("for", "r2")], "Female");
            driver.load(MockPage::new(dom));

            let label = driver.find_all(&Locator::css("label")).await.unwrap().remove(0);
            driver.js_click(&label).await.unwrap();
            let r2 = driver.find_all(&Locator::id("r2")).await.unwrap().remove(0);
            let r1 = driver.find_all(&Locator::id("r1")).await.unwrap().remove(0);
            assert!(driver.is_selected(&r2).await.unwrap());
            assert!(!driver.is_selected(&r1).await.unwrap());
        }

        #[tokio::test]
        async fn test_validity() {
            let driver = MockDriver::new();
            let mut dom = MockDom::new();
            let body = dom.body();
            dom.append(
                body,
                "input",
                &[("id", "n"), ("required", ""), ("minlength", "10"), ("pattern", "\\d*")],
            );
            driver.load(MockPage::new(dom));
            let input = driver.find_all(&Locator::id("n")).await.unwrap().remove(0);

            assert!(driver.is_invalid(&input).await.unwrap());
            driver.send_keys(&input, "12ab").await.unwrap();
            assert!(driver.is_invalid(&input).await.unwrap());
            driver.clear(&input).await.unwrap();
            driver.send_keys(&input, "0123456789").await.unwrap();
            assert!(!driver.is_invalid(&input).await.unwrap());
        }
    }

    mod lifecycle {
        use super::*;

        #[tokio::test]
        async fn test_timers_fire_on_later_calls() {
            let driver = MockDriver::new();
            let page = MockPage::new(MockDom::new()).with_timer(Duration::from_millis(20), |dom| {
                let body = dom.body();
                dom.append(body, "button", &[("id", "visibleAfter")]);
            });
            driver.load(page);

            assert!(driver.find_all(&Locator::id("visibleAfter")).await.unwrap().is_empty());
            tokio::time::sleep(Duration::from_millis(30)).await;
            assert_eq!(driver.find_all(&Locator::id("visibleAfter")).await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_injected_failures_are_consumed() {
            let driver = MockDriver::new();
            driver.fail_next("navigate", 1);
            assert!(driver.navigate("https://demoqa.com").await.is_err());
            assert!(driver.navigate("https://demoqa.com").await.is_ok());
            assert_eq!(driver.count_calls("navigate"), 2);
        }

        #[tokio::test]
        async fn test_crash_and_close() {
            let driver = MockDriver::new();
            driver.crash();
            let err = driver.current_url().await.unwrap_err();
            assert!(err.is_session_failure());
            driver.force_close().await.unwrap();
            assert!(driver.was_called("force_close"));
        }
    }

    #[test]
    fn test_path_helpers() {
        assert_eq!(path_of("https://demoqa.com"), "/");
        assert_eq!(path_of("https://demoqa.com/books?search=git"), "/books");
        assert_eq!(path_of("https://demoqa.com/checkbox/"), "/checkbox");
        assert_eq!(
            join_url("https://demoqa.com/elements", "/checkbox"),
            "https://demoqa.com/checkbox"
        );
    }
}
