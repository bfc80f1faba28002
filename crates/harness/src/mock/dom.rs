//! In-memory DOM for the mock driver.
//!
//! Supports the CSS subset the page locators use: type, `#id`, `.class`,
//! `[attr]`, `[attr='value']`, `:nth-child(n)`, and the descendant and
//! child (`>`) combinators. Text filters from [`Locator`] are applied to the
//! element's `textContent`.

use crate::locator::{Locator, Strategy};
use crate::result::{HarnessError, HarnessResult};
use serde_json::Value;
use std::collections::BTreeMap;

/// Index of a node inside a [`MockDom`]
pub type NodeId = usize;

/// One element of the in-memory document
#[derive(Debug, Clone, Default)]
pub struct MockNode {
    /// Lower-case tag name
    pub tag: String,
    /// Attributes
    pub attrs: BTreeMap<String, String>,
    /// Own text (children's text is not included)
    pub text: String,
    /// Child elements in document order
    pub children: Vec<NodeId>,
    /// Parent element
    pub parent: Option<NodeId>,
    /// `display: none`
    pub hidden: bool,
    /// Removed from the document
    pub detached: bool,
    /// DOM properties (`checked`, `indeterminate`, ...)
    pub props: BTreeMap<String, Value>,
    /// Computed style values
    pub styles: BTreeMap<String, String>,
}

/// In-memory document
#[derive(Debug, Clone)]
pub struct MockDom {
    nodes: Vec<MockNode>,
    body: NodeId,
    /// `document.readyState`
    pub ready_state: String,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    /// Empty document with `<html><body>`
    #[must_use]
    pub fn new() -> Self {
        let html = MockNode {
            tag: "html".to_string(),
            children: vec![1],
            ..MockNode::default()
        };
        let body = MockNode {
            tag: "body".to_string(),
            parent: Some(0),
            ..MockNode::default()
        };
        Self {
            nodes: vec![html, body],
            body: 1,
            ready_state: "complete".to_string(),
        }
    }

    /// Document root (`<html>`)
    #[must_use]
    pub const fn root(&self) -> NodeId {
        0
    }

    /// `<body>`
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Append a new element under `parent`
    pub fn append(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(MockNode {
            tag: tag.to_ascii_lowercase(),
            attrs: attrs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            parent: Some(parent),
            ..MockNode::default()
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Append a new element carrying text
    pub fn append_text(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        let id = self.append(parent, tag, attrs);
        self.nodes[id].text = text.to_string();
        id
    }

    /// Borrow a node
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&MockNode> {
        self.nodes.get(id)
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut MockNode> {
        self.nodes.get_mut(id)
    }

    /// Whether the node is still attached to the document
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.nodes.get(id).is_some_and(|n| !n.detached)
    }

    /// Attribute value
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes.get(id)?.attrs.get(name).map(String::as_str)
    }

    /// Set an attribute
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.attrs.insert(name.to_string(), value.to_string());
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.attrs.remove(name);
        }
    }

    /// Class tokens
    #[must_use]
    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Whether the class list contains `class`
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    /// Add a class token
    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let mut classes: Vec<String> = self.classes(id).into_iter().map(str::to_string).collect();
        classes.push(class.to_string());
        self.set_attr(id, "class", &classes.join(" "));
    }

    /// Remove a class token
    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        let classes: Vec<String> = self
            .classes(id)
            .into_iter()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        self.set_attr(id, "class", &classes.join(" "));
    }

    /// DOM property value (`Null` when unset)
    #[must_use]
    pub fn prop(&self, id: NodeId, name: &str) -> Value {
        self.nodes
            .get(id)
            .and_then(|n| n.props.get(name).cloned())
            .unwrap_or(Value::Null)
    }

    /// Boolean DOM property
    #[must_use]
    pub fn prop_bool(&self, id: NodeId, name: &str) -> bool {
        self.prop(id, name).as_bool().unwrap_or(false)
    }

    /// Set a DOM property
    pub fn set_prop(&mut self, id: NodeId, name: &str, value: impl Into<Value>) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.props.insert(name.to_string(), value.into());
        }
    }

    /// Computed style value (empty when unset)
    #[must_use]
    pub fn style(&self, id: NodeId, name: &str) -> String {
        self.nodes
            .get(id)
            .and_then(|n| n.styles.get(name).cloned())
            .unwrap_or_default()
    }

    /// Set a computed style value
    pub fn set_style(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.styles.insert(name.to_string(), value.to_string());
        }
    }

    /// Replace the node's own text
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.text = text.to_string();
        }
    }

    /// Toggle `display: none`
    pub fn set_hidden(&mut self, id: NodeId, hidden: bool) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.hidden = hidden;
        }
    }

    /// Remove a node and its subtree from the document
    pub fn detach(&mut self, id: NodeId) {
        if !self.is_attached(id) || id == self.root() {
            return;
        }
        if let Some(parent) = self.nodes[id].parent {
            self.nodes[parent].children.retain(|c| *c != id);
        }
        for node in self.subtree(id) {
            self.nodes[node].detached = true;
        }
    }

    /// Remove every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        let children = self.nodes.get(id).map(|n| n.children.clone()).unwrap_or_default();
        for child in children {
            self.detach(child);
        }
    }

    /// Node and all descendants in pre-order
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// First attached element with the given id attribute
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.subtree(self.root())
            .into_iter()
            .find(|n| self.attr(*n, "id") == Some(id))
    }

    /// Ancestors from parent to root
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(p) = current {
            out.push(p);
            current = self.nodes[p].parent;
        }
        out
    }

    /// Concatenated text of the subtree (`textContent`)
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.subtree(id)
            .into_iter()
            .map(|n| self.nodes[n].text.as_str())
            .collect()
    }

    /// Visible text of the subtree, one line per text-bearing element (`innerText`)
    #[must_use]
    pub fn rendered_text(&self, id: NodeId) -> String {
        if !self.is_displayed(id) {
            return String::new();
        }
        self.subtree(id)
            .into_iter()
            .filter(|n| {
                !self.nodes[*n].hidden
                    && self.ancestors_until(*n, id).iter().all(|a| !self.nodes[*a].hidden)
            })
            .map(|n| self.nodes[n].text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn ancestors_until(&self, id: NodeId, stop: NodeId) -> Vec<NodeId> {
        self.ancestors(id).into_iter().take_while(|a| *a != stop).collect()
    }

    /// Attached and neither the node nor an ancestor is hidden
    #[must_use]
    pub fn is_displayed(&self, id: NodeId) -> bool {
        self.is_attached(id)
            && !self.nodes[id].hidden
            && self.ancestors(id).iter().all(|a| !self.nodes[*a].hidden)
    }

    /// Elements below `scope` matching `locator`, in document order
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::Unsupported`] for XPath locators or CSS outside the
    /// supported subset.
    pub fn find(&self, scope: NodeId, locator: &Locator) -> HarnessResult<Vec<NodeId>> {
        let selector = match locator.strategy() {
            Strategy::Css => parse_selector(locator.value())?,
            Strategy::Id => vec![(
                Combinator::Descendant,
                Compound {
                    id: Some(locator.value().to_string()),
                    ..Compound::default()
                },
            )],
            Strategy::XPath => {
                return Err(HarnessError::unsupported(format!(
                    "mock DOM does not evaluate XPath ({locator})"
                )))
            }
        };
        Ok(self
            .subtree(scope)
            .into_iter()
            .skip(1)
            .filter(|n| self.matches_complex(*n, &selector, selector.len() - 1))
            .filter(|n| {
                locator
                    .text_match()
                    .map_or(true, |m| m.matches(&self.text_content(*n)))
            })
            .collect())
    }

    fn matches_complex(&self, node: NodeId, parts: &[(Combinator, Compound)], idx: usize) -> bool {
        if !self.matches_compound(node, &parts[idx].1) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match parts[idx].0 {
            Combinator::Child => self.nodes[node]
                .parent
                .is_some_and(|p| self.matches_complex(p, parts, idx - 1)),
            Combinator::Descendant => self
                .ancestors(node)
                .into_iter()
                .any(|a| self.matches_complex(a, parts, idx - 1)),
        }
    }

    fn matches_compound(&self, node: NodeId, compound: &Compound) -> bool {
        let n = &self.nodes[node];
        if let Some(tag) = &compound.tag {
            if tag != "*" && !n.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &compound.id {
            if n.attrs.get("id") != Some(id) {
                return false;
            }
        }
        if !compound.classes.iter().all(|c| self.has_class(node, c)) {
            return false;
        }
        for (name, value) in &compound.attrs {
            match (n.attrs.get(name), value) {
                (None, _) => return false,
                (Some(actual), Some(expected)) if actual != expected => return false,
                _ => {}
            }
        }
        if let Some(position) = compound.nth_child {
            let index = n
                .parent
                .and_then(|p| self.nodes[p].children.iter().position(|c| *c == node));
            if index.map(|i| i + 1) != Some(position) {
                return false;
            }
        }
        true
    }
}

// =============================================================================
// CSS SUBSET
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    nth_child: Option<usize>,
}

fn unsupported(selector: &str, reason: &str) -> HarnessError {
    HarnessError::unsupported(format!("selector '{selector}': {reason}"))
}

/// Split on top-level whitespace and `>`, respecting brackets and quotes
fn tokenize(selector: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                current.push(ch);
            }
            (None, '[' | '(') => {
                depth += 1;
                current.push(ch);
            }
            (None, ']' | ')') => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            (None, c) if depth == 0 && (c.is_whitespace() || c == '>') => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                if c == '>' {
                    tokens.push(">".to_string());
                }
            }
            (None, c) => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_selector(selector: &str) -> HarnessResult<Vec<(Combinator, Compound)>> {
    let mut parts = Vec::new();
    let mut pending = Combinator::Descendant;
    for token in tokenize(selector) {
        if token == ">" {
            pending = Combinator::Child;
            continue;
        }
        parts.push((pending, parse_compound(selector, &token)?));
        pending = Combinator::Descendant;
    }
    if parts.is_empty() {
        return Err(unsupported(selector, "empty selector"));
    }
    Ok(parts)
}

fn parse_compound(selector: &str, token: &str) -> HarnessResult<Compound> {
    let mut compound = Compound::default();
    let chars: Vec<char> = token.chars().collect();
    let mut i = 0;

    let read_ident = |start: usize| -> (String, usize) {
        let mut end = start;
        while end < chars.len()
            && (chars[end].is_alphanumeric() || matches!(chars[end], '-' | '_' | '*'))
        {
            end += 1;
        }
        (chars[start..end].iter().collect(), end)
    };

    if i < chars.len() && (chars[i].is_alphabetic() || chars[i] == '*') {
        let (tag, end) = read_ident(i);
        compound.tag = Some(tag.to_ascii_lowercase());
        i = end;
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                let (id, end) = read_ident(i + 1);
                compound.id = Some(id);
                i = end;
            }
            '.' => {
                let (class, end) = read_ident(i + 1);
                compound.classes.push(class);
                i = end;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .map(|p| p + i)
                    .ok_or_else(|| unsupported(selector, "unterminated attribute selector"))?;
                let inner: String = chars[i + 1..close].iter().collect();
                compound.attrs.push(match inner.split_once('=') {
                    Some((name, value)) => {
                        if name.ends_with(['~', '|', '^', '$', '*']) {
                            return Err(unsupported(
                                selector,
                                "only [attr=value] matching is supported",
                            ));
                        }
                        let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
                        (name.trim().to_string(), Some(value.to_string()))
                    }
                    None => (inner.trim().to_string(), None),
                });
                i = close + 1;
            }
            ':' => {
                let rest: String = chars[i..].iter().collect();
                let Some(arg) = rest
                    .strip_prefix(":nth-child(")
                    .and_then(|r| r.split_once(')'))
                    .map(|(n, _)| n.trim().to_string())
                else {
                    return Err(unsupported(selector, "only :nth-child(n) is supported"));
                };
                let n = arg
                    .parse()
                    .map_err(|_| unsupported(selector, "nth-child needs an integer"))?;
                compound.nth_child = Some(n);
                i += ":nth-child(".len() + arg.len() + 1;
            }
            other => {
                return Err(unsupported(selector, &format!("unexpected character '{other}'")));
            }
        }
    }
    Ok(compound)
}
