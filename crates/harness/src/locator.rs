//! Element locators.
//!
//! A [`Locator`] is an immutable strategy + selector pair, optionally
//! narrowed by the element's trimmed text. Static locators are `const`;
//! locators parameterised by a label are built at call time.

use std::borrow::Cow;
use std::fmt;

/// How the selector string is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// CSS selector
    Css,
    /// XPath expression
    XPath,
    /// Element id
    Id,
}

impl Strategy {
    /// Prefix used when rendering the locator
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::XPath => "xpath",
            Self::Id => "id",
        }
    }
}

/// Text filter applied after the selector matched
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextMatch {
    /// Trimmed text equals the value
    Exact(Cow<'static, str>),
    /// Text contains the value
    Contains(Cow<'static, str>),
}

impl TextMatch {
    /// Check an element's text against this filter
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        match self {
            Self::Exact(expected) => text.trim() == expected.as_ref(),
            Self::Contains(fragment) => text.contains(fragment.as_ref()),
        }
    }

    fn js_predicate(&self) -> String {
        match self {
            Self::Exact(t) => format!("(el.textContent || '').trim() === {:?}", t.as_ref()),
            Self::Contains(t) => format!("(el.textContent || '').includes({:?})", t.as_ref()),
        }
    }
}

/// Descriptor identifying zero or more elements
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    strategy: Strategy,
    value: Cow<'static, str>,
    text: Option<TextMatch>,
}

impl Locator {
    /// CSS selector locator
    #[must_use]
    pub const fn css(selector: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            value: Cow::Borrowed(selector),
            text: None,
        }
    }

    /// XPath locator
    #[must_use]
    pub const fn xpath(expression: &'static str) -> Self {
        Self {
            strategy: Strategy::XPath,
            value: Cow::Borrowed(expression),
            text: None,
        }
    }

    /// Element id locator
    #[must_use]
    pub const fn id(id: &'static str) -> Self {
        Self {
            strategy: Strategy::Id,
            value: Cow::Borrowed(id),
            text: None,
        }
    }

    /// CSS selector narrowed to elements whose trimmed text equals `text`
    #[must_use]
    pub const fn css_with_text(selector: &'static str, text: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            value: Cow::Borrowed(selector),
            text: Some(TextMatch::Exact(Cow::Borrowed(text))),
        }
    }

    /// CSS selector narrowed to elements whose text contains `fragment`
    #[must_use]
    pub const fn css_containing(selector: &'static str, fragment: &'static str) -> Self {
        Self {
            strategy: Strategy::Css,
            value: Cow::Borrowed(selector),
            text: Some(TextMatch::Contains(Cow::Borrowed(fragment))),
        }
    }

    /// CSS selector built at runtime
    #[must_use]
    pub fn css_owned(selector: impl Into<Cow<'static, str>>) -> Self {
        Self {
            strategy: Strategy::Css,
            value: selector.into(),
            text: None,
        }
    }

    /// Narrow to elements whose trimmed text equals `text`
    #[must_use]
    pub fn with_text(mut self, text: impl Into<Cow<'static, str>>) -> Self {
        self.text = Some(TextMatch::Exact(text.into()));
        self
    }

    /// Narrow to elements whose text contains `fragment`
    #[must_use]
    pub fn containing(mut self, fragment: impl Into<Cow<'static, str>>) -> Self {
        self.text = Some(TextMatch::Contains(fragment.into()));
        self
    }

    /// Selector strategy
    #[must_use]
    pub const fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Raw selector string
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Text filter, if any
    #[must_use]
    pub const fn text_match(&self) -> Option<&TextMatch> {
        self.text.as_ref()
    }

    /// JavaScript expression returning an array of matching elements below `scope`
    ///
    /// `scope` is a JavaScript expression evaluating to a node (`document` or an element).
    #[must_use]
    pub fn to_query_all(&self, scope: &str) -> String {
        let base = match self.strategy {
            Strategy::Css => format!("Array.from({scope}.querySelectorAll({:?}))", self.value()),
            Strategy::Id => format!(
                "Array.from({scope}.querySelectorAll({:?}))",
                format!("[id=\"{}\"]", self.value())
            ),
            Strategy::XPath => format!(
                "(() => {{ const r = document.evaluate({:?}, {scope}, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) {{ out.push(r.snapshotItem(i)); }} \
                 return out; }})()",
                self.value()
            ),
        };
        match &self.text {
            Some(filter) => format!("{base}.filter(el => {})", filter.js_predicate()),
            None => base,
        }
    }

    /// JavaScript expression counting matches in the whole document
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("{}.length", self.to_query_all("document"))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.strategy.prefix(), self.value)?;
        match &self.text {
            Some(TextMatch::Exact(t)) => write!(f, " [text={t:?}]"),
            Some(TextMatch::Contains(t)) => write!(f, " [text*={t:?}]"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    const RESULT: Locator = Locator::id("result");
    const SUBMIT: Locator = Locator::css_with_text("button", "Submit");

    mod construction {
        use super::*;

        #[test]
        fn test_const_locators() {
            assert_eq!(RESULT.strategy(), Strategy::Id);
            assert_eq!(RESULT.value(), "result");
            assert!(RESULT.text_match().is_none());
            assert_eq!(
                SUBMIT.text_match(),
                Some(&TextMatch::Exact(Cow::Borrowed("Submit")))
            );
        }

        #[test]
        fn test_runtime_locator_with_owned_text() {
            let name = String::from("Desktop");
            let locator = Locator::css("span.rct-title").with_text(name);
            assert_eq!(locator.to_string(), "css=span.rct-title [text=\"Desktop\"]");
        }

        #[test]
        fn test_display() {
            assert_eq!(RESULT.to_string(), "id=result");
            assert_eq!(
                Locator::css_containing("span.text", "Broken Links").to_string(),
                "css=span.text [text*=\"Broken Links\"]"
            );
        }
    }

    mod text_match {
        use super::*;

        #[test]
        fn test_exact_trims() {
            let m = TextMatch::Exact(Cow::Borrowed("Home"));
            assert!(m.matches("  Home\n"));
            assert!(!m.matches("Homework"));
        }

        #[test]
        fn test_contains() {
            let m = TextMatch::Contains(Cow::Borrowed("Broken Links"));
            assert!(m.matches("Broken Links - Images"));
            assert!(!m.matches("Links"));
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn test_css_query() {
            let q = Locator::css(".rt-tr-group").to_query_all("document");
            assert_eq!(q, "Array.from(document.querySelectorAll(\".rt-tr-group\"))");
        }

        #[test]
        fn test_id_query_uses_attribute_selector() {
            let q = RESULT.to_query_all("document");
            assert!(q.contains("[id=\\\"result\\\"]"));
        }

        #[test]
        fn test_text_filter_query() {
            let q = SUBMIT.to_query_all("el0");
            assert!(q.starts_with("Array.from(el0.querySelectorAll(\"button\"))"));
            assert!(q.contains(".trim() === \"Submit\""));
        }

        #[test]
        fn test_xpath_query_is_scoped() {
            let q = Locator::xpath("./ol/li").to_query_all("scope");
            assert!(q.contains("document.evaluate(\"./ol/li\", scope"));
            assert!(q.contains("snapshotItem"));
        }

        #[test]
        fn test_count_query() {
            let q = Locator::css("span.rct-title").to_count_query();
            assert!(q.ends_with(".length"));
        }
    }
}
