//! Detached view fragments
//!
//! A `Fragment` is the host-agnostic element tree a widget renders into:
//! tag, classes, attributes, text, children. The embedding view layer
//! mounts it (or serializes it to HTML); widget roots are always marked
//! non-editable so the replaced source text cannot be edited through the
//! rendered form.

use std::fmt::Write as _;

// ─────────────────────────────────────────────────────────────────────────────
// Fragment
// ─────────────────────────────────────────────────────────────────────────────

/// One element of a widget's rendered form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    tag: String,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    /// Pre-rendered HTML injected verbatim (used by the comrak-backed
    /// widgets); mutually exclusive with `text` in practice.
    raw_html: Option<String>,
    children: Vec<Fragment>,
}

impl Fragment {
    /// A new element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attrs: Vec::new(),
            text: None,
            raw_html: None,
            children: Vec::new(),
        }
    }

    /// A widget root: a `div` marked non-editable.
    pub fn root(class: impl Into<String>) -> Self {
        Self::new("div")
            .class(class)
            .attr("contenteditable", "false")
    }

    /// Append a CSS class.
    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Set an attribute.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Set the text content (escaped on serialization).
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Inject pre-rendered HTML (NOT escaped on serialization).
    #[must_use]
    pub fn raw_html(mut self, html: impl Into<String>) -> Self {
        self.raw_html = Some(html.into());
        self
    }

    /// Append a child element.
    #[must_use]
    pub fn child(mut self, child: Fragment) -> Self {
        self.children.push(child);
        self
    }

    /// The element's tag.
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// The element's classes.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Look up an attribute value.
    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The child elements.
    pub fn children(&self) -> &[Fragment] {
        &self.children
    }

    /// Depth-first search for a descendant with the given class.
    pub fn find_by_class(&self, class: &str) -> Option<&Fragment> {
        if self.classes.iter().any(|c| c == class) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_class(class))
    }

    /// Serialize to an HTML string.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", html_escape(&self.classes.join(" ")));
        }
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, html_escape(value));
        }
        if self.is_void() {
            out.push_str(">");
            return;
        }
        out.push('>');
        if let Some(text) = &self.text {
            out.push_str(&html_escape(text));
        }
        if let Some(html) = &self.raw_html {
            out.push_str(html);
        }
        for child in &self.children {
            child.write_html(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }

    fn is_void(&self) -> bool {
        matches!(self.tag.as_str(), "hr" | "br" | "input" | "img")
    }
}

/// HTML-escape a string.
pub(crate) fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("Hello"), "Hello");
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("\"quoted\""), "&quot;quoted&quot;");
    }

    #[test]
    fn test_root_is_non_editable() {
        let root = Fragment::root("cm-callout-widget");
        assert_eq!(root.attr_value("contenteditable"), Some("false"));
    }

    #[test]
    fn test_to_html_nesting_and_escaping() {
        let fragment = Fragment::new("div")
            .class("outer")
            .child(Fragment::new("span").text("a < b"));
        assert_eq!(
            fragment.to_html(),
            "<div class=\"outer\"><span>a &lt; b</span></div>"
        );
    }

    #[test]
    fn test_void_elements_do_not_close() {
        let hr = Fragment::new("hr").class("rule");
        assert_eq!(hr.to_html(), "<hr class=\"rule\">");
    }

    #[test]
    fn test_find_by_class() {
        let fragment = Fragment::new("div")
            .child(Fragment::new("div").class("title").text("T"))
            .child(Fragment::new("div").class("body"));
        assert!(fragment.find_by_class("title").is_some());
        assert!(fragment.find_by_class("missing").is_none());
    }
}
