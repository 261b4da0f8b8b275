//! DOM access seam.

use std::collections::BTreeMap;

/// Stable handle for an element within one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub usize);

/// Snapshot of an element at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub key: NodeKey,
    pub tag: String,
    /// Rendered text content.
    pub text: String,
    pub attrs: BTreeMap<String, String>,
    /// `href` property: set for anchors with an `href`, resolved to an absolute URL.
    pub href: Option<String>,
    /// `src` property: set for elements with a `src`, resolved to an absolute URL.
    pub src: Option<String>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Opening tag with attributes, for logs.
    pub fn describe(&self) -> String {
        let attrs: Vec<String> = self
            .attrs
            .iter()
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect();
        if attrs.is_empty() {
            format!("<{}>", self.tag)
        } else {
            format!("<{} {}>", self.tag, attrs.join(" "))
        }
    }
}

/// What the page agent needs from a page.
///
/// Queries take CSS selectors. A selector that does not parse behaves like one
/// that matches nothing; implementations never panic on page content.
pub trait PageDom {
    /// Current absolute location.
    fn location(&self) -> String;
    /// Current document title.
    fn title(&self) -> String;
    /// First match in document order.
    fn query(&self, selector: &str) -> Option<Element>;
    /// All matches in document order.
    fn query_all(&self, selector: &str) -> Vec<Element>;
    /// `element` itself or its nearest ancestor matching `selector`.
    fn closest(&self, element: &Element, selector: &str) -> Option<Element>;
    fn click(&mut self, element: &Element);
    fn navigate(&mut self, href: &str);
    fn history_back(&mut self);
    /// Yes/no prompt to the user.
    fn confirm(&mut self, message: &str) -> bool;
}
