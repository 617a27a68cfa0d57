use crate::error::DomError;
use crate::node::Node;
use crate::selector::Selector;

/// A parsed document: an owned tree under a synthetic `#document` root.
///
/// Queries run from the root, which is never itself a match, so the first
/// element of the markup is the first candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Node,
}

impl Document {
    pub(crate) fn from_root(root: Node) -> Self {
        Self { root }
    }

    /// Shorthand for [`crate::parse`].
    pub fn parse(markup: &str) -> Self {
        crate::parse(markup)
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn into_root(self) -> Node {
        self.root
    }

    /// All elements matching `selector`, in document order.
    ///
    /// ```
    /// let doc = ladle_dom::parse(r#"<div id="x"><h1 class="a b">Hello</h1></div>"#);
    /// let hits = doc.select(".a.b").unwrap();
    /// assert_eq!(hits.len(), 1);
    /// assert_eq!(hits[0].text_content(), "Hello");
    /// assert!(doc.select("###").is_err());
    /// ```
    pub fn select(&self, selector: &str) -> Result<Vec<&Node>, DomError> {
        self.root.select(selector)
    }

    pub fn select_first(&self, selector: &str) -> Result<Option<&Node>, DomError> {
        self.root.select_first(selector)
    }

    /// Run a selector compiled once with [`Selector::parse`].
    pub fn select_with(&self, selector: &Selector) -> Vec<&Node> {
        selector.select(&self.root)
    }

    /// Text of the whole document.
    pub fn text_content(&self) -> String {
        self.root.text_content()
    }
}
