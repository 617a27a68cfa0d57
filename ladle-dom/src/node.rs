//! Owned node tree and its accessors.
//!
//! A [`Node`] is a closed variant over element, text and comment. Children are
//! owned by their parent, so a tree is a plain nested value: no shared
//! ownership, no parent back-links, no cycles. Queries hand out `&Node`
//! borrows tied to the tree's lifetime.

use crate::error::DomError;
use crate::selector::Selector;
use std::fmt;

/// Tag name of the synthetic root a [`crate::Document`] wraps the markup in.
pub const DOCUMENT_TAG: &str = "#document";

/// Discriminant of a [`Node`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Element => "element",
            NodeKind::Text => "text",
            NodeKind::Comment => "comment",
        })
    }
}

/// A single `name="value"` pair. Names are stored lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

pub struct Element {
    name: String,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    /// Build an element. Attributes whose name repeats an earlier one are dropped.
    pub fn new(name: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        let mut deduped: Vec<Attribute> = Vec::with_capacity(attributes.len());
        for attr in attributes {
            if !deduped.iter().any(|a| a.name == attr.name) {
                deduped.push(attr);
            }
        }
        Self {
            name: name.into(),
            attributes: deduped,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Attribute lookup; names compare ASCII case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Whitespace-separated tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Same name and attributes, no children.
    fn shallow_copy(&self) -> Self {
        Self {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            children: Vec::with_capacity(self.children.len()),
        }
    }

    fn subtree(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children.iter()],
        }
    }

    /// Append a child, merging adjacent text.
    pub(crate) fn push_child(&mut self, node: Node) {
        if let Node::Text(more) = &node {
            if let Some(Node::Text(prev)) = self.children.last_mut() {
                prev.push_str(more);
                return;
            }
        }
        self.children.push(node);
    }
}

// Clone, equality, formatting and drop never recurse per tree level.

impl Clone for Element {
    fn clone(&self) -> Self {
        let mut finished = None;
        let mut stack = vec![(self.shallow_copy(), self.children.iter())];
        while let Some((copy, pending)) = stack.last_mut() {
            match pending.next() {
                Some(Node::Element(child)) => {
                    let frame = (child.shallow_copy(), child.children.iter());
                    stack.push(frame);
                }
                Some(Node::Text(t)) => copy.children.push(Node::Text(t.clone())),
                Some(Node::Comment(c)) => copy.children.push(Node::Comment(c.clone())),
                None => {
                    if let Some((done, _)) = stack.pop() {
                        match stack.last_mut() {
                            Some((parent, _)) => parent.children.push(Node::Element(done)),
                            None => finished = Some(done),
                        }
                    }
                }
            }
        }
        finished.unwrap_or_else(|| self.shallow_copy())
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        // Equal pre-order sequences with equal child counts at every node
        // describe the same tree.
        shallow_eq_element(self, other)
            && self
                .subtree()
                .zip(other.subtree())
                .all(|(a, b)| shallow_eq(a, b))
    }
}

impl Eq for Element {}

/// Children are summarised by count.
impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .finish()
    }
}

fn shallow_eq_element(a: &Element, b: &Element) -> bool {
    a.name == b.name && a.attributes == b.attributes && a.children.len() == b.children.len()
}

fn shallow_eq(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Element(x), Node::Element(y)) => shallow_eq_element(x, y),
        (Node::Text(x), Node::Text(y)) | (Node::Comment(x), Node::Comment(y)) => x == y,
        _ => false,
    }
}

impl Drop for Element {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut e) = node {
                pending.append(&mut e.children);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Element(_) => NodeKind::Element,
            Node::Text(_) => NodeKind::Text,
            Node::Comment(_) => NodeKind::Comment,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Node::Element(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    /// The element's tag name.
    ///
    /// ```
    /// use ladle_dom::{DomError, Node, NodeKind};
    ///
    /// let doc = ladle_dom::parse("<p>hi</p>");
    /// let p = doc.select_first("p").unwrap().unwrap();
    /// assert_eq!(p.tag_name(), Ok("p"));
    ///
    /// let text = &p.children()[0];
    /// assert_eq!(
    ///     text.tag_name(),
    ///     Err(DomError::NotAnElement { kind: NodeKind::Text })
    /// );
    /// ```
    pub fn tag_name(&self) -> Result<&str, DomError> {
        match self {
            Node::Element(e) => Ok(e.name()),
            other => Err(DomError::NotAnElement { kind: other.kind() }),
        }
    }

    /// Attribute pairs in source order; empty for text and comments.
    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Node::Element(e) => e.attributes(),
            _ => &[],
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.as_element().and_then(|e| e.attr(name))
    }

    pub fn id(&self) -> Option<&str> {
        self.as_element().and_then(Element::id)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.as_element()
            .map(|e| e.classes().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.as_element().is_some_and(|e| e.has_class(class))
    }

    /// Direct children in order; empty for text and comments.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(e) => e.children(),
            _ => &[],
        }
    }

    /// Direct children that are elements.
    pub fn element_children(&self) -> impl Iterator<Item = &Node> {
        self.children().iter().filter(|n| n.is_element())
    }

    /// Every node below this one in pre-order; the node itself is not included.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: vec![self.children().iter()],
        }
    }

    /// Concatenated text of all descendant text nodes, untrimmed.
    ///
    /// A text node returns its own content; comments contribute nothing.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Comment(_) => String::new(),
            Node::Element(_) => {
                let mut out = String::new();
                for node in self.descendants() {
                    if let Node::Text(t) = node {
                        out.push_str(t);
                    }
                }
                out
            }
        }
    }

    /// Trimmed descendant text runs, skipping whitespace-only ones.
    pub fn stripped_strings(&self) -> Vec<&str> {
        let own = match self {
            Node::Text(t) => Some(t.as_str()),
            _ => None,
        };
        own.into_iter()
            .chain(self.descendants().filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            }))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Elements under this node matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<&Node>, DomError> {
        Ok(Selector::parse(selector)?.select(self))
    }

    pub fn select_first(&self, selector: &str) -> Result<Option<&Node>, DomError> {
        Ok(Selector::parse(selector)?.select_first(self))
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// Pre-order walk driven by an explicit stack, so deep trees don't recurse.
pub struct Descendants<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(node) => {
                    let kids = node.children();
                    if !kids.is_empty() {
                        self.stack.push(kids.iter());
                    }
                    return Some(node);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
