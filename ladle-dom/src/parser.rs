//! Tree construction.
//!
//! Open elements live on a stack of owned [`Element`]s. Closing an element
//! pops it and appends it to the element below, so finished subtrees move into
//! their parent and the tree never needs shared ownership. The stack bottom is
//! the synthetic document root, which is never popped by markup.

use crate::document::Document;
use crate::node::{Attribute, DOCUMENT_TAG, Element, Node};
use crate::token::{Token, Tokenizer};
use std::collections::HashMap;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Start tags that close an open `<p>`.
const CLOSES_P: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "table", "ul",
];

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Implicit closes never reach past these.
const SCOPE_BOUNDARY: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];

/// Parse markup into a [`Document`]. Never fails.
///
/// ```
/// let doc = ladle_dom::parse("<ul><li>A<li>B</ul>");
/// let items: Vec<String> = doc
///     .select("li")
///     .unwrap()
///     .iter()
///     .map(|n| n.text_content())
///     .collect();
/// assert_eq!(items, ["A", "B"]);
/// ```
pub fn parse(markup: &str) -> Document {
    let mut builder = TreeBuilder::new();
    for token in Tokenizer::new(markup) {
        builder.process(token);
    }
    let root = builder.finish();
    tracing::debug!(
        bytes = markup.len(),
        nodes = root.descendants().count(),
        "dom.parse"
    );
    Document::from_root(root)
}

struct TreeBuilder {
    open: Vec<Element>,
    /// Open elements per tag name, root excluded. Lets lookups for a name
    /// that is not open skip the stack walk.
    open_counts: HashMap<String, usize>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            open: vec![Element::new(DOCUMENT_TAG, Vec::new())],
            open_counts: HashMap::new(),
        }
    }

    fn is_open(&self, name: &str) -> bool {
        self.open_counts.get(name).is_some_and(|&n| n > 0)
    }

    fn any_open(&self, names: &[&str]) -> bool {
        names.iter().any(|n| self.is_open(n))
    }

    fn push_open(&mut self, element: Element) {
        *self.open_counts.entry(element.name().to_string()).or_default() += 1;
        self.open.push(element);
    }

    fn pop_open(&mut self) -> Option<Element> {
        if self.open.len() <= 1 {
            return None;
        }
        let done = self.open.pop()?;
        if let Some(n) = self.open_counts.get_mut(done.name()) {
            *n = n.saturating_sub(1);
        }
        Some(done)
    }

    fn current(&mut self) -> &mut Element {
        // The root is only popped in `finish`.
        let last = self.open.len() - 1;
        &mut self.open[last]
    }

    fn insert(&mut self, node: Node) {
        self.current().push_child(node);
    }

    fn process(&mut self, token: Token) {
        match token {
            Token::Text(text) => {
                if !text.is_empty() {
                    self.insert(Node::Text(text));
                }
            }
            Token::Comment(c) => self.insert(Node::Comment(c)),
            Token::Doctype(_) => {}
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.start_tag(name, attributes, self_closing),
            Token::EndTag { name } => self.end_tag(&name),
        }
    }

    fn start_tag(
        &mut self,
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    ) {
        self.close_implied_by(&name);

        let element = Element::new(name, attributes);
        if self_closing || VOID_ELEMENTS.contains(&element.name()) {
            self.insert(Node::Element(element));
        } else {
            self.push_open(element);
        }
    }

    fn end_tag(&mut self, name: &str) {
        if name == "br" {
            // `</br>` is treated as `<br>`.
            self.insert(Node::Element(Element::new("br", Vec::new())));
            return;
        }
        match self.position_of(name) {
            Some(idx) => self.pop_to(idx),
            None => tracing::trace!(tag = name, "dom.parse.stray_end_tag"),
        }
    }

    /// Index of the nearest open element named `name`, excluding the root.
    fn position_of(&self, name: &str) -> Option<usize> {
        if !self.is_open(name) {
            return None;
        }
        self.open
            .iter()
            .enumerate()
            .skip(1)
            .rev()
            .find(|(_, e)| e.name() == name)
            .map(|(i, _)| i)
    }

    /// Nearest open element in `targets`, searching down from the top and
    /// giving up at any element in `stop`.
    fn find_open(&self, targets: &[&str], stop: &[&str]) -> Option<usize> {
        if !self.any_open(targets) {
            return None;
        }
        for (i, e) in self.open.iter().enumerate().skip(1).rev() {
            if targets.contains(&e.name()) {
                return Some(i);
            }
            if stop.contains(&e.name()) {
                return None;
            }
        }
        None
    }

    /// Like [`Self::find_open`], but also stops at a scope boundary.
    fn find_in_scope(&self, targets: &[&str], stop: &[&str]) -> Option<usize> {
        if !self.any_open(targets) {
            return None;
        }
        for (i, e) in self.open.iter().enumerate().skip(1).rev() {
            if targets.contains(&e.name()) {
                return Some(i);
            }
            if stop.contains(&e.name()) || SCOPE_BOUNDARY.contains(&e.name()) {
                return None;
            }
        }
        None
    }

    /// Close elements a new `name` start tag cannot nest inside.
    fn close_implied_by(&mut self, name: &str) {
        if CLOSES_P.contains(&name) {
            if let Some(idx) = self.find_in_scope(&["p"], &[]) {
                self.pop_to(idx);
            }
        }

        let top = self.open.last().map(Element::name).unwrap_or_default();
        let implied = match name {
            "li" => self.find_in_scope(&["li"], &["ul", "ol"]),
            "dt" | "dd" => self.find_in_scope(&["dt", "dd"], &["dl"]),
            "tr" => self.find_open(&["tr"], &["table", "thead", "tbody", "tfoot"]),
            "td" | "th" => self.find_open(&["td", "th"], &["tr", "table"]),
            "thead" | "tbody" | "tfoot" => {
                self.find_open(&["thead", "tbody", "tfoot"], &["table"])
            }
            "option" if top == "option" => Some(self.open.len() - 1),
            "optgroup" => self.find_in_scope(&["option", "optgroup"], &["select"]),
            _ if HEADINGS.contains(&name) && HEADINGS.contains(&top) => {
                Some(self.open.len() - 1)
            }
            _ => None,
        };
        if let Some(idx) = implied {
            self.pop_to(idx);
        }
    }

    /// Pop every open element from the top down to and including `idx`.
    fn pop_to(&mut self, idx: usize) {
        while self.open.len() > idx.max(1) {
            match self.pop_open() {
                Some(done) => self.insert(Node::Element(done)),
                None => break,
            }
        }
    }

    fn finish(mut self) -> Node {
        self.pop_to(1);
        let root = self
            .open
            .pop()
            .unwrap_or_else(|| Element::new(DOCUMENT_TAG, Vec::new()));
        Node::Element(root)
    }
}
