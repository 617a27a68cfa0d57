//! Compound selectors: `tag`, `#id`, `.class`, and any combination of them
//! written without spaces, such as `div#main.a.b`.

use crate::error::DomError;
use crate::node::Node;
use std::fmt;
use std::str::FromStr;

/// A compiled selector. Every present component must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    /// Compile `input`, rejecting anything outside the supported subset.
    ///
    /// ```
    /// use ladle_dom::{DomError, Selector};
    ///
    /// let sel = Selector::parse("div#main.a.b").unwrap();
    /// assert_eq!(sel.tag(), Some("div"));
    /// assert_eq!(sel.id(), Some("main"));
    /// assert_eq!(sel.classes(), ["a", "b"]);
    ///
    /// let err = Selector::parse("###").unwrap_err();
    /// assert!(matches!(err, DomError::SelectorSyntax { position: 1, .. }));
    /// ```
    pub fn parse(input: &str) -> Result<Self, DomError> {
        let fail = |position: usize, reason: &str| DomError::SelectorSyntax {
            selector: input.to_string(),
            position,
            reason: reason.to_string(),
        };

        let chars: Vec<char> = input.chars().collect();
        if chars.is_empty() {
            return Err(fail(0, "empty selector"));
        }

        let mut sel = Selector {
            source: input.to_string(),
            tag: None,
            id: None,
            classes: Vec::new(),
        };
        let mut pos = 0;

        if is_ident_start(chars[0]) {
            let (name, end) = read_ident(&chars, 0);
            sel.tag = Some(name.to_ascii_lowercase());
            pos = end;
        }

        while pos < chars.len() {
            let sigil = chars[pos];
            match sigil {
                '#' | '.' => {
                    let start = pos + 1;
                    match chars.get(start) {
                        Some(&c) if is_ident_start(c) => {}
                        Some(&c) if c.is_ascii_digit() => {
                            return Err(fail(start, "name cannot start with a digit"));
                        }
                        _ => return Err(fail(start, "expected a name")),
                    }
                    let (name, end) = read_ident(&chars, start);
                    if sigil == '#' {
                        if sel.id.is_some() {
                            return Err(fail(pos, "only one id is allowed"));
                        }
                        sel.id = Some(name);
                    } else {
                        sel.classes.push(name);
                    }
                    pos = end;
                }
                c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                    return Err(fail(pos, "combinators are not supported"));
                }
                ',' => return Err(fail(pos, "selector lists are not supported")),
                '*' => return Err(fail(pos, "universal selector is not supported")),
                '[' => return Err(fail(pos, "attribute selectors are not supported")),
                ':' => return Err(fail(pos, "pseudo-classes are not supported")),
                c if c.is_ascii_digit() && pos == 0 => {
                    return Err(fail(pos, "name cannot start with a digit"));
                }
                _ => return Err(fail(pos, "unexpected character")),
            }
        }

        Ok(sel)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Lowercased type selector, if any.
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Whether `node` is an element satisfying every component.
    pub fn matches(&self, node: &Node) -> bool {
        let Some(el) = node.as_element() else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !el.name().eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id() != Some(id.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| el.has_class(c))
    }

    /// Matches under `scope` in document order; `scope` itself is never included.
    pub fn select<'a>(&self, scope: &'a Node) -> Vec<&'a Node> {
        let hits: Vec<&Node> = scope.descendants().filter(|n| self.matches(n)).collect();
        tracing::trace!(selector = %self.source, matches = hits.len(), "dom.select");
        hits
    }

    pub fn select_first<'a>(&self, scope: &'a Node) -> Option<&'a Node> {
        scope.descendants().find(|n| self.matches(n))
    }
}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

/// Read an identifier starting at `start`; returns it and the index past it.
fn read_ident(chars: &[char], start: usize) -> (String, usize) {
    let end = chars[start..]
        .iter()
        .position(|&c| !is_ident_char(c))
        .map_or(chars.len(), |n| start + n);
    (chars[start..end].iter().collect(), end)
}
