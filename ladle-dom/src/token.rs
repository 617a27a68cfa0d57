//! Markup tokenizer.
//!
//! Splits raw markup into start tags, end tags, text runs and comments. It
//! never fails: anything it cannot read as a construct is either emitted as
//! text or dropped, following the permissive HTML behaviour.
//!
//! ```text
//! input:  <div class="a">hi</div>
//! tokens: StartTag { name: "div", attributes: [class="a"], self_closing: false }
//!         Text("hi")
//!         EndTag { name: "div" }
//! ```
//!
//! Delimiters are all ASCII, so scanning bytes and slicing at their positions
//! always lands on UTF-8 boundaries.

use crate::entity;
use crate::node::Attribute;

/// Elements whose content is taken verbatim up to the matching end tag.
const RAW_TEXT: &[&str] = &["script", "style"];
/// Like [`RAW_TEXT`], but character references are still decoded.
const ESCAPABLE_RAW_TEXT: &[&str] = &["textarea", "title"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
    Text(String),
    Comment(String),
    Doctype(String),
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    /// Set after a raw-text start tag; the next read runs to its end tag.
    raw_until: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            raw_until: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn byte_at(&self, i: usize) -> Option<u8> {
        self.input.as_bytes().get(i).copied()
    }

    fn find_from(&self, from: usize, pat: &str) -> Option<usize> {
        self.input.get(from..)?.find(pat).map(|i| i + from)
    }

    fn skip_whitespace(&self, mut i: usize) -> usize {
        while self.byte_at(i).is_some_and(|b| b.is_ascii_whitespace()) {
            i += 1;
        }
        i
    }

    /// Does the `<` at `i` open a construct (tag, end tag, comment, ...)?
    fn opens_markup(&self, i: usize) -> bool {
        matches!(
            self.byte_at(i + 1),
            Some(b) if b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?')
        )
    }

    fn text(&mut self) -> Token {
        let start = self.pos;
        let mut i = start;
        while let Some(rel) = self.input[i..].find('<') {
            let lt = i + rel;
            if lt > start && self.opens_markup(lt) {
                self.pos = lt;
                return Token::Text(entity::decode(&self.input[start..lt]).into_owned());
            }
            i = lt + 1;
        }
        self.pos = self.input.len();
        Token::Text(entity::decode(&self.input[start..]).into_owned())
    }

    /// Content of a `script`/`style`/`textarea`/`title` element.
    fn raw_text(&mut self, name: &str) -> Option<Token> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        let mut i = start;
        let end = loop {
            let Some(lt) = self.find_from(i, "</") else {
                break self.input.len();
            };
            let name_end = lt + 2 + name.len();
            let closes = self
                .input
                .get(lt + 2..name_end)
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
                && bytes
                    .get(name_end)
                    .is_none_or(|&b| b.is_ascii_whitespace() || matches!(b, b'/' | b'>'));
            if closes {
                break lt;
            }
            i = lt + 2;
        };
        self.pos = end;
        if end == start {
            return None;
        }
        let raw = &self.input[start..end];
        let text = if ESCAPABLE_RAW_TEXT.contains(&name) {
            entity::decode(raw).into_owned()
        } else {
            raw.to_string()
        };
        Some(Token::Text(text))
    }

    /// `<!-- ... -->`, with the abrupt `<!-->` and `<!--->` forms.
    fn comment(&mut self) -> Token {
        let body_start = self.pos + 4;
        for abrupt in ["<!-->", "<!--->"] {
            if self.rest().starts_with(abrupt) {
                self.pos += abrupt.len();
                return Token::Comment(String::new());
            }
        }
        match self.find_from(body_start, "-->") {
            Some(end) => {
                self.pos = end + 3;
                Token::Comment(self.input[body_start..end].to_string())
            }
            None => {
                self.pos = self.input.len();
                Token::Comment(self.input[body_start..].to_string())
            }
        }
    }

    /// Anything from `content_start` up to the next `>` becomes a comment.
    fn bogus_comment(&mut self, content_start: usize) -> Token {
        match self.find_from(content_start, ">") {
            Some(gt) => {
                self.pos = gt + 1;
                Token::Comment(self.input[content_start..gt].to_string())
            }
            None => {
                self.pos = self.input.len();
                Token::Comment(self.input[content_start..].to_string())
            }
        }
    }

    fn markup_declaration(&mut self) -> Token {
        let rest = self.rest();
        if rest.starts_with("<!--") {
            return self.comment();
        }
        let is_doctype = rest
            .get(2..9)
            .is_some_and(|s| s.eq_ignore_ascii_case("doctype"));
        match self.bogus_comment(self.pos + 2) {
            Token::Comment(body) if is_doctype => Token::Doctype(body[7..].trim().to_string()),
            other => other,
        }
    }

    /// Read a tag name starting at `i`; returns it lowercased and the index after it.
    fn tag_name(&self, i: usize) -> (String, usize) {
        let mut end = i;
        while let Some(b) = self.byte_at(end) {
            if b.is_ascii_whitespace() || b == b'/' || b == b'>' {
                break;
            }
            end += 1;
        }
        (self.input[i..end].to_ascii_lowercase(), end)
    }

    fn end_tag(&mut self) -> Option<Token> {
        let start = self.pos + 2;
        match self.byte_at(start) {
            Some(b) if b.is_ascii_alphabetic() => {
                let (name, after) = self.tag_name(start);
                // Attributes on end tags are ignored.
                let Some(gt) = self.find_from(after, ">") else {
                    self.pos = self.input.len();
                    return None;
                };
                self.pos = gt + 1;
                Some(Token::EndTag { name })
            }
            Some(_) => Some(self.bogus_comment(start)),
            None => {
                self.pos = self.input.len();
                None
            }
        }
    }

    /// Parse `<name attr=value ...>`. A tag cut off by end of input is dropped.
    fn start_tag(&mut self) -> Option<Token> {
        let (name, mut i) = self.tag_name(self.pos + 1);
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            i = self.skip_whitespace(i);
            match self.byte_at(i) {
                None => {
                    self.pos = self.input.len();
                    return None;
                }
                Some(b'>') => {
                    i += 1;
                    break;
                }
                Some(b'/') => {
                    if self.byte_at(i + 1) == Some(b'>') {
                        self_closing = true;
                        i += 2;
                        break;
                    }
                    i += 1;
                    continue;
                }
                Some(_) => {}
            }

            // Attribute name; a leading `=` is kept as part of the name.
            let name_start = i;
            i += 1;
            while let Some(b) = self.byte_at(i) {
                if b.is_ascii_whitespace() || matches!(b, b'/' | b'>' | b'=') {
                    break;
                }
                i += 1;
            }
            let attr_name = self.input[name_start..i].to_ascii_lowercase();

            let mut value = String::new();
            let after_name = self.skip_whitespace(i);
            if self.byte_at(after_name) == Some(b'=') {
                i = self.skip_whitespace(after_name + 1);
                match self.byte_at(i) {
                    Some(q @ (b'"' | b'\'')) => {
                        let quote = if q == b'"' { "\"" } else { "'" };
                        let Some(close) = self.find_from(i + 1, quote) else {
                            self.pos = self.input.len();
                            return None;
                        };
                        value = entity::decode(&self.input[i + 1..close]).into_owned();
                        i = close + 1;
                    }
                    Some(_) => {
                        let v_start = i;
                        while let Some(b) = self.byte_at(i) {
                            if b.is_ascii_whitespace() || b == b'>' {
                                break;
                            }
                            i += 1;
                        }
                        value = entity::decode(&self.input[v_start..i]).into_owned();
                    }
                    None => {
                        self.pos = self.input.len();
                        return None;
                    }
                }
            }

            if !attributes.iter().any(|a| a.name == attr_name) {
                attributes.push(Attribute::new(attr_name, value));
            }
        }

        self.pos = i;
        let raw = RAW_TEXT.contains(&name.as_str()) || ESCAPABLE_RAW_TEXT.contains(&name.as_str());
        if raw && !self_closing {
            self.raw_until = Some(name.clone());
        }
        Some(Token::StartTag {
            name,
            attributes,
            self_closing,
        })
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(name) = self.raw_until.take() {
            if let Some(tok) = self.raw_text(&name) {
                return Some(tok);
            }
        }
        // `</>` is dropped entirely.
        while self.rest().starts_with("</>") {
            self.pos += 3;
        }
        if self.pos >= self.input.len() {
            return None;
        }
        if self.byte_at(self.pos) != Some(b'<') || !self.opens_markup(self.pos) {
            return Some(self.text());
        }
        match self.byte_at(self.pos + 1) {
            Some(b'!') => Some(self.markup_declaration()),
            Some(b'?') => Some(self.bogus_comment(self.pos + 1)),
            Some(b'/') => self.end_tag(),
            _ => self.start_tag(),
        }
    }
}
