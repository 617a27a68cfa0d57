//! Permissive HTML parsing into an owned node tree, with compound CSS
//! selectors and text/attribute accessors.
//!
//! ```
//! let doc = ladle_dom::parse("<ul>\n  <li>A</li>\n  <li>B</li>\n</ul>");
//! let items: Vec<String> = doc
//!     .select("li")
//!     .unwrap()
//!     .into_iter()
//!     .map(|n| n.text_content())
//!     .collect();
//! assert_eq!(items, ["A", "B"]);
//! ```

mod document;
mod entity;
mod error;
mod node;
mod parser;
mod selector;
mod token;

pub use document::Document;
pub use entity::decode as decode_entities;
pub use error::DomError;
pub use node::{Attribute, DOCUMENT_TAG, Descendants, Element, Node, NodeKind};
pub use parser::parse;
pub use selector::Selector;
