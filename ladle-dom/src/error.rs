use crate::node::NodeKind;
use thiserror::Error;

/// Failures surfaced by the query façade.
///
/// Parsing never fails; only selector compilation and element-only accessors do.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The selector uses syntax outside the supported subset.
    #[error("invalid selector {selector:?} at position {position}: {reason}")]
    SelectorSyntax {
        selector: String,
        /// Character offset of the offending input.
        position: usize,
        reason: String,
    },
    /// An element-only accessor was called on a text or comment node.
    #[error("expected an element, found a {kind} node")]
    NotAnElement { kind: NodeKind },
}
