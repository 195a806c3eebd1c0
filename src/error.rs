//! Central error types for bson-transpile.
//!
//! Uses `thiserror` for ergonomic error definitions. Every component raises
//! errors exclusively through the constructors in this module, so each error
//! carries the position of the offending parse-tree node when one is known.

use thiserror::Error;
use tree_sitter::Node;

/// Source position of the node an error is anchored to (1-based line).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Main error type for the library.
///
/// The first four variants are the named failure classes of the translator;
/// `Generic` covers everything else, including constant-evaluation failures,
/// unsupported regex flags, and malformed compile-time constants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A recognized call was given the wrong number of arguments.
    #[error("argument count mismatch: {message}")]
    ArgumentCount { message: String, span: Option<Span> },

    /// An argument failed its declared type slot, or a non-callable was invoked.
    #[error("type error: {message}")]
    Type { message: String, span: Option<Span> },

    /// An identifier is not in the symbol table.
    #[error("reference error: {message}")]
    Reference { message: String, span: Option<Span> },

    /// An attribute was accessed on a recognized value that does not declare it.
    #[error("attribute error: {message}")]
    Attribute { message: String, span: Option<Span> },

    /// Any other failure; carries the underlying cause's message.
    #[error("{message}")]
    Generic { message: String, span: Option<Span> },
}

impl TranslateError {
    /// Position of the node the error is anchored to, if one was known.
    pub fn span(&self) -> Option<Span> {
        match self {
            TranslateError::ArgumentCount { span, .. }
            | TranslateError::Type { span, .. }
            | TranslateError::Reference { span, .. }
            | TranslateError::Attribute { span, .. }
            | TranslateError::Generic { span, .. } => *span,
        }
    }
}

/// Convenience type alias for Results using TranslateError.
pub type Result<T> = std::result::Result<T, TranslateError>;

/// Extract a `Span` from a parse-tree node.
pub(crate) fn span_of(node: Node<'_>) -> Span {
    let pos = node.start_position();
    Span {
        line: pos.row + 1,
        column: pos.column,
    }
}

/// A recognized identifier that is missing from the symbol table.
pub(crate) fn reference_error(name: &str, node: Node<'_>) -> TranslateError {
    TranslateError::Reference {
        message: format!("unknown identifier: {name}"),
        span: Some(span_of(node)),
    }
}

/// An attribute that is not declared on a recognized type.
pub(crate) fn attribute_error(type_id: &str, attr: &str, node: Node<'_>) -> TranslateError {
    TranslateError::Attribute {
        message: format!("{type_id} has no attribute {attr}"),
        span: Some(span_of(node)),
    }
}

/// A call with an argument count outside the schema's arity bounds.
pub(crate) fn argument_count_error(
    callee: &str,
    expected: &str,
    got: usize,
    node: Node<'_>,
) -> TranslateError {
    TranslateError::ArgumentCount {
        message: format!("{callee} expects {expected} argument(s), got {got}"),
        span: Some(span_of(node)),
    }
}

/// A type failure (bad argument type, or calling a non-callable).
pub(crate) fn type_error(message: impl Into<String>, node: Node<'_>) -> TranslateError {
    TranslateError::Type {
        message: message.into(),
        span: Some(span_of(node)),
    }
}

/// A generic failure with no node position.
pub(crate) fn generic(message: impl Into<String>) -> TranslateError {
    TranslateError::Generic {
        message: message.into(),
        span: None,
    }
}

/// A generic failure anchored to a node.
pub(crate) fn generic_at(message: impl Into<String>, node: Node<'_>) -> TranslateError {
    TranslateError::Generic {
        message: message.into(),
        span: Some(span_of(node)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind() {
        let err = TranslateError::Reference {
            message: "unknown identifier: foo".to_string(),
            span: None,
        };
        assert_eq!(err.to_string(), "reference error: unknown identifier: foo");
    }

    #[test]
    fn test_generic_has_no_prefix() {
        let err = generic("sandbox evaluation failed");
        assert_eq!(err.to_string(), "sandbox evaluation failed");
        assert_eq!(err.span(), None);
    }

    #[test]
    fn test_span_display() {
        let span = Span { line: 3, column: 7 };
        assert_eq!(span.to_string(), "3:7");
    }
}
