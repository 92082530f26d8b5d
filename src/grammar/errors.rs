//! Compile-time error types for the grammar engine.

use thiserror::Error;

/// Errors raised while compiling a specification string into a matcher.
///
/// A `CompileError` is only ever raised at registration time
/// (`Device::add_command`); once a [`crate::command::Command`] is built it
/// cannot fail to match or mismatch, it can only do one or the other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The keyword path portion of the spec was empty.
    #[error("keyword path is empty")]
    EmptyKeywordPath,

    /// Brackets in the keyword path were unbalanced.
    #[error("unbalanced '[' ']' in keyword path {0:?}")]
    UnbalancedKeywordBrackets(String),

    /// Brackets in the parameter list were unbalanced.
    #[error("unbalanced '[' ']' in parameter list {0:?}")]
    UnbalancedParameterBrackets(String),

    /// A value alternation (`{A|B|...}`) had no alternatives.
    #[error("value alternation {0:?} has no alternatives")]
    EmptyValueAlternation(String),

    /// A value spec was the unsupported ASCII string kind.
    #[error("ASCII string values are not supported: {0:?}")]
    UnsupportedAsciiString(String),

    /// A value spec was syntactically empty.
    #[error("value spec {0:?} is empty")]
    EmptyValueSpec(String),

    /// A value spec had trailing characters that did not form a recognized
    /// indexed-discrete suffix (`<name>`).
    #[error("value spec {0:?} has trailing characters that do not form a valid suffix")]
    InvalidValueSpec(String),
}
