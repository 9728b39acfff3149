//! Parse-time and evaluation-time errors for the condition language.
//!
//! `ParseError` positions are byte offsets into the condition string, so a
//! load-time failure can point an operator at the exact spot in the
//! contract document. `EvalError` carries the fully rendered path for the
//! same reason.

use thiserror::Error;

/// A trigger condition failed to parse.
///
/// Raised at contract load time only — a repository never holds an
/// unparseable condition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Input was empty or contained only whitespace.
    #[error("condition is empty")]
    EmptyInput,

    /// Input exceeded the size limit.
    #[error("condition exceeds size limit: {actual_bytes} bytes (max {max_bytes})")]
    InputTooLarge {
        max_bytes: usize,
        actual_bytes: usize,
    },

    /// Expression nesting exceeded the depth limit.
    #[error("condition nesting exceeds limit of {max_depth} at {position}")]
    NestingTooDeep { max_depth: usize, position: usize },

    /// An unexpected token was encountered.
    #[error("unexpected token `{found}` at {position}, expected {expected}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
        position: usize,
    },

    /// A string literal was not closed before end of input.
    #[error("unterminated string literal starting at {position}")]
    UnterminatedString { position: usize },

    /// A numeric literal failed to parse.
    #[error("invalid number `{raw}` at {position}")]
    InvalidNumber { raw: String, position: usize },

    /// An identifier was called like a function, but the language has no
    /// such function.
    #[error("unknown function `{name}` at {position}")]
    UnknownFunction { name: String, position: usize },

    /// A `count` loop variable tried to shadow a context root.
    #[error("loop variable `{name}` at {position} shadows a reserved context root")]
    ReservedBinding { name: String, position: usize },

    /// A complete expression was followed by more input.
    #[error("unexpected trailing input at {position}")]
    TrailingInput { position: usize },
}

/// A parsed condition failed to evaluate against a concrete context.
///
/// Never fatal to an invocation: the aggregator resolves these per rule via
/// the configured failure policy and records them in the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// An identifier is neither a context root nor a loop binding.
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String },

    /// The condition references `tool_input` but the framework supplied none.
    #[error("condition references tool_input but no input was supplied")]
    InputUnavailable,

    /// A path segment named a key that does not exist.
    #[error("missing field `{path}`")]
    MissingField { path: String },

    /// A path segment indexed past the end of an array.
    #[error("index {index} out of bounds for `{path}` (length {len})")]
    IndexOutOfBounds {
        path: String,
        index: usize,
        len: usize,
    },

    /// An operation was applied to a value of the wrong type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The condition as a whole (or a count predicate) did not yield a boolean.
    #[error("expression must yield a boolean, found {found}")]
    NotBoolean { found: &'static str },
}
