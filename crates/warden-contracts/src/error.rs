//! Error types for the WARDEN control layer.
//!
//! All fallible operations across the WARDEN crates return `WardenResult<T>`.
//! Load-time variants are fatal to startup; there is deliberately no variant
//! for a failed condition evaluation — those are recovered per rule and
//! reported inside `EvaluationOutcome`, never as an `Err` that could abort
//! an agent run.

use thiserror::Error;

/// The unified error type for the WARDEN control layer.
#[derive(Debug, Error)]
pub enum WardenError {
    /// A contract document is malformed, or the contract directory is
    /// missing or empty. Fatal at load time — no partial repository is
    /// ever active.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// Two contract documents claim the same tool name.
    #[error("duplicate contract for tool '{tool_name}' in '{file}'")]
    DuplicateContract { tool_name: String, file: String },

    /// A rule's trigger condition failed to parse at load time.
    #[error("invalid trigger condition for rule '{rule}' in '{file}': {reason}")]
    ConditionParse {
        file: String,
        rule: String,
        reason: String,
    },
}

/// Convenience alias used throughout the WARDEN crates.
pub type WardenResult<T> = Result<T, WardenError>;
