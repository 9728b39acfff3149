//! Contract and rule definitions.
//!
//! A `Contract` guards exactly one tool. Its rules are declarative: a
//! trigger condition in the restricted expression language plus the
//! instruction to surface when that condition fires. Contracts are
//! deserialized from TOML documents and are immutable after load.

use serde::{Deserialize, Serialize};

/// The full policy for one tool.
///
/// One contract per tool name; the repository rejects duplicates at load
/// time. `rules` must be non-empty — a contract that guards nothing is a
/// configuration error, not a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    /// The exact tool name this contract applies to. Authoritative —
    /// the document's file name carries no meaning.
    pub tool_name: String,

    /// Human-readable explanation of what this contract protects.
    pub description: String,

    /// Ordered rule list. Declaration order breaks priority ties.
    pub rules: Vec<Rule>,
}

/// A single named condition-plus-instruction pair.
///
/// Rules never observe each other: every rule in a contract is evaluated
/// independently against the same context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Identifier, unique within its contract. Appears in logs and in the
    /// outcome's triggered list.
    pub name: String,

    /// Human-readable description for operators.
    pub description: String,

    /// Boolean expression in the restricted condition language, evaluated
    /// against the tool's latest input/output. Parsed at load time so a
    /// malformed condition fails startup, never a run.
    pub trigger_condition: String,

    /// Shown to the human/agent when the condition fires.
    pub instruction: String,

    /// Lower value = evaluated and reported first. Ties are broken by
    /// declaration order within the contract.
    pub priority: i64,
}
