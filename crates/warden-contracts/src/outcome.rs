//! Evaluation outcome types.
//!
//! The aggregator consumes a contract plus an `EvaluationContext` and
//! produces an `EvaluationOutcome`. The outcome is the whole story of one
//! interception: which rules fired, in what order, what instruction text to
//! surface, and which rules failed to evaluate.

use serde::{Deserialize, Serialize};

/// The decision for one tool invocation.
///
/// `Intervene` iff at least one rule triggered. There is no third state:
/// evaluation errors are resolved into one of these two by the configured
/// `FailurePolicy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// No rule triggered; the tool result flows back unchanged.
    Pass,
    /// One or more rules triggered; the framework must branch to its
    /// intervention path (e.g. human approval) before resuming.
    Intervene,
}

/// How the aggregator treats a rule whose condition failed to evaluate.
///
/// `Open` favors availability: an erroring rule simply does not trigger.
/// `Closed` is the conservative posture and treats an erroring rule as
/// triggered. The failure is recorded in `EvaluationOutcome::errors`
/// either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// An erroring rule is treated as not triggered (fail-open).
    #[default]
    Open,
    /// An erroring rule is treated as triggered (fail-closed).
    Closed,
}

/// One rule that evaluated true, in the outcome's sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggeredRule {
    /// The rule's `name` field.
    pub name: String,
    /// The rule's instruction, verbatim.
    pub instruction: String,
    /// The rule's priority, kept for frameworks that format their own
    /// intervention messages.
    pub priority: i64,
}

/// A condition that failed to evaluate for this invocation.
///
/// Never fatal to the invocation; sibling rules evaluate normally. Surfaced
/// here so the failure is observable even when the policy is fail-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEvalFailure {
    /// The rule whose condition errored.
    pub rule: String,
    /// Human-readable evaluation error (missing field, type mismatch, ...).
    pub message: String,
}

/// The outcome of evaluating one contract against one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// Pass or Intervene. Intervene iff `triggered` is non-empty.
    pub decision: Decision,

    /// Rules that evaluated true, sorted by ascending priority with ties
    /// broken by declaration order.
    pub triggered: Vec<TriggeredRule>,

    /// Instructions of the triggered rules joined in sorted order, or
    /// `None` on Pass.
    pub intervention_text: Option<String>,

    /// Every evaluation failure encountered, independent of policy.
    pub errors: Vec<RuleEvalFailure>,
}

impl EvaluationOutcome {
    /// An outcome with nothing triggered and no errors — what an unguarded
    /// tool, or a contract with no matching rules, produces.
    pub fn pass() -> Self {
        Self {
            decision: Decision::Pass,
            triggered: Vec::new(),
            intervention_text: None,
            errors: Vec::new(),
        }
    }
}
