//! Per-run correlation state and the hook's control-flow result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::outcome::TriggeredRule;

/// Unique identifier for one agent run.
///
/// Minted by `on_run_start` and carried in every interception log line so
/// interventions across concurrent runs can be told apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Create a new, unique run ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// State established once per agent run, before any tool executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Correlation ID scoping all interception logs for this run.
    pub run_id: RunId,

    /// When the run was registered with the control layer.
    pub started_at: DateTime<Utc>,

    /// Sorted names of every tool the active repository snapshot guards.
    /// Frameworks typically announce this to the agent at run start.
    pub guarded_tools: Vec<String>,
}

/// What the surrounding framework does with a completed tool invocation.
///
/// Returned by the post-invocation hook. The framework must treat this as
/// authoritative: `Resume` means feed the output to the model as usual,
/// `Intervene` means route to an approval/clarification step first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ToolDisposition {
    /// No rule triggered (or the tool is unguarded). The output is passed
    /// through untouched.
    Resume {
        /// The original tool output, unchanged.
        output: Value,
    },

    /// One or more rules triggered. The framework must not resume model
    /// generation with the raw result until the intervention is handled.
    Intervene {
        /// The original tool output, unchanged — interception never edits
        /// tool results, it only gates them.
        output: Value,
        /// Composed instruction text from every triggered rule, in priority
        /// order.
        instruction: String,
        /// The triggered rules, sorted, for frameworks that render their
        /// own prompt.
        triggered: Vec<TriggeredRule>,
    },
}

impl ToolDisposition {
    /// True for the `Intervene` variant.
    pub fn is_intervention(&self) -> bool {
        matches!(self, Self::Intervene { .. })
    }

    /// The tool output carried by either variant.
    pub fn output(&self) -> &Value {
        match self {
            Self::Resume { output } | Self::Intervene { output, .. } => output,
        }
    }
}
