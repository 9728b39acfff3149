//! The hook surface an agent framework integrates against.
//!
//! The control layer deliberately exposes exactly two integration points,
//! called by the framework at fixed places in its tool-calling step. There
//! is no dynamic hook registration and no control flow smuggled through the
//! tool protocol — the framework calls these methods directly and treats
//! the returned disposition as authoritative.

use serde_json::Value;

use warden_contracts::{RunState, ToolDisposition, WardenResult};

/// The two hooks of the control layer.
///
/// Implementations must be safe to call from concurrent tool invocations
/// within one agent step; the reference implementation (`ControlLayer`) is
/// pure per call and needs no external synchronization.
pub trait InterceptionHooks: Send + Sync {
    /// Called once per agent run, before any tool executes.
    ///
    /// Establishes the run's correlation state: a fresh run ID and the
    /// names of every guarded tool in the current repository snapshot.
    /// Idempotent per run and side-effect-free with respect to the
    /// repository contents.
    fn on_run_start(&self) -> WardenResult<RunState>;

    /// Called once per completed tool invocation with the tool's name, its
    /// input arguments (when the framework has them), and its raw output.
    ///
    /// An unguarded tool always yields `ToolDisposition::Resume` with the
    /// output untouched and no evaluation performed. For a guarded tool the
    /// contract's rules are evaluated and the disposition tells the
    /// framework whether to resume normally or branch to its intervention
    /// path. Retries, approval timeouts, and overrides belong to the
    /// framework, not to this layer.
    fn on_tool_result(
        &self,
        run: &RunState,
        tool_name: &str,
        tool_input: Option<Value>,
        tool_output: Value,
    ) -> WardenResult<ToolDisposition>;
}
