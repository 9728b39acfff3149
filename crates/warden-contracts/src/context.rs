//! The read-only data a trigger condition can see.

use serde_json::Value;

/// Everything exposed to a trigger condition for one tool invocation.
///
/// Rebuilt per invocation and never mutated by evaluation. Conditions reach
/// into it through the root identifiers `tool_output` and `tool_input`;
/// the structure underneath is tool-specific and opaque to the core.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// The structured result of the tool call.
    pub tool_output: Value,

    /// The arguments passed to the tool, when the framework supplies them.
    /// A condition referencing `tool_input` while this is `None` is an
    /// evaluation error, not a silent default.
    pub tool_input: Option<Value>,
}

impl EvaluationContext {
    /// Build a context from a tool's output alone.
    pub fn from_output(tool_output: Value) -> Self {
        Self {
            tool_output,
            tool_input: None,
        }
    }

    /// Build a context from a tool's input and output.
    pub fn new(tool_input: Option<Value>, tool_output: Value) -> Self {
        Self {
            tool_output,
            tool_input,
        }
    }

    /// Resolve a root identifier to its value, or `None` if the identifier
    /// is not a context root (or `tool_input` was not supplied).
    pub fn root(&self, name: &str) -> Option<&Value> {
        match name {
            "tool_output" => Some(&self.tool_output),
            "tool_input" => self.tool_input.as_ref(),
            _ => None,
        }
    }

    /// True if `name` is a reserved context root, whether or not a value is
    /// currently present for it. Loop variables may not shadow these.
    pub fn is_reserved_root(name: &str) -> bool {
        matches!(name, "tool_output" | "tool_input")
    }
}
