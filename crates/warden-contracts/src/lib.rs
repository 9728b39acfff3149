//! # warden-contracts
//!
//! Shared types and error definitions for the WARDEN control layer.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions and error types.

pub mod context;
pub mod contract;
pub mod error;
pub mod outcome;
pub mod run;

pub use context::EvaluationContext;
pub use contract::{Contract, Rule};
pub use error::{WardenError, WardenResult};
pub use outcome::{Decision, EvaluationOutcome, FailurePolicy, RuleEvalFailure, TriggeredRule};
pub use run::{RunId, RunState, ToolDisposition};
