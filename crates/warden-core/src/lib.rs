//! # warden-core
//!
//! Rule aggregation and the interception hook surface for the WARDEN
//! control layer.
//!
//! ## Overview
//!
//! An agent framework integrates WARDEN through two hooks
//! ([`InterceptionHooks`]): `on_run_start` once per run, `on_tool_result`
//! once per completed tool invocation. The reference implementation
//! ([`ControlLayer`]) looks the tool up in the current repository snapshot,
//! evaluates its contract's rules with the restricted condition language,
//! and returns a disposition the framework must honor — resume normally, or
//! branch to an intervention path carrying the triggered rules' composed
//! instruction text.
//!
//! Everything on the evaluation path is a pure function of the contract and
//! the invocation's context: concurrent tool calls within one step need no
//! coordination, and re-evaluating the same invocation always yields the
//! same outcome.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use warden_core::{ControlLayer, InterceptionHooks};
//!
//! let layer = ControlLayer::from_dir(Path::new(".warden"))?;
//! let run = layer.on_run_start()?;
//!
//! // ... after each tool invocation:
//! let disposition = layer.on_tool_result(&run, "search", Some(input), output)?;
//! if disposition.is_intervention() {
//!     // route to the framework's human-approval step
//! }
//! ```

pub mod aggregate;
pub mod layer;
pub mod traits;

pub use aggregate::evaluate_contract;
pub use layer::ControlLayer;
pub use traits::InterceptionHooks;
