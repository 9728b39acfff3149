//! # warden-expr
//!
//! The restricted trigger-condition language for the WARDEN control layer.
//!
//! Trigger conditions are boolean expressions over a tool invocation's
//! input and output. The language is a deliberately closed grammar —
//! field/index paths, `len`, filtered `count`, comparisons, membership, and
//! boolean combinators — with its own parser and tree-walking evaluator.
//! It is not Turing-complete and never delegates to a host interpreter, so
//! contract documents cannot become a code-execution vector.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_contracts::EvaluationContext;
//! use warden_expr::{evaluate, parse};
//!
//! let expr = parse("count(tool_output.results, r, r.score >= 0.8) < 5")?;
//! let ctx = EvaluationContext::from_output(output_json);
//! let triggered = evaluate(&expr, &ctx)?;
//! ```
//!
//! `parse` runs once per rule at contract load time; `evaluate` walks the
//! resulting tree per invocation and is pure — same expression, same
//! context, same result.

pub mod ast;
pub mod error;
pub mod eval;
pub mod parser;

pub use ast::{CmpOp, Expr, Literal, Segment};
pub use error::{EvalError, ParseError};
pub use eval::evaluate;
pub use parser::parse;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use warden_contracts::EvaluationContext;

    use super::*;

    // End-to-end checks pairing parse and evaluate the way the repository
    // and aggregator use them: compile once, evaluate many times.

    #[test]
    fn compiled_condition_is_reusable_across_contexts() {
        let expr = parse("len(tool_output.results) < 5").unwrap();

        let scarce = EvaluationContext::from_output(json!({"results": [1, 2, 3, 4]}));
        let plenty = EvaluationContext::from_output(json!({"results": [1, 2, 3, 4, 5, 6]}));

        assert_eq!(evaluate(&expr, &scarce), Ok(true));
        assert_eq!(evaluate(&expr, &plenty), Ok(false));
        assert_eq!(evaluate(&expr, &scarce), Ok(true));
    }

    #[test]
    fn parse_failures_carry_positions_for_operators() {
        let err = parse("len(tool_output > ").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
        // Rendered message names the offset for operator-facing diagnostics.
        assert!(err.to_string().contains("at "));
    }

    #[test]
    fn evaluation_never_mutates_the_context() {
        let expr = parse("count(tool_output.items, i, i > 1) == 2").unwrap();
        let ctx = EvaluationContext::from_output(json!({"items": [1, 2, 3]}));
        let before = ctx.tool_output.clone();

        let _ = evaluate(&expr, &ctx);

        assert_eq!(ctx.tool_output, before);
    }
}
