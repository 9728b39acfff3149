//! Rule aggregation: from one contract and one context to one outcome.
//!
//! Every rule is evaluated independently — no rule observes another's
//! result, so correctness does not depend on evaluation order. A condition
//! that fails to evaluate never aborts the invocation: the failure is
//! recorded in the outcome, logged, and resolved into triggered/not
//! triggered by the configured `FailurePolicy`.

use tracing::{debug, warn};

use warden_contracts::{
    Decision, EvaluationContext, EvaluationOutcome, FailurePolicy, RuleEvalFailure, TriggeredRule,
};
use warden_repo::CompiledContract;

/// Evaluate every rule of `contract` against `ctx` and synthesize the
/// outcome.
///
/// Triggered rules are reported by ascending priority, declaration order
/// for ties; `intervention_text` joins their instructions in that order.
/// The decision is `Intervene` iff at least one rule triggered. Pure:
/// identical inputs always produce an identical outcome.
pub fn evaluate_contract(
    contract: &CompiledContract,
    ctx: &EvaluationContext,
    failure_policy: FailurePolicy,
) -> EvaluationOutcome {
    let mut triggered: Vec<(i64, usize, TriggeredRule)> = Vec::new();
    let mut errors: Vec<RuleEvalFailure> = Vec::new();

    for compiled in &contract.rules {
        let fired = match warden_expr::evaluate(&compiled.condition, ctx) {
            Ok(fired) => fired,
            Err(e) => {
                warn!(
                    tool_name = %contract.tool_name,
                    rule = %compiled.rule.name,
                    error = %e,
                    "trigger condition failed to evaluate"
                );
                errors.push(RuleEvalFailure {
                    rule: compiled.rule.name.clone(),
                    message: e.to_string(),
                });
                matches!(failure_policy, FailurePolicy::Closed)
            }
        };

        if fired {
            debug!(
                tool_name = %contract.tool_name,
                rule = %compiled.rule.name,
                priority = compiled.rule.priority,
                "rule triggered"
            );
            triggered.push((
                compiled.rule.priority,
                compiled.index,
                TriggeredRule {
                    name: compiled.rule.name.clone(),
                    instruction: compiled.rule.instruction.clone(),
                    priority: compiled.rule.priority,
                },
            ));
        }
    }

    // Rules are pre-sorted at load time, but the output order is part of
    // this function's contract — enforce it here rather than rely on the
    // caller's iteration order.
    triggered.sort_by_key(|(priority, index, _)| (*priority, *index));
    let triggered: Vec<TriggeredRule> = triggered.into_iter().map(|(_, _, r)| r).collect();

    let (decision, intervention_text) = if triggered.is_empty() {
        (Decision::Pass, None)
    } else {
        let text = triggered
            .iter()
            .map(|r| r.instruction.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        (Decision::Intervene, Some(text))
    };

    EvaluationOutcome {
        decision,
        triggered,
        intervention_text,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use warden_repo::ContractRepository;

    use super::*;

    const SEARCH_CONTRACT: &str = r#"
        tool_name = "search"
        description = "Guards the web-search tool"

        [[rules]]
        name = "result_count"
        description = "Too few results to trust"
        trigger_condition = "len(tool_output.results) < 5"
        instruction = "Ask the human whether to retry with a broader query."
        priority = 1

        [[rules]]
        name = "result_relevance"
        description = "Too few high-relevance results"
        trigger_condition = "count(tool_output.results, r, r.score >= 0.8) < 5"
        instruction = "Flag low-relevance results for review."
        priority = 2
    "#;

    fn search_contract() -> CompiledContract {
        ContractRepository::from_toml_str("search.toml", SEARCH_CONTRACT)
            .unwrap()
            .lookup("search")
            .unwrap()
            .clone()
    }

    fn results(n: usize, score: f64) -> EvaluationContext {
        let items: Vec<_> = (0..n).map(|_| json!({"score": score})).collect();
        EvaluationContext::from_output(json!({ "results": items }))
    }

    // ── Search-contract scenarios ────────────────────────────────────────────

    #[test]
    fn four_high_score_results_trigger_both_rules_in_priority_order() {
        let outcome = evaluate_contract(&search_contract(), &results(4, 0.9), FailurePolicy::Open);

        assert_eq!(outcome.decision, Decision::Intervene);
        assert_eq!(outcome.triggered.len(), 2);
        assert_eq!(outcome.triggered[0].name, "result_count");
        assert_eq!(outcome.triggered[1].name, "result_relevance");
        assert!(outcome.errors.is_empty());

        let text = outcome.intervention_text.unwrap();
        assert!(text.starts_with("Ask the human"));
        assert!(text.contains("Flag low-relevance"));
    }

    #[test]
    fn six_high_score_results_trigger_nothing() {
        let outcome = evaluate_contract(&search_contract(), &results(6, 0.9), FailurePolicy::Open);

        assert_eq!(outcome.decision, Decision::Pass);
        assert!(outcome.triggered.is_empty());
        assert!(outcome.intervention_text.is_none());
    }

    #[test]
    fn six_low_score_results_trigger_only_the_relevance_rule() {
        let outcome = evaluate_contract(&search_contract(), &results(6, 0.3), FailurePolicy::Open);

        assert_eq!(outcome.decision, Decision::Intervene);
        assert_eq!(outcome.triggered.len(), 1);
        assert_eq!(outcome.triggered[0].name, "result_relevance");
    }

    // ── Ordering ─────────────────────────────────────────────────────────────

    #[test]
    fn triggered_order_follows_priority_not_declaration() {
        let doc = r#"
            tool_name = "t"
            description = "d"

            [[rules]]
            name = "low_priority"
            description = "d"
            trigger_condition = "true"
            instruction = "second"
            priority = 10

            [[rules]]
            name = "high_priority"
            description = "d"
            trigger_condition = "true"
            instruction = "first"
            priority = 1
        "#;
        let repo = ContractRepository::from_toml_str("t.toml", doc).unwrap();
        let contract = repo.lookup("t").unwrap();
        let ctx = EvaluationContext::from_output(json!({}));

        let outcome = evaluate_contract(contract, &ctx, FailurePolicy::Open);
        assert_eq!(outcome.triggered[0].name, "high_priority");
        assert_eq!(outcome.triggered[1].name, "low_priority");
        assert_eq!(outcome.intervention_text.as_deref(), Some("first\n\nsecond"));
    }

    #[test]
    fn equal_priorities_report_in_declaration_order() {
        let doc = r#"
            tool_name = "t"
            description = "d"

            [[rules]]
            name = "declared_first"
            description = "d"
            trigger_condition = "true"
            instruction = "a"
            priority = 5

            [[rules]]
            name = "declared_second"
            description = "d"
            trigger_condition = "true"
            instruction = "b"
            priority = 5
        "#;
        let repo = ContractRepository::from_toml_str("t.toml", doc).unwrap();
        let outcome = evaluate_contract(
            repo.lookup("t").unwrap(),
            &EvaluationContext::from_output(json!({})),
            FailurePolicy::Open,
        );
        assert_eq!(outcome.triggered[0].name, "declared_first");
        assert_eq!(outcome.triggered[1].name, "declared_second");
    }

    // ── Evaluation failures ──────────────────────────────────────────────────

    const MIXED_CONTRACT: &str = r#"
        tool_name = "t"
        description = "d"

        [[rules]]
        name = "broken_reference"
        description = "references a key the output does not have"
        trigger_condition = "tool_output.missing_key > 0"
        instruction = "broken instruction"
        priority = 1

        [[rules]]
        name = "healthy"
        description = "d"
        trigger_condition = "len(tool_output.items) == 2"
        instruction = "healthy instruction"
        priority = 2
    "#;

    #[test]
    fn failing_rule_is_skipped_under_fail_open_and_siblings_still_evaluate() {
        let repo = ContractRepository::from_toml_str("t.toml", MIXED_CONTRACT).unwrap();
        let ctx = EvaluationContext::from_output(json!({"items": [1, 2]}));

        let outcome = evaluate_contract(repo.lookup("t").unwrap(), &ctx, FailurePolicy::Open);

        assert_eq!(outcome.decision, Decision::Intervene);
        assert_eq!(outcome.triggered.len(), 1);
        assert_eq!(outcome.triggered[0].name, "healthy");

        // The failure is observable even though the rule did not trigger.
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].rule, "broken_reference");
        assert!(outcome.errors[0].message.contains("missing_key"));
    }

    #[test]
    fn failing_rule_counts_as_triggered_under_fail_closed() {
        let repo = ContractRepository::from_toml_str("t.toml", MIXED_CONTRACT).unwrap();
        let ctx = EvaluationContext::from_output(json!({"items": [1, 2]}));

        let outcome = evaluate_contract(repo.lookup("t").unwrap(), &ctx, FailurePolicy::Closed);

        assert_eq!(outcome.triggered.len(), 2);
        assert_eq!(outcome.triggered[0].name, "broken_reference");
        assert_eq!(outcome.triggered[1].name, "healthy");
        assert_eq!(outcome.errors.len(), 1);
    }

    // ── Determinism ──────────────────────────────────────────────────────────

    #[test]
    fn repeated_evaluation_yields_identical_outcomes() {
        let contract = search_contract();
        let ctx = results(4, 0.9);

        let first = evaluate_contract(&contract, &ctx, FailurePolicy::Open);
        for _ in 0..3 {
            assert_eq!(evaluate_contract(&contract, &ctx, FailurePolicy::Open), first);
        }
    }
}
