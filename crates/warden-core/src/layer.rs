//! The reference `InterceptionHooks` implementation.
//!
//! `ControlLayer` wires a repository handle to the rule aggregator. Each
//! `on_tool_result` call pins one repository snapshot for its whole
//! evaluation, so a concurrent reload can never produce a half-swapped view
//! of the contract set.

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use warden_contracts::{
    Decision, EvaluationContext, FailurePolicy, RunId, RunState, ToolDisposition, WardenResult,
};
use warden_repo::SharedRepository;

use crate::aggregate::evaluate_contract;
use crate::traits::InterceptionHooks;

/// The policy-enforcement layer between an agent loop and its tools.
pub struct ControlLayer {
    repository: SharedRepository,
    failure_policy: FailurePolicy,
}

impl ControlLayer {
    /// Build a layer over an already-loaded repository with the default
    /// fail-open policy.
    pub fn new(repository: SharedRepository) -> Self {
        Self {
            repository,
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Build a layer with an explicit failure policy for erroring
    /// conditions.
    pub fn with_failure_policy(repository: SharedRepository, failure_policy: FailurePolicy) -> Self {
        Self {
            repository,
            failure_policy,
        }
    }

    /// Load contracts from `dir` and build a layer over them.
    pub fn from_dir(dir: &std::path::Path) -> WardenResult<Self> {
        Ok(Self::new(SharedRepository::load(dir)?))
    }

    /// The shared repository handle, for explicit reloads.
    pub fn repository(&self) -> &SharedRepository {
        &self.repository
    }
}

impl InterceptionHooks for ControlLayer {
    fn on_run_start(&self) -> WardenResult<RunState> {
        let snapshot = self.repository.snapshot();
        let state = RunState {
            run_id: RunId::new(),
            started_at: Utc::now(),
            guarded_tools: snapshot.tool_names(),
        };

        info!(
            run_id = %state.run_id,
            guarded_tools = state.guarded_tools.len(),
            "control layer run started"
        );
        Ok(state)
    }

    fn on_tool_result(
        &self,
        run: &RunState,
        tool_name: &str,
        tool_input: Option<Value>,
        tool_output: Value,
    ) -> WardenResult<ToolDisposition> {
        // One snapshot per invocation: lookup and every rule evaluation see
        // the same contract set even if a reload lands mid-call.
        let snapshot = self.repository.snapshot();

        let Some(contract) = snapshot.lookup(tool_name) else {
            debug!(
                run_id = %run.run_id,
                tool_name,
                "tool is unguarded, passing result through"
            );
            return Ok(ToolDisposition::Resume {
                output: tool_output,
            });
        };

        let ctx = EvaluationContext::new(tool_input, tool_output);
        let outcome = evaluate_contract(contract, &ctx, self.failure_policy);

        for failure in &outcome.errors {
            warn!(
                run_id = %run.run_id,
                tool_name,
                rule = %failure.rule,
                error = %failure.message,
                "rule condition failed to evaluate"
            );
        }

        match outcome.decision {
            Decision::Pass => {
                debug!(run_id = %run.run_id, tool_name, "all rules passed");
                Ok(ToolDisposition::Resume {
                    output: ctx.tool_output,
                })
            }
            Decision::Intervene => {
                let names: Vec<&str> =
                    outcome.triggered.iter().map(|r| r.name.as_str()).collect();
                warn!(
                    run_id = %run.run_id,
                    tool_name,
                    triggered = ?names,
                    "rules triggered, intervention required"
                );

                // The text is always present on Intervene; fall back to an
                // empty string rather than panic if that invariant ever
                // breaks upstream.
                let instruction = outcome.intervention_text.unwrap_or_default();
                Ok(ToolDisposition::Intervene {
                    output: ctx.tool_output,
                    instruction,
                    triggered: outcome.triggered,
                })
            }
        }
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

    fn layer() -> ControlLayer {
        let repo = ContractRepository::from_toml_str("search.toml", SEARCH_CONTRACT).unwrap();
        ControlLayer::new(SharedRepository::new(repo))
    }

    fn results(n: usize, score: f64) -> Value {
        let items: Vec<_> = (0..n).map(|_| json!({"score": score})).collect();
        json!({ "results": items })
    }

    // ── Run start ────────────────────────────────────────────────────────────

    #[test]
    fn run_start_announces_guarded_tools() {
        let layer = layer();
        let run = layer.on_run_start().unwrap();
        assert_eq!(run.guarded_tools, vec!["search".to_string()]);
    }

    #[test]
    fn each_run_gets_a_distinct_id() {
        let layer = layer();
        let a = layer.on_run_start().unwrap();
        let b = layer.on_run_start().unwrap();
        assert_ne!(a.run_id, b.run_id);
    }

    // ── Post hook ────────────────────────────────────────────────────────────

    #[test]
    fn unguarded_tool_passes_through_unchanged() {
        let layer = layer();
        let run = layer.on_run_start().unwrap();
        let output = json!({"anything": [1, 2, 3]});

        let disposition = layer
            .on_tool_result(&run, "browse", None, output.clone())
            .unwrap();

        match disposition {
            ToolDisposition::Resume { output: passed } => assert_eq!(passed, output),
            other => panic!("expected Resume, got {other:?}"),
        }
    }

    #[test]
    fn scarce_results_produce_an_intervention_with_composed_text() {
        let layer = layer();
        let run = layer.on_run_start().unwrap();

        let disposition = layer
            .on_tool_result(&run, "search", None, results(4, 0.9))
            .unwrap();

        match disposition {
            ToolDisposition::Intervene {
                output,
                instruction,
                triggered,
            } => {
                // The original output is carried through untouched.
                assert_eq!(output, results(4, 0.9));
                assert_eq!(triggered.len(), 2);
                assert_eq!(triggered[0].name, "result_count");
                assert_eq!(triggered[1].name, "result_relevance");
                assert!(instruction.contains("Ask the human"));
                assert!(instruction.contains("Flag low-relevance"));
            }
            other => panic!("expected Intervene, got {other:?}"),
        }
    }

    #[test]
    fn plentiful_results_resume_normally() {
        let layer = layer();
        let run = layer.on_run_start().unwrap();

        let disposition = layer
            .on_tool_result(&run, "search", None, results(6, 0.9))
            .unwrap();

        assert!(!disposition.is_intervention());
        assert_eq!(disposition.output(), &results(6, 0.9));
    }

    #[test]
    fn tool_input_is_visible_to_conditions() {
        let doc = r#"
            tool_name = "file_write"
            description = "d"

            [[rules]]
            name = "system_path"
            description = "writes outside the workspace need sign-off"
            trigger_condition = "not (\"workspace\" in tool_input.path)"
            instruction = "Confirm the destination path with the user."
            priority = 1
        "#;
        let repo = ContractRepository::from_toml_str("file_write.toml", doc).unwrap();
        let layer = ControlLayer::new(SharedRepository::new(repo));
        let run = layer.on_run_start().unwrap();

        let guarded = layer
            .on_tool_result(
                &run,
                "file_write",
                Some(json!({"path": "/etc/passwd"})),
                json!({"ok": true}),
            )
            .unwrap();
        assert!(guarded.is_intervention());

        let benign = layer
            .on_tool_result(
                &run,
                "file_write",
                Some(json!({"path": "/home/user/workspace/notes.md"})),
                json!({"ok": true}),
            )
            .unwrap();
        assert!(!benign.is_intervention());
    }

    #[test]
    fn reload_changes_what_subsequent_calls_see() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("search.toml"), SEARCH_CONTRACT).unwrap();

        let layer = ControlLayer::from_dir(dir.path()).unwrap();
        let run = layer.on_run_start().unwrap();

        let before = layer
            .on_tool_result(&run, "search", None, results(4, 0.9))
            .unwrap();
        assert!(before.is_intervention());

        // Replace the search contract with one for a different tool.
        std::fs::remove_file(dir.path().join("search.toml")).unwrap();
        let other = SEARCH_CONTRACT.replace("\"search\"", "\"lookup\"");
        std::fs::write(dir.path().join("lookup.toml"), other).unwrap();
        layer.repository().reload(dir.path()).unwrap();

        let after = layer
            .on_tool_result(&run, "search", None, results(4, 0.9))
            .unwrap();
        assert!(!after.is_intervention());
    }
}
