//! Contract loading, validation, and lookup.
//!
//! The repository is built once at startup from a directory of TOML
//! contract documents and is immutable thereafter. Validation is
//! fail-closed: the first malformed document aborts the whole load, so no
//! partial contract set is ever active. Every trigger condition is compiled
//! here — a repository never holds an unparseable rule.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use warden_contracts::{Contract, Rule, WardenError, WardenResult};
use warden_expr::Expr;

/// A rule paired with its compiled trigger condition.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Zero-based position of the rule in its contract document. Breaks
    /// priority ties.
    pub index: usize,
    /// The rule as declared.
    pub rule: Rule,
    /// The parsed trigger condition. Walked on every evaluation, never
    /// re-parsed.
    pub condition: Expr,
}

/// A validated contract whose rules are compiled and pre-sorted by
/// ascending priority (declaration order for ties).
#[derive(Debug, Clone)]
pub struct CompiledContract {
    /// The tool this contract guards.
    pub tool_name: String,
    /// Operator-facing description from the document.
    pub description: String,
    /// Compiled rules in evaluation/reporting order.
    pub rules: Vec<CompiledRule>,
}

/// An immutable, validated index of contracts by tool name.
#[derive(Debug, Default)]
pub struct ContractRepository {
    contracts: HashMap<String, CompiledContract>,
}

impl ContractRepository {
    /// Scan `dir` for `*.toml` contract documents and build a repository.
    ///
    /// Documents are processed in lexicographic file-name order so error
    /// reporting (in particular which file a duplicate is charged to) is
    /// deterministic. A missing directory, a directory without any TOML
    /// documents, or any malformed document is a `ConfigError` — startup
    /// must fail loudly rather than run with fewer guards than configured.
    pub fn load(dir: &Path) -> WardenResult<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| WardenError::ConfigError {
            reason: format!("cannot read contract directory '{}': {}", dir.display(), e),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            // A mid-scan entry error aborts the load like any other I/O
            // failure; skipping it could silently activate fewer guards
            // than configured.
            let entry = entry.map_err(|e| WardenError::ConfigError {
                reason: format!("cannot read contract directory '{}': {}", dir.display(), e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "toml") {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(WardenError::ConfigError {
                reason: format!(
                    "no contract documents (*.toml) found in '{}'",
                    dir.display()
                ),
            });
        }

        let mut documents = Vec::with_capacity(files.len());
        for path in files {
            let label = path.display().to_string();
            let contents =
                std::fs::read_to_string(&path).map_err(|e| WardenError::ConfigError {
                    reason: format!("cannot read contract document '{label}': {e}"),
                })?;
            let contract: Contract =
                toml::from_str(&contents).map_err(|e| WardenError::ConfigError {
                    reason: format!("malformed contract document '{label}': {e}"),
                })?;
            documents.push((label, contract));
        }

        let repository = Self::from_documents(documents)?;
        info!(
            contracts = repository.contracts.len(),
            directory = %dir.display(),
            "contract repository loaded"
        );
        Ok(repository)
    }

    /// Build a repository from already-parsed documents.
    ///
    /// `label` identifies each document (usually its path) in error
    /// messages. Validates shape, compiles conditions, and rejects
    /// duplicate tool names.
    pub fn from_documents(
        documents: impl IntoIterator<Item = (String, Contract)>,
    ) -> WardenResult<Self> {
        let mut contracts = HashMap::new();

        for (label, contract) in documents {
            let compiled = compile_contract(&label, contract)?;
            debug!(
                tool_name = %compiled.tool_name,
                rules = compiled.rules.len(),
                file = %label,
                "contract validated"
            );

            if contracts.contains_key(&compiled.tool_name) {
                return Err(WardenError::DuplicateContract {
                    tool_name: compiled.tool_name,
                    file: label,
                });
            }
            contracts.insert(compiled.tool_name.clone(), compiled);
        }

        Ok(Self { contracts })
    }

    /// Parse a single TOML document and build a one-contract repository.
    /// Intended for tests and embedded configurations.
    pub fn from_toml_str(label: &str, document: &str) -> WardenResult<Self> {
        let contract: Contract =
            toml::from_str(document).map_err(|e| WardenError::ConfigError {
                reason: format!("malformed contract document '{label}': {e}"),
            })?;
        Self::from_documents([(label.to_string(), contract)])
    }

    /// Return the contract guarding `tool_name`, or `None` for an unguarded
    /// tool. Pure and side-effect-free.
    pub fn lookup(&self, tool_name: &str) -> Option<&CompiledContract> {
        self.contracts.get(tool_name)
    }

    /// Sorted names of every guarded tool.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.contracts.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of loaded contracts.
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// True if no contracts are loaded.
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

/// Validate one document's shape and compile its conditions.
fn compile_contract(label: &str, contract: Contract) -> WardenResult<CompiledContract> {
    if contract.tool_name.trim().is_empty() {
        return Err(WardenError::ConfigError {
            reason: format!("contract document '{label}': tool_name must not be empty"),
        });
    }
    if contract.rules.is_empty() {
        return Err(WardenError::ConfigError {
            reason: format!(
                "contract document '{label}' (tool '{}'): rules must not be empty",
                contract.tool_name
            ),
        });
    }

    let mut seen = std::collections::HashSet::new();
    for rule in &contract.rules {
        if rule.name.trim().is_empty() {
            return Err(WardenError::ConfigError {
                reason: format!(
                    "contract document '{label}' (tool '{}'): rule name must not be empty",
                    contract.tool_name
                ),
            });
        }
        if !seen.insert(rule.name.clone()) {
            return Err(WardenError::ConfigError {
                reason: format!(
                    "contract document '{label}' (tool '{}'): duplicate rule name '{}'",
                    contract.tool_name, rule.name
                ),
            });
        }
    }

    let mut rules = Vec::with_capacity(contract.rules.len());
    for (index, rule) in contract.rules.into_iter().enumerate() {
        let condition = warden_expr::parse(&rule.trigger_condition).map_err(|e| {
            WardenError::ConditionParse {
                file: label.to_string(),
                rule: rule.name.clone(),
                reason: e.to_string(),
            }
        })?;
        rules.push(CompiledRule {
            index,
            rule,
            condition,
        });
    }

    // Evaluation and reporting order: ascending priority, declaration order
    // for ties. The sort is stable so equal priorities keep their indices.
    rules.sort_by_key(|r| (r.rule.priority, r.index));

    Ok(CompiledContract {
        tool_name: contract.tool_name,
        description: contract.description,
        rules,
    })
}
