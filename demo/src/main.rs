//! WARDEN Control Layer — Demo CLI
//!
//! Validates a directory of contract documents, or simulates the
//! post-invocation hook against one synthetic tool result. Sample contracts
//! live under `demo/contracts/`.
//!
//! Usage:
//!   cargo run -p demo -- validate demo/contracts
//!   cargo run -p demo -- simulate demo/contracts --tool search \
//!       --output '{"results": [{"score": 0.9}]}'

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use warden_contracts::{ToolDisposition, WardenError, WardenResult};
use warden_core::{ControlLayer, InterceptionHooks};
use warden_repo::ContractRepository;

// ── CLI definition ────────────────────────────────────────────────────────────

/// WARDEN — tool-result policy enforcement for agent runtimes.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "WARDEN control layer demo",
    long_about = "Loads WARDEN contract documents and either reports what they guard\n\
                  or simulates the interception hooks against a synthetic tool result."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a contract directory and report every guarded tool and rule.
    Validate {
        /// Directory containing contract documents (*.toml).
        dir: PathBuf,
    },
    /// Run the interception hooks against one synthetic tool invocation.
    Simulate {
        /// Directory containing contract documents (*.toml).
        dir: PathBuf,
        /// Name of the tool whose result is being intercepted.
        #[arg(long)]
        tool: String,
        /// The tool's output, as a JSON document.
        #[arg(long)]
        output: String,
        /// The tool's input arguments, as a JSON document.
        #[arg(long)]
        input: Option<String>,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging; set RUST_LOG=debug to watch rule evaluation.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate { dir } => validate(&dir),
        Command::Simulate {
            dir,
            tool,
            output,
            input,
        } => simulate(&dir, &tool, &output, input.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("demo error: {e}");
        std::process::exit(1);
    }
}

// ── Subcommands ───────────────────────────────────────────────────────────────

fn validate(dir: &std::path::Path) -> WardenResult<()> {
    let repo = ContractRepository::load(dir)?;

    println!("Loaded {} contract(s) from {}", repo.len(), dir.display());
    for tool_name in repo.tool_names() {
        let contract = match repo.lookup(&tool_name) {
            Some(contract) => contract,
            None => continue,
        };
        println!();
        println!("tool: {}", contract.tool_name);
        println!("  {}", contract.description);
        for compiled in &contract.rules {
            println!(
                "  [{}] {}: {}",
                compiled.rule.priority, compiled.rule.name, compiled.rule.trigger_condition
            );
        }
    }
    Ok(())
}

fn simulate(
    dir: &std::path::Path,
    tool: &str,
    output: &str,
    input: Option<&str>,
) -> WardenResult<()> {
    let tool_output = parse_json("--output", output)?;
    let tool_input = input.map(|raw| parse_json("--input", raw)).transpose()?;

    let layer = ControlLayer::from_dir(dir)?;
    let run = layer.on_run_start()?;

    println!("run {} guarding tools: {:?}", run.run_id, run.guarded_tools);

    let disposition = layer.on_tool_result(&run, tool, tool_input, tool_output)?;
    match disposition {
        ToolDisposition::Resume { .. } => {
            println!("decision: PASS, result flows back to the agent unchanged");
        }
        ToolDisposition::Intervene {
            instruction,
            triggered,
            ..
        } => {
            println!("decision: INTERVENE");
            for rule in &triggered {
                println!("  triggered [{}]: {}", rule.priority, rule.name);
            }
            println!();
            println!("instruction for the agent/human:");
            println!("{instruction}");
        }
    }
    Ok(())
}

fn parse_json(flag: &str, raw: &str) -> WardenResult<serde_json::Value> {
    serde_json::from_str(raw).map_err(|e| WardenError::ConfigError {
        reason: format!("{flag} is not valid JSON: {e}"),
    })
}
