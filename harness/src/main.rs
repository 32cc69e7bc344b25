//! Sequential test-suite harness CLI.
//!
//! Discovers containerized-CLI test units under `<root>/subtests`, builds an
//! ordered plan interleaved with environment checks, and runs each unit in
//! isolation with a timeout.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use harness::core::plan::Action;
use harness::exit_codes;
use harness::io::config::load_config;
use harness::io::engine::ProcessEngine;
use harness::io::envcheck::CommandCheckRunner;
use harness::schedule::{plan_suite, run_suite};
use harness::{logging, schedule::SuiteOutcome};

#[derive(Parser)]
#[command(
    name = "harness",
    version,
    about = "Sequential harness for containerized CLI test suites"
)]
struct Cli {
    /// Suite root directory (holds harness.toml, subtests/, support/).
    #[arg(long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List discoverable unit identifiers in plan order.
    Discover,
    /// Print the ordered action plan without executing it.
    Plan {
        /// Comma-separated unit names to run instead of full discovery.
        #[arg(long)]
        subtests: Option<String>,
        /// Emit the plan as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Build the plan and execute every action in order.
    Run {
        /// Comma-separated unit names to run instead of full discovery.
        #[arg(long)]
        subtests: Option<String>,
    },
}

fn main() -> ExitCode {
    logging::init();
    match run() {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(exit_codes::INVALID as u8)
        }
    }
}

fn run() -> Result<u8> {
    let cli = Cli::parse();
    let cfg = load_config(&cli.root.join("harness.toml")).context("load harness config")?;

    match cli.command {
        Command::Discover => {
            let (units, _) = plan_suite(&cli.root, &cfg, None)?;
            for unit in units {
                println!("{}", unit.id);
            }
            Ok(exit_codes::OK as u8)
        }
        Command::Plan { subtests, json } => {
            let (_, plan) = plan_suite(&cli.root, &cfg, subtests.as_deref())?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&plan).context("serialize plan")?
                );
            } else {
                for (index, action) in plan.iter().enumerate() {
                    println!("{}. {}", index + 1, describe(action));
                }
            }
            Ok(exit_codes::OK as u8)
        }
        Command::Run { subtests } => {
            let engine = ProcessEngine::new(
                cfg.output_limit_bytes,
                cli.root.join(&cfg.support.dir),
            );
            let checker = CommandCheckRunner::new(&cli.root, &cfg.envcheck, cfg.output_limit_bytes);
            let outcome = run_suite(&cli.root, &cfg, subtests.as_deref(), &engine, &checker)?;
            print_summary(&outcome);
            if outcome.all_passed() {
                Ok(exit_codes::OK as u8)
            } else {
                Ok(exit_codes::UNIT_FAILED as u8)
            }
        }
    }
}

fn describe(action: &Action) -> String {
    match action {
        Action::EnvCheck { context } => format!("env-check {}", context.label()),
        Action::RunUnit { unit } => format!(
            "run-unit {} ({}, timeout {}s)",
            unit.id, unit.tag, unit.timeout_secs
        ),
    }
}

fn print_summary(outcome: &SuiteOutcome) {
    for result in &outcome.results {
        let detail = result
            .detail
            .as_deref()
            .map(|detail| format!(" ({detail})"))
            .unwrap_or_default();
        println!("{}\t{:?}{}", result.unit.id, result.outcome, detail);
    }
    println!(
        "{} passed, {} failed of {}",
        outcome.passed_count(),
        outcome.failed_count(),
        outcome.results.len()
    );
}
