//! CLI command handling
//!
//! Dispatches CLI commands and formats their output. Interpreter runs block,
//! so they are moved off the async runtime with `spawn_blocking`.

use std::path::PathBuf;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::interpreter::{CollectingResult, InterpreterTestCase, Outcome, TestMethod};
use crate::suite;

/// Dispatch a CLI command
///
/// Returns whether every test that ran passed.
pub async fn dispatch(command: Commands) -> Result<bool> {
    let config = Config::load()?;

    match command {
        Commands::Run {
            path,
            json,
            verbose,
        } => {
            let report = blocking(move || suite::run_suite(&path, &config, verbose, json)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Ok(report.passed())
        }

        Commands::Script { file, name, json } => {
            let (outcome, result) = blocking(move || run_script(file, name, &config)).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "outcome": outcome,
                        "result": result,
                    }))?
                );
            } else {
                print_script_result(outcome, &result);
            }
            Ok(result.was_successful())
        }

        Commands::Check { json } => {
            let method = TestMethod::named("check");
            let mut case = InterpreterTestCase::from_config(method, &config);
            let check = case.check_dependencies();

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "satisfied": check.is_ok(),
                        "reason": check.as_ref().err().map(|e| e.to_string()),
                    }))?
                );
            } else {
                match &check {
                    Ok(()) => println!("{} interpreter dependencies satisfied", "✓".green()),
                    Err(e) => println!("{} {}", "✗".red(), e),
                }
            }
            Ok(check.is_ok())
        }
    }
}

/// Run blocking work on tokio's blocking pool
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?
}

fn run_script(
    file: PathBuf,
    name: Option<String>,
    config: &Config,
) -> Result<(Outcome, CollectingResult)> {
    let script = std::fs::read_to_string(&file).map_err(|e| Error::FileRead {
        path: file.display().to_string(),
        error: e.to_string(),
    })?;
    let name = name.unwrap_or_else(|| {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "script".to_string())
    });

    let mut result = CollectingResult::new();
    let outcome =
        InterpreterTestCase::from_config(TestMethod::new(name, script), config).run(&mut result);
    Ok((outcome, result))
}

fn print_script_result(outcome: Outcome, result: &CollectingResult) {
    let (label, reported) = match outcome {
        Outcome::Passed => ("PASSED".green().bold(), result.successes.first()),
        Outcome::Failed => ("FAILED".red().bold(), result.failures.first()),
        Outcome::Errored => ("ERROR".red().bold(), result.errors.first()),
        Outcome::Skipped => ("SKIPPED".yellow().bold(), result.skipped.first()),
    };
    match reported {
        Some(r) => {
            println!("{} {}", label, r.test);
            if !r.detail.is_empty() {
                println!("{}", r.detail.dimmed());
            }
        }
        None => println!("{}", label),
    }
}
