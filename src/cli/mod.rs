//! CLI command handling
//!
//! A minimal console host for the adapter: dispatches CLI commands and
//! renders run transitions to the terminal.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;

use crate::adapter::{Decoration, HostSink, SuiteInfo, TestAdapter, TestItem};
use crate::commands::Commands;
use crate::common::{Error, Result};

/// Dispatch a CLI command
pub async fn dispatch(
    command: Commands,
    workspace: PathBuf,
    config: Option<PathBuf>,
) -> Result<()> {
    let workspace = workspace.canonicalize().unwrap_or(workspace);
    let adapter = Arc::new(TestAdapter::new(workspace, config));

    match command {
        Commands::List { json } => {
            let tree = adapter
                .load()
                .await?
                .ok_or_else(|| Error::Config("adapter is busy".to_string()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print_suite(&tree, 0);
            }
            Ok(())
        }

        Commands::Run { ids } => {
            // Ctrl-C requests cooperative cancellation; the run still
            // resolves through the runner's exit.
            let canceller = Arc::clone(&adapter);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    canceller.cancel();
                }
            });

            let mut sink = ConsoleSink::default();
            let result = adapter.run(&ids, &mut sink).await?;

            match result {
                Some(run) => {
                    println!(
                        "\n{} passed, {} failed (runner exit code {})",
                        sink.passed.to_string().green(),
                        sink.failed.to_string().red(),
                        run.exit_code
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "none".to_string()),
                    );
                    if sink.failed > 0 {
                        std::process::exit(1);
                    }
                    Ok(())
                }
                None => {
                    println!("{}", "Run did not complete".yellow());
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Print the projected tree with indentation
fn print_suite(suite: &SuiteInfo, depth: usize) {
    let indent = "  ".repeat(depth);
    println!("{}{}", indent, suite.label.bold());
    for child in &suite.children {
        match child {
            TestItem::Suite(s) => print_suite(s, depth + 1),
            TestItem::Test(t) => {
                // Projected lines are 0-based; shown 1-based for humans
                println!(
                    "{}  {} ({}:{})",
                    indent,
                    t.label,
                    t.file.dimmed(),
                    t.line + 1
                );
            }
        }
    }
}

/// Console implementation of the host notification sink
#[derive(Default)]
struct ConsoleSink {
    passed: usize,
    failed: usize,
}

impl HostSink for ConsoleSink {
    fn run_started(&mut self, tests: &[String]) {
        if tests.is_empty() {
            println!("{}", "Running all tests".blue().bold());
        } else {
            println!("{} {}", "Running:".blue().bold(), tests.join(", "));
        }
    }

    fn suite_running(&mut self, id: &str) {
        println!("{} {}", "Suite".cyan(), id.bold());
    }

    fn suite_completed(&mut self, _id: &str) {}

    fn test_running(&mut self, _id: &str) {}

    fn test_passed(&mut self, id: &str) {
        self.passed += 1;
        println!("  {} {}", "✓".green(), id);
    }

    fn test_failed(&mut self, id: &str, message: &str, _decorations: &[Decoration]) {
        self.failed += 1;
        println!("  {} {}", "✗".red(), id.red());
        for line in message.lines() {
            println!("      {}", line.dimmed());
        }
    }

    fn tests_retired(&mut self, _tests: &[String]) {
        println!("{}", "Run cancelled; results are stale".yellow());
    }

    fn run_finished(&mut self) {}
}
