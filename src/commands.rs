//! CLI command definitions
//!
//! Defines the clap commands for the testhook CLI.

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Discover tests and print the suite tree
    List {
        /// Print the projected tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run tests (all tests when no identifiers are given)
    Run {
        /// Test or suite identifiers to run
        ids: Vec<String>,
    },
}
