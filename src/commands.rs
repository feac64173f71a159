//! CLI command definitions
//!
//! Defines the clap commands for the pagetest CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run a suite of interpreter tests defined in a YAML file
    Run {
        /// Path to the YAML suite file
        path: PathBuf,

        /// Output results as JSON
        #[arg(long)]
        json: bool,

        /// Show diagnostics for passing tests too
        #[arg(long, short)]
        verbose: bool,
    },

    /// Run a single script file as one test method
    Script {
        /// Path to the script
        file: PathBuf,

        /// Test name (default: the file name)
        #[arg(long)]
        name: Option<String>,

        /// Output the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the interpreter and its support libraries are available
    Check {
        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
}
