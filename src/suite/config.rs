//! Test suite configuration types
//!
//! Defines the data structures for deserializing YAML test suites.

use serde::Deserialize;
use std::path::PathBuf;

/// A suite of interpreter test methods loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct TestSuite {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite covers
    pub description: Option<String>,
    /// Per-suite interpreter overrides
    #[serde(default)]
    pub interpreter: InterpreterOverrides,
    /// Boilerplate emitted before each test body (overrides the config)
    pub prelude: Option<String>,
    /// Boilerplate emitted after each test body (overrides the config)
    pub epilogue: Option<String>,
    /// The test methods, run in order
    pub tests: Vec<SuiteTest>,
}

/// Interpreter settings a suite may override
#[derive(Deserialize, Debug, Default)]
pub struct InterpreterOverrides {
    /// Interpreter executable, relative paths resolved against the suite file
    pub path: Option<PathBuf>,
    /// Arguments passed before the source file
    pub args: Option<Vec<String>>,
    /// Support libraries that must exist
    pub libraries: Option<Vec<PathBuf>>,
    /// Exit status for a failed assertion
    pub failure_exit_code: Option<i32>,
}

/// A single test method
#[derive(Deserialize, Debug)]
pub struct SuiteTest {
    /// Test method name
    pub name: String,
    /// Inline script body
    pub script: Option<String>,
    /// Script file, relative to the suite file
    pub file: Option<PathBuf>,
}
