//! Interpreter test suites
//!
//! A YAML file lists test methods (inline scripts or script files) that
//! share interpreter settings. Each method runs as its own
//! `InterpreterTestCase`, so one crashing method never hides the others.

mod config;
mod runner;

pub use config::*;
pub use runner::{load_suite, run_suite, SuiteReport};
