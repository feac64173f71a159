//! Tests written for an external interpreter
//!
//! Each test method runs in its own interpreter subprocess. The adapter
//! looks for the interpreter, generates the program text, spawns the
//! process, waits for it and turns its termination into a test outcome:
//!
//! - missing interpreter or support library: skipped
//! - the pass exit status: passed
//! - the configured failure exit status: failed
//! - any other exit status, or death by signal: error

mod case;
pub mod locator;
pub mod process;
pub mod result;
pub mod source;

pub use case::{CaseState, InterpreterTestCase};
pub use locator::{FixedLocator, InterpreterLocator, PathLocator};
pub use process::Termination;
pub use result::{CollectingResult, Outcome, TestResultSink, Verdict};
pub use source::{BoilerplateSource, SourceGenerator};

/// A named test method and its script body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMethod {
    name: String,
    script: Option<String>,
}

impl TestMethod {
    pub fn new(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: Some(script.into()),
        }
    }

    /// A method with no body, for generators that build source from the name alone
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            script: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> Option<&str> {
        self.script.as_deref()
    }
}
