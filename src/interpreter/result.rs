//! Result reporting for interpreter test cases

use serde::Serialize;

/// Final classification of one test method run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
    Errored,
    Skipped,
}

/// How a finished interpreter run is classified; a run that reached the
/// interpreter can never be skipped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
    Errored,
}

impl From<Verdict> for Outcome {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Passed => Outcome::Passed,
            Verdict::Failed => Outcome::Failed,
            Verdict::Errored => Outcome::Errored,
        }
    }
}

/// Receives test outcomes from the adapter
///
/// Exactly one of the `add_*` methods is called per run, bracketed by
/// `start_test` and `stop_test`.
pub trait TestResultSink {
    fn start_test(&mut self, _test: &str) {}
    fn add_success(&mut self, test: &str, diagnostic: &str);
    fn add_failure(&mut self, test: &str, diagnostic: &str);
    fn add_error(&mut self, test: &str, diagnostic: &str);
    fn add_skip(&mut self, test: &str, reason: &str);
    fn stop_test(&mut self, _test: &str) {}
}

/// A reported outcome with its diagnostic text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reported {
    pub test: String,
    pub detail: String,
}

impl Reported {
    fn new(test: &str, detail: &str) -> Self {
        Self {
            test: test.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Sink that records every outcome for later inspection
#[derive(Debug, Default, Clone, Serialize)]
pub struct CollectingResult {
    pub tests_run: usize,
    pub successes: Vec<Reported>,
    pub failures: Vec<Reported>,
    pub errors: Vec<Reported>,
    pub skipped: Vec<Reported>,
}

impl CollectingResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// No failures and no errors
    pub fn was_successful(&self) -> bool {
        self.failures.is_empty() && self.errors.is_empty()
    }
}

impl TestResultSink for CollectingResult {
    fn start_test(&mut self, _test: &str) {
        self.tests_run += 1;
    }

    fn add_success(&mut self, test: &str, diagnostic: &str) {
        self.successes.push(Reported::new(test, diagnostic));
    }

    fn add_failure(&mut self, test: &str, diagnostic: &str) {
        self.failures.push(Reported::new(test, diagnostic));
    }

    fn add_error(&mut self, test: &str, diagnostic: &str) {
        self.errors.push(Reported::new(test, diagnostic));
    }

    fn add_skip(&mut self, test: &str, reason: &str) {
        self.skipped.push(Reported::new(test, reason));
    }
}
