//! One test method executed by an external interpreter

use std::path::PathBuf;

use crate::common::config::{Config, SourceDelivery};
use crate::common::{truncate_output, Error, Result};

use super::locator::{self, InterpreterLocator};
use super::process::{Invocation, ProcessOutput, RunningProcess, Termination};
use super::result::{Outcome, TestResultSink, Verdict};
use super::source::{BoilerplateSource, SourceGenerator};
use super::TestMethod;

/// Lifecycle of an interpreter test case
///
/// `Unchecked -> {Ready, Skipped, Errored}`, `Ready -> Running -> {Passed, Failed, Errored}`.
/// A finished case may be run again, which goes back through `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseState {
    Unchecked,
    Ready,
    Skipped,
    Running,
    Passed,
    Failed,
    Errored,
}

/// Cached result of the dependency check
#[derive(Debug, Clone)]
enum DependencyCheck {
    Satisfied(PathBuf),
    /// The environment lacks the interpreter or a library
    Unsatisfied(String),
    /// The check itself failed; not a reason to skip
    Failed(String),
}

/// Runs a single test method in an interpreter subprocess
pub struct InterpreterTestCase {
    method: TestMethod,
    locator: Box<dyn InterpreterLocator>,
    source: Box<dyn SourceGenerator>,
    args: Vec<String>,
    libraries: Vec<PathBuf>,
    delivery: SourceDelivery,
    source_suffix: String,
    pass_exit_code: i32,
    failure_exit_code: Option<i32>,
    max_diagnostic_bytes: usize,
    state: CaseState,
    dependencies: Option<DependencyCheck>,
    last_pid: Option<u32>,
    spawn_count: usize,
}

impl InterpreterTestCase {
    /// Case using the default configuration
    pub fn new(method: TestMethod) -> Self {
        Self::from_config(method, &Config::default())
    }

    pub fn from_config(method: TestMethod, config: &Config) -> Self {
        let interp = &config.interpreter;
        Self {
            method,
            locator: locator::from_config(interp),
            source: Box::new(BoilerplateSource::from_config(interp)),
            args: interp.args.clone(),
            libraries: interp.libraries.clone(),
            delivery: interp.delivery,
            source_suffix: interp.source_suffix.clone(),
            pass_exit_code: interp.pass_exit_code,
            failure_exit_code: interp.failure_exit_code,
            max_diagnostic_bytes: config.output.max_diagnostic_bytes,
            state: CaseState::Unchecked,
            dependencies: None,
            last_pid: None,
            spawn_count: 0,
        }
    }

    /// Replace the interpreter lookup; resets any cached dependency check
    pub fn with_locator(mut self, locator: impl InterpreterLocator + 'static) -> Self {
        self.locator = Box::new(locator);
        self.dependencies = None;
        self.state = CaseState::Unchecked;
        self
    }

    /// Replace source generation
    pub fn with_source(mut self, source: impl SourceGenerator + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_delivery(mut self, delivery: SourceDelivery) -> Self {
        self.delivery = delivery;
        self
    }

    /// Exit status the interpreter uses for a failed assertion
    pub fn with_failure_exit_code(mut self, code: Option<i32>) -> Self {
        self.failure_exit_code = code;
        self
    }

    /// Support libraries that must exist; resets any cached dependency check
    pub fn with_libraries(mut self, libraries: Vec<PathBuf>) -> Self {
        self.libraries = libraries;
        self.dependencies = None;
        self.state = CaseState::Unchecked;
        self
    }

    pub fn name(&self) -> &str {
        self.method.name()
    }

    pub fn state(&self) -> CaseState {
        self.state
    }

    /// Number of interpreter processes this case has started
    pub fn spawn_count(&self) -> usize {
        self.spawn_count
    }

    /// Pid of the most recently spawned interpreter; it has been reaped
    /// by the time `run` returns
    pub fn last_pid(&self) -> Option<u32> {
        self.last_pid
    }

    /// Look for the interpreter and its support libraries
    ///
    /// Runs once per case; later calls return the cached answer. A
    /// missing interpreter or library comes back as `Error::NotSupported`;
    /// any other failure as `Error::DependencyCheckFailed`.
    pub fn check_dependencies(&mut self) -> Result<()> {
        self.interpreter_path().map(|_| ())
    }

    pub fn dependencies_satisfied(&mut self) -> bool {
        self.check_dependencies().is_ok()
    }

    fn interpreter_path(&mut self) -> Result<PathBuf> {
        if self.dependencies.is_none() {
            let check = match self.locate_dependencies() {
                Ok(path) => {
                    tracing::debug!(test = %self.method.name(), path = %path.display(), "dependencies satisfied");
                    self.state = CaseState::Ready;
                    DependencyCheck::Satisfied(path)
                }
                Err(e) if e.is_not_supported() => {
                    tracing::debug!(test = %self.method.name(), reason = %e, "dependencies missing");
                    self.state = CaseState::Skipped;
                    DependencyCheck::Unsatisfied(e.to_string())
                }
                Err(e) => {
                    tracing::warn!(test = %self.method.name(), error = %e, "dependency check failed");
                    self.state = CaseState::Errored;
                    DependencyCheck::Failed(e.to_string())
                }
            };
            self.dependencies = Some(check);
        }

        match &self.dependencies {
            Some(DependencyCheck::Satisfied(path)) => Ok(path.clone()),
            Some(DependencyCheck::Unsatisfied(reason)) => Err(Error::NotSupported(reason.clone())),
            Some(DependencyCheck::Failed(reason)) => {
                Err(Error::DependencyCheckFailed(reason.clone()))
            }
            None => Err(Error::NotSupported("dependency check did not run".to_string())),
        }
    }

    fn locate_dependencies(&self) -> Result<PathBuf> {
        let path = self.locator.locate()?;
        for library in &self.libraries {
            if !library.exists() {
                return Err(Error::NotSupported(format!(
                    "support library {} not found",
                    library.display()
                )));
            }
        }
        Ok(path)
    }

    /// Execute the test method, reporting exactly one outcome to `sink`
    ///
    /// Blocks until the interpreter exits. There is no timeout.
    pub fn run(&mut self, sink: &mut dyn TestResultSink) -> Outcome {
        let name = self.method.name().to_string();
        sink.start_test(&name);
        let outcome = self.execute(&name, sink);
        sink.stop_test(&name);
        tracing::info!(test = %name, outcome = ?outcome, "test finished");
        outcome
    }

    fn execute(&mut self, name: &str, sink: &mut dyn TestResultSink) -> Outcome {
        let interpreter = match self.interpreter_path() {
            Ok(path) => path,
            Err(e) if e.is_not_supported() => {
                self.state = CaseState::Skipped;
                sink.add_skip(name, &e.to_string());
                return Outcome::Skipped;
            }
            Err(e) => {
                self.state = CaseState::Errored;
                sink.add_error(name, &e.to_string());
                return Outcome::Errored;
            }
        };

        let source = match self.source.generate(&self.method) {
            Ok(source) => source,
            Err(e) => {
                self.state = CaseState::Errored;
                sink.add_error(name, &e.to_string());
                return Outcome::Errored;
            }
        };

        self.state = CaseState::Running;
        let output = match self.spawn_and_wait(&interpreter, &source) {
            Ok(output) => output,
            Err(e) => {
                self.state = CaseState::Errored;
                sink.add_error(name, &e.to_string());
                return Outcome::Errored;
            }
        };

        let verdict = self.classify(output.termination);
        let diagnostic = self.diagnostic(&output);
        match verdict {
            Verdict::Passed => {
                self.state = CaseState::Passed;
                sink.add_success(name, &diagnostic);
            }
            Verdict::Failed => {
                self.state = CaseState::Failed;
                sink.add_failure(name, &diagnostic);
            }
            Verdict::Errored => {
                if let Termination::Signaled(_) = output.termination {
                    tracing::warn!(test = %name, "{}", output.termination.describe());
                }
                self.state = CaseState::Errored;
                sink.add_error(name, &diagnostic);
            }
        }
        verdict.into()
    }

    fn spawn_and_wait(&mut self, interpreter: &std::path::Path, source: &str) -> Result<ProcessOutput> {
        let process = RunningProcess::spawn(Invocation {
            program: interpreter,
            args: &self.args,
            source,
            delivery: self.delivery,
            source_suffix: &self.source_suffix,
        })?;
        self.spawn_count += 1;
        self.last_pid = process.id();
        process.wait()
    }

    /// Map a termination onto an outcome; only the pass status passes and
    /// only the configured failure status fails
    pub fn classify(&self, termination: Termination) -> Verdict {
        match termination {
            Termination::Exited(code) if code == self.pass_exit_code => Verdict::Passed,
            Termination::Exited(code) if Some(code) == self.failure_exit_code => Verdict::Failed,
            Termination::Exited(_) => Verdict::Errored,
            Termination::Signaled(_) => Verdict::Errored,
        }
    }

    fn diagnostic(&self, output: &ProcessOutput) -> String {
        let mut text = output.termination.describe();
        for (label, stream) in [("stdout", &output.stdout), ("stderr", &output.stderr)] {
            if !stream.trim().is_empty() {
                text.push_str(&format!(
                    "\n--- {} ---\n{}",
                    label,
                    truncate_output(stream, self.max_diagnostic_bytes)
                ));
            }
        }
        text
    }
}

impl std::fmt::Debug for InterpreterTestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterpreterTestCase")
            .field("method", &self.method)
            .field("state", &self.state)
            .field("spawn_count", &self.spawn_count)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::result::CollectingResult;

    fn missing() -> Result<PathBuf> {
        Err(Error::NotSupported("no interpreter here".to_string()))
    }

    #[test]
    fn test_classify_is_conservative() {
        let case = InterpreterTestCase::new(TestMethod::new("t", ""));
        assert_eq!(case.classify(Termination::Exited(0)), Verdict::Passed);
        assert_eq!(case.classify(Termination::Exited(1)), Verdict::Errored);
        assert_eq!(case.classify(Termination::Exited(3)), Verdict::Errored);
        assert_eq!(case.classify(Termination::Signaled(11)), Verdict::Errored);
    }

    #[test]
    fn test_classify_with_failure_code() {
        let case = InterpreterTestCase::new(TestMethod::new("t", ""))
            .with_failure_exit_code(Some(2));
        assert_eq!(case.classify(Termination::Exited(2)), Verdict::Failed);
        assert_eq!(case.classify(Termination::Exited(3)), Verdict::Errored);
        assert_eq!(case.classify(Termination::Signaled(2)), Verdict::Errored);
    }

    #[test]
    fn test_unsatisfied_dependencies_skip_without_spawn() {
        let mut case = InterpreterTestCase::new(TestMethod::new("t", "print(1)"))
            .with_locator(missing);
        assert!(case.check_dependencies().unwrap_err().is_not_supported());
        assert_eq!(case.state(), CaseState::Skipped);

        let mut result = CollectingResult::new();
        assert_eq!(case.run(&mut result), Outcome::Skipped);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.errors.is_empty() && result.failures.is_empty());
        assert_eq!(case.spawn_count(), 0);
    }

    #[test]
    fn test_broken_locator_is_error_not_skip() {
        let mut case = InterpreterTestCase::new(TestMethod::new("t", "print(1)")).with_locator(
            || -> Result<PathBuf> {
                Err(Error::Io(std::io::Error::other("permission denied reading PATH")))
            },
        );
        assert!(matches!(case.check_dependencies(), Err(Error::DependencyCheckFailed(_))));

        let mut result = CollectingResult::new();
        assert_eq!(case.run(&mut result), Outcome::Errored);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].detail.contains("permission denied"));
        assert!(result.skipped.is_empty());
        assert_eq!(case.state(), CaseState::Errored);
        assert_eq!(case.spawn_count(), 0);
    }

    #[test]
    fn test_missing_library_is_not_supported() {
        let mut case = InterpreterTestCase::new(TestMethod::new("t", ""))
            .with_locator(|| -> Result<PathBuf> { Ok(PathBuf::from("/bin/sh")) })
            .with_libraries(vec![PathBuf::from("/nonexistent/pagetest/unittest.js")]);
        assert!(!case.dependencies_satisfied());
        assert!(matches!(case.check_dependencies(), Err(Error::NotSupported(_))));
    }

    #[test]
    fn test_dependency_check_runs_once() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut case = InterpreterTestCase::new(TestMethod::new("t", "")).with_locator(
            move || -> Result<PathBuf> {
                counter.fetch_add(1, Ordering::SeqCst);
                missing()
            },
        );
        assert!(!case.dependencies_satisfied());
        assert!(!case.dependencies_satisfied());
        case.run(&mut CollectingResult::new());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_source_generation_error_is_reported() {
        let mut case = InterpreterTestCase::new(TestMethod::named("t"))
            .with_locator(|| -> Result<PathBuf> { Ok(PathBuf::from("/bin/sh")) });
        let mut result = CollectingResult::new();
        assert_eq!(case.run(&mut result), Outcome::Errored);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(case.spawn_count(), 0);
    }
}
