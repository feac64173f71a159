//! End-to-end tests for the interpreter test adapter and page rendering
//!
//! `/bin/sh` stands in for the external interpreter: the generated
//! "source" is a shell script, so each exit path (clean exit, error exit,
//! death by signal) can be produced on demand.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pagetest::common::config::{Config, SourceDelivery};
use pagetest::interpreter::{
    CaseState, CollectingResult, FixedLocator, InterpreterTestCase, Outcome, TestMethod,
};
use pagetest::render::{render_page, Rendering, Resource};
use pagetest::request::FakeRequest;
use pagetest::url::UrlOverlay;
use pagetest::{suite, Error};

/// Test context with a scratch directory and a shell "interpreter"
struct TestContext {
    dir: tempfile::TempDir,
    shell: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
            shell: PathBuf::from("/bin/sh"),
        }
    }

    /// A case whose generated source is exactly `script`
    fn case(&self, name: &str, script: &str) -> InterpreterTestCase {
        let script = script.to_string();
        InterpreterTestCase::new(TestMethod::named(name))
            .with_locator(FixedLocator::new(&self.shell))
            .with_source(move |_: &TestMethod| script.clone())
    }

    /// Write an executable wrapper script into the scratch dir
    #[cfg(unix)]
    fn write_interpreter(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write interpreter");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod interpreter");
        path
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// The case's last interpreter has exited and been waited on
#[cfg(unix)]
fn assert_reaped(case: &InterpreterTestCase) {
    let pid = case.last_pid().expect("case never spawned an interpreter") as libc::pid_t;
    let alive = unsafe { libc::kill(pid, 0) };
    assert_eq!(alive, -1, "interpreter {} still exists", pid);
    assert_eq!(
        std::io::Error::last_os_error().raw_os_error(),
        Some(libc::ESRCH)
    );
}

#[cfg(unix)]
#[test]
fn test_successful_exit_passes() {
    let ctx = TestContext::new();
    let mut case = ctx.case("test_pass", "echo ok; exit 0");
    let mut result = CollectingResult::new();

    assert_eq!(case.run(&mut result), Outcome::Passed);
    assert_eq!(result.successes.len(), 1);
    assert!(result.was_successful());
    assert_eq!(case.state(), CaseState::Passed);
    assert_eq!(case.spawn_count(), 1);
    assert_reaped(&case);
}

#[cfg(unix)]
#[test]
fn test_unsuccessful_exit_is_error() {
    let ctx = TestContext::new();
    let mut case = ctx.case("test_throw", "echo 'TypeError: boom' >&2; exit 3");
    let mut result = CollectingResult::new();

    assert_eq!(case.run(&mut result), Outcome::Errored);
    assert_eq!(result.errors.len(), 1);
    assert!(result.failures.is_empty());
    let detail = &result.errors[0].detail;
    assert!(detail.contains("exited with status 3"), "{detail}");
    assert!(detail.contains("TypeError: boom"), "{detail}");
    assert_reaped(&case);
}

#[cfg(unix)]
#[test]
fn test_signalled_exit_is_error() {
    let ctx = TestContext::new();
    let crasher = ctx.write_interpreter("segfault", "kill -SEGV $$");
    let mut case = InterpreterTestCase::new(TestMethod::named("test_crash"))
        .with_locator(move || -> pagetest::Result<PathBuf> { Ok(crasher.clone()) })
        .with_source(|_: &TestMethod| String::new());
    let mut result = CollectingResult::new();

    assert_eq!(case.run(&mut result), Outcome::Errored);
    assert_eq!(result.errors.len(), 1);
    assert!(result.failures.is_empty());
    assert!(result.errors[0].detail.contains("SIGSEGV"));
    assert_eq!(case.state(), CaseState::Errored);
    assert_reaped(&case);
}

#[cfg(unix)]
#[test]
fn test_failure_exit_code_is_failure() {
    let ctx = TestContext::new();
    let mut case = ctx
        .case("test_assert", "echo 'expected 1, got 2'; exit 2")
        .with_failure_exit_code(Some(2));
    let mut result = CollectingResult::new();

    assert_eq!(case.run(&mut result), Outcome::Failed);
    assert_eq!(result.failures.len(), 1);
    assert!(result.errors.is_empty());
    assert!(result.failures[0].detail.contains("expected 1, got 2"));
    assert_reaped(&case);
}

#[cfg(unix)]
#[test]
fn test_stdin_delivery() {
    let ctx = TestContext::new();
    let mut case = ctx
        .case("test_stdin", "echo piped\nexit 0\n")
        .with_delivery(SourceDelivery::Stdin);
    let mut result = CollectingResult::new();

    assert_eq!(case.run(&mut result), Outcome::Passed);
    assert!(result.successes[0].detail.contains("piped"));
    assert_reaped(&case);
}

#[test]
fn test_missing_interpreter_skips_without_spawning() {
    let mut case = InterpreterTestCase::new(TestMethod::new("test_js", "print(1);"))
        .with_locator(FixedLocator::new("/nonexistent/pagetest/smjs"));

    let err = case.check_dependencies().unwrap_err();
    assert!(matches!(err, Error::NotSupported(_)));

    let mut result = CollectingResult::new();
    assert_eq!(case.run(&mut result), Outcome::Skipped);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.tests_run, 1);
    assert_eq!(case.spawn_count(), 0);
    assert_eq!(case.last_pid(), None);
}

#[cfg(unix)]
#[test]
fn test_each_run_spawns_once() {
    let ctx = TestContext::new();
    let mut case = ctx.case("test_twice", "exit 0");
    let mut result = CollectingResult::new();

    case.run(&mut result);
    case.run(&mut result);
    assert_eq!(case.spawn_count(), 2);
    assert_eq!(result.tests_run, 2);
    assert_eq!(result.successes.len(), 2);
}

#[cfg(unix)]
#[test]
fn test_boilerplate_source_from_config() {
    let ctx = TestContext::new();
    let config = Config::from_toml_str(
        r#"
[interpreter]
path = "/bin/sh"
prelude = "echo start {name}"
epilogue = "exit 0"
source_suffix = ".sh"
"#,
    )
    .unwrap();
    let marker = ctx.path().join("ran");
    let body = format!("touch '{}'", marker.display());
    let mut case = InterpreterTestCase::from_config(TestMethod::new("test_config", body), &config);
    let mut result = CollectingResult::new();

    assert_eq!(case.run(&mut result), Outcome::Passed);
    assert!(marker.exists());
}

#[cfg(unix)]
#[test]
fn test_suite_runs_every_method() {
    let ctx = TestContext::new();
    fs::write(ctx.path().join("ok.sh"), "exit 0").unwrap();
    let suite_path = ctx.path().join("suite.yaml");
    fs::write(
        &suite_path,
        r#"
name: shell suite
interpreter:
  path: /bin/sh
  failure_exit_code: 2
prelude: ""
tests:
  - name: passes
    file: ok.sh
  - name: fails
    script: "exit 2"
  - name: errors
    script: "exit 7"
  - name: missing
    file: nope.sh
"#,
    )
    .unwrap();

    let report = suite::run_suite(&suite_path, &Config::default(), false, true).unwrap();
    let outcomes: Vec<Outcome> = report.outcomes.iter().map(|(_, o)| *o).collect();
    assert_eq!(
        outcomes,
        vec![Outcome::Passed, Outcome::Failed, Outcome::Errored, Outcome::Errored]
    );
    assert_eq!(report.result.tests_run, 4);
    assert!(!report.passed());
}

struct LinkPage;

impl Resource for LinkPage {
    fn render(&self, request: &mut FakeRequest) -> Rendering {
        let link = UrlOverlay::root().child("foo").resolve(request);
        Rendering::pending(async move { Ok(Rendering::Complete(format!("<a href=\"{link}\"/>"))) })
    }
}

#[tokio::test]
async fn test_render_page_resolves_relative_url() {
    let page = render_page(Arc::new(LinkPage), None).await.unwrap();
    assert!(page.output.contains("http://localhost/foo"));
    assert_eq!(page.request.code(), 200);
}
