//! Suite runner implementation
//!
//! Runs each test method of a suite through its own interpreter test case
//! and prints one line per test plus a summary.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::interpreter::{
    CollectingResult, InterpreterTestCase, Outcome, TestMethod, TestResultSink,
};

use super::config::{SuiteTest, TestSuite};

/// Result of a suite run
#[derive(Debug, Serialize)]
pub struct SuiteReport {
    pub name: String,
    pub outcomes: Vec<(String, Outcome)>,
    pub result: CollectingResult,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.result.was_successful()
    }
}

/// Load a suite from a YAML file
pub fn load_suite(path: &Path) -> Result<TestSuite> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Run every test in the suite at `path`
pub fn run_suite(path: &Path, config: &Config, verbose: bool, quiet: bool) -> Result<SuiteReport> {
    let suite = load_suite(path)?;
    let suite_dir = path.parent().unwrap_or(Path::new("."));
    let config = suite_config(&suite, suite_dir, config);

    if !quiet {
        println!("\n{} {}", "Running Suite:".blue().bold(), suite.name.white().bold());
        if let Some(desc) = &suite.description {
            println!("  {}", desc.dimmed());
        }
    }

    let mut result = CollectingResult::new();
    let mut outcomes = Vec::with_capacity(suite.tests.len());

    for test in &suite.tests {
        let outcome = match load_method(test, suite_dir) {
            Ok(method) => {
                InterpreterTestCase::from_config(method, &config).run(&mut result)
            }
            Err(e) => {
                result.start_test(&test.name);
                result.add_error(&test.name, &e.to_string());
                result.stop_test(&test.name);
                Outcome::Errored
            }
        };

        if !quiet {
            print_outcome(&test.name, outcome, &result, verbose);
        }
        outcomes.push((test.name.clone(), outcome));
    }

    let report = SuiteReport {
        name: suite.name,
        outcomes,
        result,
    };
    if !quiet {
        print_summary(&report);
    }
    Ok(report)
}

/// Fold the suite's overrides into the base configuration
fn suite_config(suite: &TestSuite, suite_dir: &Path, base: &Config) -> Config {
    let mut config = base.clone();
    let interp = &mut config.interpreter;
    let overrides = &suite.interpreter;

    if let Some(path) = &overrides.path {
        interp.path = Some(resolve(suite_dir, path));
    }
    if let Some(args) = &overrides.args {
        interp.args = args.clone();
    }
    if let Some(libraries) = &overrides.libraries {
        interp.libraries = libraries.iter().map(|l| resolve(suite_dir, l)).collect();
    }
    if overrides.failure_exit_code.is_some() {
        interp.failure_exit_code = overrides.failure_exit_code;
    }
    if let Some(prelude) = &suite.prelude {
        interp.prelude = prelude.clone();
    }
    if let Some(epilogue) = &suite.epilogue {
        interp.epilogue = epilogue.clone();
    }
    config
}

fn resolve(dir: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        dir.join(path)
    } else {
        path.to_path_buf()
    }
}

fn load_method(test: &SuiteTest, suite_dir: &Path) -> Result<TestMethod> {
    match (&test.script, &test.file) {
        (Some(script), None) => Ok(TestMethod::new(&test.name, script.as_str())),
        (None, Some(file)) => {
            let path = resolve(suite_dir, file);
            let script = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;
            Ok(TestMethod::new(&test.name, script))
        }
        (Some(_), Some(_)) => Err(Error::Config(format!(
            "test '{}' has both 'script' and 'file'",
            test.name
        ))),
        (None, None) => Err(Error::Config(format!(
            "test '{}' needs either 'script' or 'file'",
            test.name
        ))),
    }
}

fn print_outcome(name: &str, outcome: Outcome, result: &CollectingResult, verbose: bool) {
    let (mark, detail) = match outcome {
        Outcome::Passed => ("✓".green(), result.successes.last()),
        Outcome::Failed => ("✗".red(), result.failures.last()),
        Outcome::Errored => ("E".red().bold(), result.errors.last()),
        Outcome::Skipped => ("-".yellow(), result.skipped.last()),
    };
    println!("  {} {}", mark, name);

    let show_detail = verbose || !matches!(outcome, Outcome::Passed);
    if let Some(reported) = detail.filter(|_| show_detail) {
        for line in reported.detail.lines() {
            println!("      {}", line.dimmed());
        }
    }
}

fn print_summary(report: &SuiteReport) {
    let r = &report.result;
    let summary = format!(
        "{} run, {} passed, {} failed, {} errors, {} skipped",
        r.tests_run,
        r.successes.len(),
        r.failures.len(),
        r.errors.len(),
        r.skipped.len()
    );
    if report.passed() {
        println!("\n{} {}", "✓ PASSED".green().bold(), summary);
    } else {
        println!("\n{} {}", "✗ FAILED".red().bold(), summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suite(yaml: &str) -> TestSuite {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_suite() {
        let s = suite(
            r#"
name: widgets
prelude: "// {name}"
interpreter:
  failure_exit_code: 2
tests:
  - name: test_inline
    script: "assert(true);"
  - name: test_file
    file: widgets.js
"#,
        );
        assert_eq!(s.tests.len(), 2);
        assert_eq!(s.interpreter.failure_exit_code, Some(2));
        assert_eq!(s.tests[1].file, Some(PathBuf::from("widgets.js")));
    }

    #[test]
    fn test_suite_overrides_config() {
        let s = suite(
            r#"
name: s
epilogue: "done();"
interpreter:
  path: bin/js
  libraries: [lib/unittest.js, /abs/lib.js]
tests: []
"#,
        );
        let config = suite_config(&s, Path::new("/suites"), &Config::default());
        assert_eq!(config.interpreter.path, Some(PathBuf::from("/suites/bin/js")));
        assert_eq!(
            config.interpreter.libraries,
            vec![PathBuf::from("/suites/lib/unittest.js"), PathBuf::from("/abs/lib.js")]
        );
        assert_eq!(config.interpreter.epilogue, "done();");
        assert_eq!(config.interpreter.prelude, Config::default().interpreter.prelude);
    }

    #[test]
    fn test_load_method_requires_exactly_one_body() {
        let both = SuiteTest {
            name: "t".to_string(),
            script: Some("x".to_string()),
            file: Some(PathBuf::from("t.js")),
        };
        assert!(matches!(load_method(&both, Path::new(".")), Err(Error::Config(_))));

        let neither = SuiteTest {
            name: "t".to_string(),
            script: None,
            file: None,
        };
        assert!(matches!(load_method(&neither, Path::new(".")), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_method_from_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.js"), "print('hi');").unwrap();
        let test = SuiteTest {
            name: "t".to_string(),
            script: None,
            file: Some(PathBuf::from("t.js")),
        };
        let method = load_method(&test, dir.path()).unwrap();
        assert_eq!(method.script(), Some("print('hi');"));
    }
}
