//! Configuration file handling

use serde::Deserialize;
use std::path::PathBuf;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// External interpreter settings
    #[serde(default)]
    pub interpreter: InterpreterConfig,

    /// Captured output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// How generated source reaches the interpreter
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SourceDelivery {
    /// Written to a temporary file passed as the last argument
    #[default]
    File,
    /// Piped to the interpreter's standard input
    Stdin,
}

/// Configuration for the external interpreter
#[derive(Debug, Deserialize, Clone)]
pub struct InterpreterConfig {
    /// Explicit path to the interpreter executable (skips PATH search)
    pub path: Option<PathBuf>,

    /// Executable names searched on PATH, in order
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,

    /// Additional arguments passed before the source file
    #[serde(default)]
    pub args: Vec<String>,

    /// Support libraries that must exist for tests to run
    #[serde(default)]
    pub libraries: Vec<PathBuf>,

    /// How the generated source is handed over
    #[serde(default)]
    pub delivery: SourceDelivery,

    /// Suffix for the temporary source file
    #[serde(default = "default_source_suffix")]
    pub source_suffix: String,

    /// Exit status meaning every assertion passed
    #[serde(default)]
    pub pass_exit_code: i32,

    /// Exit status the interpreter environment uses for a failed assertion
    pub failure_exit_code: Option<i32>,

    /// Boilerplate emitted before the test body; `{name}` is the test name
    #[serde(default = "default_prelude")]
    pub prelude: String,

    /// Boilerplate emitted after the test body
    #[serde(default)]
    pub epilogue: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            path: None,
            candidates: default_candidates(),
            args: Vec::new(),
            libraries: Vec::new(),
            delivery: SourceDelivery::default(),
            source_suffix: default_source_suffix(),
            pass_exit_code: 0,
            failure_exit_code: None,
            prelude: default_prelude(),
            epilogue: String::new(),
        }
    }
}

fn default_candidates() -> Vec<String> {
    vec!["smjs".to_string(), "js".to_string()]
}

fn default_source_suffix() -> String {
    ".js".to_string()
}

fn default_prelude() -> String {
    "// test: {name}\n".to_string()
}

/// Captured output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Maximum bytes of captured output attached to a diagnostic
    #[serde(default = "default_max_diagnostic_bytes")]
    pub max_diagnostic_bytes: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_diagnostic_bytes: default_max_diagnostic_bytes(),
        }
    }
}

fn default_max_diagnostic_bytes() -> usize {
    64 * 1024
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    super::Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                })?;
                return Self::from_toml_str(&content);
            }
        }
        Ok(Self::default())
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
