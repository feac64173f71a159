//! Interpreter lookup strategies

use std::path::PathBuf;

use crate::common::config::InterpreterConfig;
use crate::common::{Error, Result};

/// Finds the interpreter executable
///
/// Failing to find one is not an error in the code under test, so
/// implementations report it as `Error::NotSupported` (or an error for
/// which `is_not_supported` holds).
pub trait InterpreterLocator: Send + Sync {
    fn locate(&self) -> Result<PathBuf>;
}

/// Searches PATH for the first matching executable name
#[derive(Debug, Clone)]
pub struct PathLocator {
    candidates: Vec<String>,
}

impl PathLocator {
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
        }
    }
}

impl InterpreterLocator for PathLocator {
    fn locate(&self) -> Result<PathBuf> {
        for name in &self.candidates {
            if let Ok(path) = which::which(name) {
                tracing::debug!(candidate = %name, path = %path.display(), "interpreter found");
                return Ok(path);
            }
        }
        Err(Error::interpreter_not_found("interpreter", &self.candidates))
    }
}

/// Always returns one path, provided it exists
#[derive(Debug, Clone)]
pub struct FixedLocator {
    path: PathBuf,
}

impl FixedLocator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InterpreterLocator for FixedLocator {
    fn locate(&self) -> Result<PathBuf> {
        if self.path.exists() {
            Ok(self.path.clone())
        } else {
            Err(Error::NotSupported(format!(
                "interpreter {} does not exist",
                self.path.display()
            )))
        }
    }
}

impl<F> InterpreterLocator for F
where
    F: Fn() -> Result<PathBuf> + Send + Sync,
{
    fn locate(&self) -> Result<PathBuf> {
        self()
    }
}

/// Locator described by the configuration: an explicit path wins over PATH search
pub fn from_config(config: &InterpreterConfig) -> Box<dyn InterpreterLocator> {
    match &config.path {
        Some(path) => Box::new(FixedLocator::new(path.clone())),
        None => Box::new(PathLocator::new(config.candidates.clone())),
    }
}
