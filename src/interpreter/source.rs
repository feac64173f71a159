//! Source generation strategies

use crate::common::config::InterpreterConfig;
use crate::common::{Error, Result};

use super::TestMethod;

/// Produces the program text the interpreter runs for one test method
pub trait SourceGenerator: Send + Sync {
    fn generate(&self, method: &TestMethod) -> Result<String>;
}

/// Prelude, then the method's script body, then an epilogue
///
/// `{name}` in the prelude or epilogue is replaced by the method name.
#[derive(Debug, Clone, Default)]
pub struct BoilerplateSource {
    prelude: String,
    epilogue: String,
}

impl BoilerplateSource {
    pub fn new(prelude: impl Into<String>, epilogue: impl Into<String>) -> Self {
        Self {
            prelude: prelude.into(),
            epilogue: epilogue.into(),
        }
    }

    pub fn from_config(config: &InterpreterConfig) -> Self {
        Self::new(config.prelude.clone(), config.epilogue.clone())
    }
}

impl SourceGenerator for BoilerplateSource {
    fn generate(&self, method: &TestMethod) -> Result<String> {
        let body = method.script().ok_or_else(|| {
            Error::source_generation(method.name(), "test method has no script body")
        })?;

        let mut source = self.prelude.replace("{name}", method.name());
        if !source.is_empty() && !source.ends_with('\n') {
            source.push('\n');
        }
        source.push_str(body);
        if !self.epilogue.is_empty() {
            if !source.ends_with('\n') {
                source.push('\n');
            }
            source.push_str(&self.epilogue.replace("{name}", method.name()));
        }
        Ok(source)
    }
}

impl<F> SourceGenerator for F
where
    F: Fn(&TestMethod) -> String + Send + Sync,
{
    fn generate(&self, method: &TestMethod) -> Result<String> {
        Ok(self(method))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boilerplate_wraps_body() {
        let generator = BoilerplateSource::new("// {name}", "runTests('{name}');");
        let method = TestMethod::new("test_add", "assert(1 + 1 == 2);");
        assert_eq!(
            generator.generate(&method).unwrap(),
            "// test_add\nassert(1 + 1 == 2);\nrunTests('test_add');"
        );
    }

    #[test]
    fn test_empty_boilerplate_is_just_body() {
        let generator = BoilerplateSource::default();
        let method = TestMethod::new("t", "print(1);");
        assert_eq!(generator.generate(&method).unwrap(), "print(1);");
    }

    #[test]
    fn test_missing_body_fails() {
        let generator = BoilerplateSource::default();
        let err = generator.generate(&TestMethod::named("t")).unwrap_err();
        assert!(matches!(err, Error::SourceGeneration { .. }));
    }

    #[test]
    fn test_closure_generator() {
        let generator = |_: &TestMethod| "throw new TypeError();".to_string();
        let method = TestMethod::new("t", "ignored");
        assert_eq!(generator.generate(&method).unwrap(), "throw new TypeError();");
    }
}
