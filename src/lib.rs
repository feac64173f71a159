//! pagetest - a test harness for asynchronous page rendering
//!
//! Three pieces, usable independently:
//! - [`request::FakeRequest`]: an in-memory request/response for renderers
//! - [`render::render_page`]: drives a page to its final output
//! - [`interpreter::InterpreterTestCase`]: runs a test method in an external
//!   interpreter and reports pass, failure, error or skip

pub mod cli;
pub mod commands;
pub mod common;
pub mod interpreter;
pub mod render;
pub mod request;
pub mod suite;
pub mod url;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use interpreter::{InterpreterTestCase, Outcome, TestMethod};
pub use render::{render_page, Rendering, Resource};
pub use request::FakeRequest;
