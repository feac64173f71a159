//! Drive a page through its rendering protocol
//!
//! A page answers `render` with either finished content, a continuation to
//! await, or another resource to render in its place. `render_page` keeps
//! stepping until content arrives and hands back the output together with
//! the request the page mutated along the way.

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::common::{Error, Result};
use crate::request::FakeRequest;

/// Cap on `Rendering::Delegate` chains, so a cycle fails instead of hanging
pub const MAX_DELEGATION_DEPTH: usize = 64;

/// One step of a page's rendering protocol
pub enum Rendering {
    /// Rendering reached a terminal state
    Complete(String),
    /// Rendering is suspended on nested work
    ///
    /// The continuation is `'static`, so it cannot borrow or mutate the
    /// request. To change headers or the response code after suspending,
    /// resolve to a `Delegate` whose resource does it.
    Pending(BoxFuture<'static, Result<Rendering>>),
    /// Render this resource against the same request instead
    Delegate(Arc<dyn Resource>),
}

impl Rendering {
    /// Wrap an async continuation
    pub fn pending<F>(fut: F) -> Self
    where
        F: std::future::Future<Output = Result<Rendering>> + Send + 'static,
    {
        Rendering::Pending(Box::pin(fut))
    }
}

impl std::fmt::Debug for Rendering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rendering::Complete(s) => f.debug_tuple("Complete").field(s).finish(),
            Rendering::Pending(_) => f.write_str("Pending(..)"),
            Rendering::Delegate(_) => f.write_str("Delegate(..)"),
        }
    }
}

/// Anything that can render itself against a request
pub trait Resource: Send + Sync {
    fn render(&self, request: &mut FakeRequest) -> Rendering;
}

impl<F> Resource for F
where
    F: Fn(&mut FakeRequest) -> Rendering + Send + Sync,
{
    fn render(&self, request: &mut FakeRequest) -> Rendering {
        self(request)
    }
}

/// Final output of a rendered page
#[derive(Debug)]
pub struct RenderedPage {
    /// Body writes followed by the completed content
    pub output: String,
    /// The request after the page finished with it
    pub request: FakeRequest,
}

/// Future returned by `render_page`; resolves exactly once
pub type RenderFuture = BoxFuture<'static, Result<RenderedPage>>;

/// Render `resource`, using a default request when none is supplied
///
/// Runs on the caller's task; no threads or tasks are spawned.
pub fn render_page(resource: Arc<dyn Resource>, request: Option<FakeRequest>) -> RenderFuture {
    let mut request = request.unwrap_or_default();
    Box::pin(async move {
        let mut depth = 0usize;
        let mut step = resource.render(&mut request);

        let content = loop {
            match step {
                Rendering::Complete(content) => break content,
                Rendering::Pending(continuation) => {
                    tracing::trace!("rendering suspended");
                    step = continuation.await.map_err(|e| match e {
                        Error::Render(_) => e,
                        other => Error::Render(other.to_string()),
                    })?;
                }
                Rendering::Delegate(child) => {
                    depth += 1;
                    if depth > MAX_DELEGATION_DEPTH {
                        return Err(Error::Render(format!(
                            "delegation deeper than {} resources",
                            MAX_DELEGATION_DEPTH
                        )));
                    }
                    step = child.render(&mut request);
                }
            }
        };

        let mut output = String::from_utf8_lossy(request.written()).into_owned();
        output.push_str(&content);
        tracing::debug!(bytes = output.len(), code = request.code(), "page rendered");

        Ok(RenderedPage { output, request })
    })
}
