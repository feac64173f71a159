//! Request-relative URLs for page content
//!
//! Pages build links without knowing where they are mounted; the link is
//! resolved against the request being rendered.

use crate::request::FakeRequest;

/// Where a relative URL is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// The site root (`scheme://host/`)
    Root,
    /// The pre-path URL of the current request
    Here,
}

/// A URL expression resolved lazily against a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOverlay {
    anchor: Anchor,
    children: Vec<String>,
}

impl UrlOverlay {
    pub fn root() -> Self {
        Self {
            anchor: Anchor::Root,
            children: Vec::new(),
        }
    }

    pub fn here() -> Self {
        Self {
            anchor: Anchor::Here,
            children: Vec::new(),
        }
    }

    /// Append a path segment
    pub fn child(mut self, segment: impl Into<String>) -> Self {
        self.children.push(segment.into());
        self
    }

    pub fn resolve(&self, request: &FakeRequest) -> String {
        let mut base = match self.anchor {
            Anchor::Root => request.root_url(),
            Anchor::Here => request.pre_path_url(),
        };
        for child in &self.children {
            if !base.ends_with('/') {
                base.push('/');
            }
            base.push_str(child);
        }
        base
    }
}
