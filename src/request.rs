//! Synthetic request/response for page-rendering tests
//!
//! `FakeRequest` stands in for a real network request. A renderer may read
//! and mutate it exactly as it would a live one (headers, response code,
//! body writes, redirects, cookies) and tests assert on the result
//! afterwards. Nothing here touches process-wide state.

use std::collections::HashMap;

/// Host used when no `Host` header is present
pub const DEFAULT_HOST: &str = "localhost";

/// Scheme for plain requests
pub const DEFAULT_SCHEME: &str = "http";

/// Scheme for requests marked secure
pub const SECURE_SCHEME: &str = "https";

/// Generic success status
pub const OK: u16 = 200;

/// Status set by `redirect`
pub const FOUND: u16 = 302;

/// In-memory request/response used in place of a real transport
#[derive(Debug, Clone)]
pub struct FakeRequest {
    uri: String,
    current_segments: Vec<String>,
    received_headers: HashMap<String, String>,
    headers: HashMap<String, String>,
    args: HashMap<String, Vec<String>>,
    cookies: HashMap<String, String>,
    code: u16,
    secure: bool,
    redirected_to: Option<String>,
    written: Vec<u8>,
    finished: bool,
}

impl Default for FakeRequest {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl FakeRequest {
    /// Request for `/` with nothing routed yet
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> FakeRequestBuilder {
        FakeRequestBuilder::default()
    }

    /// Parsed form fields. Always `None`: a fake request never parses a body.
    pub fn fields(&self) -> Option<&HashMap<String, Vec<String>>> {
        None
    }

    /// Set a response header, replacing any earlier value for the same name
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Look up a header by case-insensitive name
    ///
    /// Headers set on the response win over headers the request was
    /// constructed with.
    pub fn header(&self, name: &str) -> Option<&str> {
        let key = name.to_ascii_lowercase();
        self.headers
            .get(&key)
            .or_else(|| self.received_headers.get(&key))
            .map(String::as_str)
    }

    /// All response headers, keyed by lower-cased name
    pub fn response_headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Record the response status. Any value is accepted.
    pub fn set_response_code(&mut self, code: u16) {
        self.code = code;
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The uri without its query string
    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(self.uri.as_str(), |(p, _)| p)
    }

    pub fn current_segments(&self) -> &[String] {
        &self.current_segments
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn scheme(&self) -> &'static str {
        if self.secure {
            SECURE_SCHEME
        } else {
            DEFAULT_SCHEME
        }
    }

    /// The `Host` header, or `DEFAULT_HOST`
    pub fn host(&self) -> &str {
        self.header("host").unwrap_or(DEFAULT_HOST)
    }

    /// Scheme, host and trailing slash
    pub fn root_url(&self) -> String {
        format!("{}://{}/", self.scheme(), self.host())
    }

    /// URL up to and including the last segment consumed by routing
    ///
    /// Depends only on the host, the scheme and `current_segments`; the
    /// rest of the uri and the query string never appear.
    pub fn pre_path_url(&self) -> String {
        format!("{}{}", self.root_url(), self.current_segments.join("/"))
    }

    /// All values of a query argument
    pub fn args(&self, name: &str) -> Option<&[String]> {
        self.args.get(name).map(Vec::as_slice)
    }

    /// First value of a query argument
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn add_cookie(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Redirect the response to `url`
    pub fn redirect(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.set_header("location", url.clone());
        self.redirected_to = Some(url);
        self.code = FOUND;
    }

    pub fn redirected_to(&self) -> Option<&str> {
        self.redirected_to.as_deref()
    }

    /// Append to the response body
    pub fn write(&mut self, data: impl AsRef<[u8]>) {
        self.written.extend_from_slice(data.as_ref());
    }

    /// Everything written to the body so far
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn finished(&self) -> bool {
        self.finished
    }
}

/// Builder for `FakeRequest`
#[derive(Debug, Default)]
pub struct FakeRequestBuilder {
    uri: Option<String>,
    current_segments: Vec<String>,
    received_headers: HashMap<String, String>,
    secure: bool,
}

impl FakeRequestBuilder {
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Segments already consumed by routing
    pub fn current_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current_segments = segments.into_iter().map(Into::into).collect();
        self
    }

    /// A header the client sent with the request
    pub fn received_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.received_headers
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn build(self) -> FakeRequest {
        let uri = self.uri.unwrap_or_else(|| "/".to_string());
        let args = uri
            .split_once('?')
            .map(|(_, query)| parse_query(query))
            .unwrap_or_default();

        FakeRequest {
            uri,
            current_segments: self.current_segments,
            received_headers: self.received_headers,
            headers: HashMap::new(),
            args,
            cookies: HashMap::new(),
            code: OK,
            secure: self.secure,
            redirected_to: None,
            written: Vec::new(),
            finished: false,
        }
    }
}

/// Split `a=1&b=2&a=3` into multi-valued arguments. No percent-decoding.
fn parse_query(query: &str) -> HashMap<String, Vec<String>> {
    let mut args: HashMap<String, Vec<String>> = HashMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        args.entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }
    args
}
