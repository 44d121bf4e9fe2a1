//! Upstream call descriptors and credentials.
//!
//! A descriptor is the in-memory description of exactly one HTTP call to the
//! CRM API. It is built fresh for every invocation and handed to the executor,
//! which owns it for the duration of the retry sequence.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

/// HTTP methods used against the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    /// Whether arguments for this method travel in the request body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// An opaque API token passed through to the upstream.
///
/// The token is never logged: `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token. Returns `None` for blank tokens.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token, for placing on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Resolve the credential for one request.
///
/// Precedence: explicit per-call argument, then request header, then request
/// query parameter, then the process-wide default. Blank values are skipped.
pub fn resolve_credential(
    explicit: Option<&str>,
    header: Option<&str>,
    query: Option<&str>,
    default: Option<&Credential>,
) -> Option<Credential> {
    [explicit, header, query]
        .into_iter()
        .flatten()
        .find_map(Credential::new)
        .or_else(|| default.cloned())
}

/// Description of one HTTP call to the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamCallDescriptor {
    pub method: HttpMethod,
    /// Path relative to the configured base URL, already rendered.
    pub path: String,
    pub query: BTreeMap<String, String>,
    pub body: Option<Map<String, Value>>,
    pub credential: Credential,
}

impl UpstreamCallDescriptor {
    /// Create a descriptor with no query parameters and no body.
    pub fn new(method: HttpMethod, path: impl Into<String>, credential: Credential) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            body: None,
            credential,
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Attach a JSON body.
    pub fn with_body(mut self, body: Map<String, Value>) -> Self {
        self.body = Some(body);
        self
    }
}

/// Render a scalar JSON value as a query parameter string.
///
/// Arrays, objects and `null` have no query representation.
pub fn query_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
