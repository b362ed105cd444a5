//! Per-request context handed to handlers.
//!
//! # Responsibilities
//! - Carry the matched route, path parameters, query string, headers and body
//! - Expose the accessors (`params`, `json`, `auth`) that turn missing input
//!   into 400/401 faults
//!
//! # Design Decisions
//! - Built once by the wrapper, owned by the handler, dropped with the request
//! - The body is buffered up front; `json()` parses it on each call

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::HeaderMap;

use crate::http::auth::Authorization;
use crate::http::fault::Fault;
use crate::http::json::Json;
use crate::http::params::Params;
use crate::routes::Method;

/// Header carrying the request identifier.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Everything a handler can see about the current request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    route: Arc<str>,
    path_params: BTreeMap<String, String>,
    query: Params,
    headers: HeaderMap,
    body: Bytes,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            method: Method::Get,
            route: Arc::from("/"),
            path_params: BTreeMap::new(),
            query: Params::default(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

impl RequestContext {
    pub fn new(
        method: Method,
        route: Arc<str>,
        path_params: BTreeMap<String, String>,
        query: Params,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            route,
            path_params,
            query,
            headers,
            body,
        }
    }

    /// Builder-style setters, mostly for tests and direct handler calls.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path_params.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Params::parse(query);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The matched route as spelled in the tree, e.g. `/v1/note/<uuid>`.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// A path parameter as captured from the URL.
    pub fn param(&self, name: &str) -> Result<&str, Fault> {
        self.path_params
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Fault::bad_request(format!("Path parameter '{}' is required.", name)))
    }

    /// A path parameter parsed into `T`.
    pub fn param_as<T: FromStr>(&self, name: &str) -> Result<T, Fault> {
        self.param(name)?
            .parse()
            .map_err(|_| Fault::bad_request(format!("Path parameter '{}' is invalid.", name)))
    }

    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    /// Query parameters.
    pub fn params(&self) -> &Params {
        &self.query
    }

    /// The body as a JSON object.
    pub fn json(&self) -> Result<Json, Fault> {
        Json::parse(&self.body)
    }

    /// Credentials from the `Authorization` header.
    pub fn auth(&self) -> Authorization {
        Authorization::from_headers(&self.headers)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn request_id(&self) -> Option<&str> {
        self.headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}
