//! Per-handler request adapter.
//!
//! # Responsibilities
//! - Collect path parameters, query string, headers and body into a
//!   [`RequestContext`]
//! - Enforce typed placeholders (`int`, `float`, `uuid`); a mismatch is an
//!   unmatched URL
//! - Invoke the handler and convert every outcome into a response
//!
//! # Design Decisions
//! - This is the single catch boundary: handler results, faults and panics
//!   all end up as a [`ResponseEnvelope`], nothing escapes to axum
//! - Internal faults are logged with full detail and answered generically

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{FromRequestParts, Path, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{on, MethodRouter};
use futures_util::FutureExt;

use crate::http::fault::Fault;
use crate::http::params::Params;
use crate::http::request::RequestContext;
use crate::http::response::ResponseEnvelope;
use crate::observability::metrics;
use crate::routes::{Handler, Method, PathParam, RoutePath};

/// A handler bound to one (path, method), ready to serve requests.
#[derive(Clone)]
pub struct Adapter {
    handler: Handler,
    method: Method,
    route: Arc<str>,
    params: Arc<[PathParam]>,
    max_body_bytes: usize,
}

impl Adapter {
    pub fn new(handler: Handler, method: Method, path: &RoutePath, max_body_bytes: usize) -> Self {
        Self {
            handler,
            method,
            route: Arc::from(path.raw()),
            params: path.params().cloned().collect(),
            max_body_bytes,
        }
    }

    /// An axum method router that dispatches to this adapter.
    pub fn into_method_router(self) -> MethodRouter {
        let filter = self.method.filter();
        on(filter, move |request: Request| {
            let adapter = self.clone();
            async move { adapter.respond(request).await }
        })
    }

    /// Serve one request.
    pub async fn respond(&self, request: Request) -> Response {
        let start = Instant::now();
        let envelope = match self.context(request).await {
            Ok(ctx) => self.invoke(ctx).await,
            Err(fault) => ResponseEnvelope::from_fault(&fault),
        };
        metrics::record_request(self.method.as_str(), &self.route, envelope.status.as_u16(), start);
        envelope.into_response()
    }

    async fn context(&self, request: Request) -> Result<RequestContext, Fault> {
        let (mut parts, body) = request.into_parts();

        let path_params = if self.params.is_empty() {
            BTreeMap::new()
        } else {
            let Path(captured) = Path::<BTreeMap<String, String>>::from_request_parts(&mut parts, &())
                .await
                .map_err(|_| Fault::status(StatusCode::NOT_FOUND))?;
            captured
        };
        for param in self.params.iter() {
            let accepted = path_params
                .get(&param.name)
                .is_some_and(|value| param.kind.accepts(value));
            if !accepted {
                return Err(Fault::status(StatusCode::NOT_FOUND));
            }
        }

        let query = Params::parse(parts.uri.query().unwrap_or_default());
        let body = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|_| Fault::status(StatusCode::PAYLOAD_TOO_LARGE))?;

        Ok(RequestContext::new(
            self.method,
            self.route.clone(),
            path_params,
            query,
            parts.headers,
            body,
        ))
    }

    async fn invoke(&self, ctx: RequestContext) -> ResponseEnvelope {
        let request_id = ctx.request_id().unwrap_or("unknown").to_string();
        tracing::debug!(
            request_id = %request_id,
            handler = %self.handler.name(),
            method = %self.method,
            route = %self.route,
            "Dispatching request"
        );

        let handler = self.handler.clone();
        let outcome = AssertUnwindSafe(async move { handler.call(ctx).await })
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(value)) => ResponseEnvelope::ok(value),
            Ok(Err(fault)) => {
                if let Fault::Internal(err) = &fault {
                    tracing::error!(
                        request_id = %request_id,
                        handler = %self.handler.name(),
                        route = %self.route,
                        error = ?err,
                        "Handler failed"
                    );
                }
                ResponseEnvelope::from_fault(&fault)
            }
            Err(panic) => {
                tracing::error!(
                    request_id = %request_id,
                    handler = %self.handler.name(),
                    route = %self.route,
                    panic = %panic_message(panic.as_ref()),
                    "Handler panicked"
                );
                ResponseEnvelope::from_fault(&Fault::internal(anyhow::anyhow!("handler panicked")))
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Fallback for URLs no route matches.
pub async fn not_found() -> ResponseEnvelope {
    ResponseEnvelope::from_fault(&Fault::status(StatusCode::NOT_FOUND))
}

/// Fallback for a known route asked with an undeclared method.
pub async fn method_not_allowed() -> ResponseEnvelope {
    ResponseEnvelope::from_fault(&Fault::status(StatusCode::METHOD_NOT_ALLOWED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::routes::Segment;

    fn route(raw: &str) -> RoutePath {
        RoutePath::root().join(&Segment::parse(raw).unwrap())
    }

    async fn call(handler: Handler, raw: &str, method: Method, uri: &str, body: &str) -> (StatusCode, String) {
        let path = route(raw);
        let adapter = Adapter::new(handler, method, &path, 1024);
        let app = Router::new().route(&path.router_path(), adapter.into_method_router());
        let request = axum::http::Request::builder()
            .method(method.as_str())
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_plain_value() {
        let h = Handler::new("a", |_ctx| async { Ok::<_, Fault>(json!({"a": 1})) });
        let (status, body) = call(h, "/a", Method::Get, "/a", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\n    \"a\": 1\n}\n");
    }

    #[tokio::test]
    async fn test_http_fault() {
        let h = Handler::new("nf", |_ctx| async { Err::<Value, _>(Fault::not_found("abc123")) });
        let (status, body) = call(h, "/nf", Method::Get, "/nf", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"error": "Not Found", "message": "abc123"}));
    }

    #[tokio::test]
    async fn test_internal_fault_and_panic() {
        let failing = Handler::new("boom", |_ctx| async {
            Err::<Value, _>(Fault::internal(anyhow::anyhow!("disk on fire")))
        });
        let (status, body) = call(failing, "/boom", Method::Post, "/boom", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("disk on fire"));
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"error": "Internal error", "message": "Server encountered an error"}));

        let panicking = Handler::new("panic", |_ctx| async {
            let missing: Option<Value> = None;
            Ok::<Value, Fault>(missing.expect("unreachable state"))
        });
        let (status, body) = call(panicking, "/panic", Method::Get, "/panic", "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("unreachable state"));
    }

    #[tokio::test]
    async fn test_params_reach_handler() {
        let h = Handler::new("echo", |ctx: RequestContext| async move {
            let id: u64 = ctx.param_as("id")?;
            let key = ctx.params().get("key1")?.to_string();
            let title = ctx.json()?.str("title")?.to_string();
            Ok::<_, Fault>(json!({"id": id, "key": key, "title": title}))
        });
        let (status, body) = call(h.clone(), "/n/<int:id>", Method::Put, "/n/7?key1=v", r#"{"title": "t"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"id": 7, "key": "v", "title": "t"}));

        let (status, body) = call(h.clone(), "/n/<int:id>", Method::Put, "/n/7", r#"{"title": "t"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("key1"));

        let (status, body) = call(h, "/n/<int:id>", Method::Put, "/n/7?key1=v", r#"{}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("title"));
    }

    #[tokio::test]
    async fn test_typed_placeholder_mismatch_is_not_found() {
        let h = Handler::new("get", |_ctx| async { Ok::<_, Fault>(()) });
        let (status, _) = call(h.clone(), "/n/<int:id>", Method::Get, "/n/abc", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(h.clone(), "/n/<uuid:id>", Method::Get, "/n/123", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) = call(h, "/n/<float:x>", Method::Get, "/n/1.5", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "null\n");
    }

    #[tokio::test]
    async fn test_body_limit() {
        let h = Handler::new("big", |_ctx| async { Ok::<_, Fault>(()) });
        let (status, _) = call(h, "/big", Method::Post, "/big", &"x".repeat(4096)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }
}
