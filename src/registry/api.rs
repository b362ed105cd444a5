//! The API object applications build routes through.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::MethodRouter;
use axum::Router;

use crate::config::ApiConfig;
use crate::docs::{self, SpecDocument};
use crate::http::response::{json_response, to_pretty_json};
use crate::http::wrapper::{method_not_allowed, not_found};
use crate::registry::live::LiveRoutes;
use crate::registry::registrar::Registrar;
use crate::routes::{merge, Method, RouteError, RouteTree};

/// Owns the route tree, the registration table and the published router.
///
/// Mutating methods take `&mut self`: whoever owns the `Api` is the single
/// writer. Traffic is served through [`LiveRoutes`], which only ever sees
/// fully registered tables.
pub struct Api {
    config: ApiConfig,
    resources: RouteTree,
    registrar: Registrar,
    live: LiveRoutes,
}

impl Api {
    /// An API with default settings named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_config(&ApiConfig {
            name: name.into(),
            ..ApiConfig::default()
        })
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        let mut registrar = Registrar::new();
        if config.docs_enabled {
            registrar.reserve("/", Method::Get);
            registrar.reserve(docs::SPEC_URL, Method::Get);
        }
        let resources = RouteTree::new();
        let router = build_router(config, &registrar, &resources).unwrap_or_default();

        Self {
            config: config.clone(),
            resources,
            registrar,
            live: LiveRoutes::new(router),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The current route tree.
    pub fn resources(&self) -> &RouteTree {
        &self.resources
    }

    pub fn registrar(&self) -> &Registrar {
        &self.registrar
    }

    /// Deep-merge `tree` into the current routes and re-apply the result.
    ///
    /// Leaves in `tree` replace existing ones at the same (path, method).
    /// On error nothing changes.
    pub fn set_resources(&mut self, tree: RouteTree) -> Result<(), RouteError> {
        let merged = merge(&self.resources, &tree);
        let mut registrar = self.registrar.clone();
        let changed = registrar.apply(&merged)?;
        self.commit(merged, registrar, changed)
    }

    /// Replace top-level keys with those of `tree` and register strictly:
    /// a different handler for an already bound (path, method) is a
    /// conflict. On error nothing changes.
    pub fn update(&mut self, tree: RouteTree) -> Result<(), RouteError> {
        let mut resources = self.resources.clone();
        resources.update(tree);
        let mut registrar = self.registrar.clone();
        let changed = registrar.register(&resources)?;
        self.commit(resources, registrar, changed)
    }

    fn commit(&mut self, resources: RouteTree, registrar: Registrar, changed: usize) -> Result<(), RouteError> {
        let router = build_router(&self.config, &registrar, &resources)?;
        self.resources = resources;
        self.registrar = registrar;
        self.live.publish(router);
        tracing::info!(
            routes = self.registrar.len(),
            changed = changed,
            "Routes published"
        );
        Ok(())
    }

    /// Swagger document for the current routes.
    pub fn describe(&self) -> SpecDocument {
        docs::describe(&self.resources, &self.config.name)
    }

    /// Handle to the router serving traffic.
    pub fn routes(&self) -> LiveRoutes {
        self.live.clone()
    }

    /// The currently published router.
    pub fn router(&self) -> Router {
        self.live.router()
    }
}

fn build_router(config: &ApiConfig, registrar: &Registrar, resources: &RouteTree) -> Result<Router, RouteError> {
    let mut routes = registrar.method_routers(config.max_body_bytes);

    if config.docs_enabled {
        let page: Arc<str> = Arc::from(docs::index_html(&config.name));
        let index = routes
            .remove("/")
            .unwrap_or_else(MethodRouter::new)
            .get(move || {
                let page = page.clone();
                async move { Html(page.to_string()) }
            });
        routes.insert("/".to_string(), index);

        let tree = Arc::new(resources.clone());
        let name: Arc<str> = Arc::from(config.name.as_str());
        let endpoints = routes
            .remove(docs::SPEC_URL)
            .unwrap_or_else(MethodRouter::new)
            .get(move || {
                let tree = tree.clone();
                let name = name.clone();
                async move { json_response(StatusCode::OK, to_pretty_json(&docs::describe(&tree, &name))) }
            });
        routes.insert(docs::SPEC_URL.to_string(), endpoints);
    }

    // axum rejects some overlapping patterns by panicking; surface those as
    // registration errors instead of taking the process down.
    panic::catch_unwind(AssertUnwindSafe(move || {
        routes
            .into_iter()
            .fold(Router::new(), |router, (path, method_router)| {
                router.route(&path, method_router.fallback(method_not_allowed))
            })
            .fallback(not_found)
    }))
    .map_err(|payload| RouteError::Rejected {
        reason: payload
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
            .unwrap_or_else(|| "overlapping routes".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fault::Fault;
    use crate::http::request::RequestContext;
    use crate::routes::Handler;
    use axum::body::Body;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn constant(name: &str, value: Value) -> Handler {
        Handler::new(name, move |_ctx: RequestContext| {
            let value = value.clone();
            async move { Ok::<_, Fault>(value) }
        })
    }

    async fn send(api: &Api, method: &str, uri: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = api.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_set_resources_merges_and_serves() {
        let mut api = Api::new("notes_server");
        api.set_resources(
            RouteTree::new()
                .route("/v1", RouteTree::new().route("/a", RouteTree::new().get(constant("a", json!("a")))).unwrap())
                .unwrap(),
        )
        .unwrap();
        api.set_resources(
            RouteTree::new()
                .route("/v1", RouteTree::new().route("/b", RouteTree::new().get(constant("b", json!("b")))).unwrap())
                .unwrap(),
        )
        .unwrap();

        assert_eq!(api.resources().leaf_count(), 2);
        assert_eq!(send(&api, "GET", "/v1/a").await, (StatusCode::OK, "\"a\"\n".to_string()));
        assert_eq!(send(&api, "GET", "/v1/b").await, (StatusCode::OK, "\"b\"\n".to_string()));
    }

    #[tokio::test]
    async fn test_merge_replaces_leaf() {
        let mut api = Api::new("app");
        let tree = |h| RouteTree::new().route("/x", RouteTree::new().get(h)).unwrap();
        api.set_resources(tree(constant("old", json!(1)))).unwrap();
        api.set_resources(tree(constant("new", json!(2)))).unwrap();

        assert_eq!(api.registrar().get("/x", Method::Get).unwrap().name(), "new");
        assert_eq!(send(&api, "GET", "/x").await.1, "2\n");
    }

    #[tokio::test]
    async fn test_update_conflicts_and_keeps_state() {
        let mut api = Api::new("app");
        let tree = |h| RouteTree::new().route("/x", RouteTree::new().get(h)).unwrap();
        let first = constant("first", json!(1));
        api.update(tree(first.clone())).unwrap();
        api.update(tree(first)).unwrap();

        let err = api.update(tree(constant("second", json!(2)))).unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));
        assert_eq!(api.resources().child("/x").unwrap().handler(Method::Get).unwrap().name(), "first");
        assert_eq!(send(&api, "GET", "/x").await.1, "1\n");
    }

    #[tokio::test]
    async fn test_set_resources_rejects_two_spellings_of_one_route() {
        let mut api = Api::new("app");
        let current = constant("current", json!(0));
        api.set_resources(RouteTree::new().route("/v1/note", RouteTree::new().get(current)).unwrap())
            .unwrap();

        let tree = RouteTree::new()
            .route(
                "/v1",
                RouteTree::new()
                    .route("/note", RouteTree::new().get(constant("A", json!(1)).summary("A")))
                    .unwrap(),
            )
            .unwrap()
            .route("/v1/note", RouteTree::new().get(constant("B", json!(2)).summary("B")))
            .unwrap();

        let err = api.set_resources(tree.clone()).unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));
        assert_eq!(api.resources().leaf_count(), 1);
        assert_eq!(api.registrar().get("/v1/note", Method::Get).unwrap().name(), "current");
        assert_eq!(send(&api, "GET", "/v1/note").await.1, "0\n");
        assert_eq!(api.describe().paths["/v1/note"]["get"].summary, "Route for /v1/note");

        // Re-applying the same tree fails the same way.
        assert!(api.set_resources(tree).is_err());
        assert_eq!(send(&api, "GET", "/v1/note").await.1, "0\n");
    }

    #[tokio::test]
    async fn test_docs_endpoints() {
        let mut api = Api::new("notes_server");
        api.set_resources(
            RouteTree::new()
                .route("/note/<uuid:id>", RouteTree::new().get(constant("get", Value::Null)))
                .unwrap(),
        )
        .unwrap();

        let (status, page) = send(&api, "GET", "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(page.contains("swagger-ui"));

        let (status, body) = send(&api, "GET", "/endpoints").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body.ends_with('\n'));
        let doc: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(doc["info"]["title"], "Notes Server API");
        assert_eq!(doc["paths"]["/note/{id}"]["get"]["parameters"][0]["name"], "id");

        let err = api
            .set_resources(RouteTree::new().get(constant("root", Value::Null)))
            .unwrap_err();
        assert!(matches!(err, RouteError::Reserved { .. }));
    }

    #[tokio::test]
    async fn test_unmatched_requests_use_envelope() {
        let mut api = Api::new("app");
        api.set_resources(RouteTree::new().route("/x", RouteTree::new().get(constant("x", json!(1)))).unwrap())
            .unwrap();

        let (status, body) = send(&api, "GET", "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["error"], "Not Found");

        let (status, body) = send(&api, "DELETE", "/x").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap()["error"], "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_docs_disabled() {
        let mut api = Api::from_config(&ApiConfig {
            name: "app".into(),
            docs_enabled: false,
            ..ApiConfig::default()
        });
        api.set_resources(RouteTree::new().get(constant("root", json!("home")))).unwrap();
        assert_eq!(send(&api, "GET", "/").await.1, "\"home\"\n");
        assert_eq!(send(&api, "GET", "/endpoints").await.0, StatusCode::NOT_FOUND);
    }
}
