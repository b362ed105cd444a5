//! Notes server.
//!
//! A small CRUD API over in-memory notes, served by `resto`:
//!
//! ```text
//! POST   /v1/note          create from {"title", "description"}
//! GET    /v1/note          all notes, keyed by uuid
//! GET    /v1/note/<uuid>   one note
//! PATCH  /v1/note/<uuid>   merge the JSON body into the note
//! DELETE /v1/note/<uuid>   remove the note
//! GET    /                 API viewer
//! GET    /endpoints        Swagger document
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use clap::Parser;
use serde_json::{Map, Value};
use tokio::net::TcpListener;
use uuid::Uuid;

use resto::config::{load_config, RoutesWatcher, ServerConfig};
use resto::lifecycle::{wait_for_signal, Shutdown};
use resto::observability::{init_logging, metrics};
use resto::routes::{load_routes, parse_routes, HandlerRegistry, LoadError};
use resto::{handler, Api, Fault, HttpServer, RequestContext, RouteTree};

#[derive(Parser)]
#[command(name = "resto")]
#[command(about = "Notes server built on resto", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

const NOTE_ROUTES: &str = r#"
["/v1"."/note"]
POST = "Note::create"
GET = "Note::get_all"

["/v1"."/note"."/<uuid>"]
GET = "Note::get"
PATCH = "Note::update"
DELETE = "Note::delete"
"#;

type NoteBody = Map<String, Value>;

/// In-memory note storage shared by every note handler.
#[derive(Clone, Default)]
struct NoteStore {
    notes: Arc<Mutex<BTreeMap<String, NoteBody>>>,
}

impl NoteStore {
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, NoteBody>>, Fault> {
        self.notes
            .lock()
            .map_err(|_| Fault::internal(anyhow::anyhow!("note store lock poisoned")))
    }
}

struct Note;

impl Note {
    async fn create(store: NoteStore, ctx: RequestContext) -> Result<NoteBody, Fault> {
        let json = ctx.json()?;
        let mut note = NoteBody::new();
        note.insert("title".into(), json.get("title")?.clone());
        note.insert("description".into(), json.get("description")?.clone());
        let uuid = Uuid::new_v4().to_string();
        note.insert("uuid".into(), Value::String(uuid.clone()));

        store.lock()?.insert(uuid, note.clone());
        Ok(note)
    }

    async fn get_all(store: NoteStore, _ctx: RequestContext) -> Result<BTreeMap<String, NoteBody>, Fault> {
        let notes = store.lock()?.clone();
        Ok(notes)
    }

    async fn get(store: NoteStore, ctx: RequestContext) -> Result<NoteBody, Fault> {
        let uuid = ctx.param("uuid")?;
        let note = store.lock()?.get(uuid).cloned();
        note.ok_or_else(|| Fault::not_found(uuid))
    }

    async fn update(store: NoteStore, ctx: RequestContext) -> Result<NoteBody, Fault> {
        let uuid = ctx.param("uuid")?;
        let json = ctx.json()?;
        let mut notes = store.lock()?;
        let note = notes.get_mut(uuid).ok_or_else(|| Fault::not_found(uuid))?;
        note.extend(json.into_map());
        Ok(note.clone())
    }

    async fn delete(store: NoteStore, ctx: RequestContext) -> Result<(), Fault> {
        let uuid = ctx.param("uuid")?;
        let removed = store.lock()?.remove(uuid);
        removed.map(|_| ()).ok_or_else(|| Fault::not_found(uuid))
    }

    fn registry(store: &NoteStore) -> HandlerRegistry {
        HandlerRegistry::new()
            .with(handler!(Note::create, store.clone()).summary("Create a note"))
            .with(handler!(Note::get_all, store.clone()).summary("List all notes"))
            .with(handler!(Note::get, store.clone()).summary("Fetch one note"))
            .with(handler!(Note::update, store.clone()).summary("Update fields of a note"))
            .with(handler!(Note::delete, store.clone()).summary("Delete a note"))
    }

    fn routes(registry: &HandlerRegistry) -> Result<RouteTree, LoadError> {
        parse_routes(NOTE_ROUTES, registry)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    init_logging(&config.observability)?;
    tracing::info!("resto v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = NoteStore::default();
    let registry = Note::registry(&store);

    let mut api = Api::from_config(&config.api);
    api.set_resources(Note::routes(&registry)?)?;
    if let Some(file) = &config.routes.file {
        api.set_resources(load_routes(file, &registry)?)?;
        tracing::info!(path = ?file, "Route file merged");
    }
    let routes = api.routes();

    let shutdown = Shutdown::new();

    // The watcher must stay alive for as long as reloads are wanted.
    let _watcher = match (&config.routes.file, config.routes.watch) {
        (Some(file), true) => {
            let (watcher, mut updates) = RoutesWatcher::new(file, registry.clone());
            let guard = watcher.run()?;
            let mut stop = shutdown.subscribe();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        Some(tree) = updates.recv() => {
                            if let Err(e) = api.set_resources(tree) {
                                tracing::error!(error = %e, "Reloaded routes rejected, keeping current routes");
                            }
                        }
                        _ = stop.recv() => break,
                        else => break,
                    }
                }
            });
            Some(guard)
        }
        _ => None,
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(&config, routes);
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn notes_api() -> Api {
        let store = NoteStore::default();
        let mut api = Api::new("notes_server");
        api.set_resources(Note::routes(&Note::registry(&store)).unwrap()).unwrap();
        api
    }

    async fn send(api: &Api, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = api.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_note_lifecycle() {
        let api = notes_api();

        let (status, created) = send(&api, "POST", "/v1/note", r#"{"title": "t", "description": "d"}"#).await;
        assert_eq!(status, StatusCode::OK);
        let uuid = created["uuid"].as_str().unwrap().to_string();
        let path = format!("/v1/note/{}", uuid);

        let (_, all) = send(&api, "GET", "/v1/note", "").await;
        assert_eq!(all[&uuid]["title"], "t");

        let (status, updated) = send(&api, "PATCH", &path, r#"{"title": "new"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "new");
        assert_eq!(updated["description"], "d");

        let (status, deleted) = send(&api, "DELETE", &path, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted, Value::Null);

        let (status, missing) = send(&api, "GET", &path, "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(missing["error"], "Not Found");
        assert_eq!(missing["message"], uuid.as_str());
    }

    #[tokio::test]
    async fn test_create_requires_title() {
        let api = notes_api();
        let (status, body) = send(&api, "POST", "/v1/note", r#"{"description": "d"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("title"));
    }

    #[test]
    fn test_documented_routes() {
        let doc = notes_api().describe();
        assert_eq!(doc.info.title, "Notes Server API");
        assert_eq!(doc.paths["/v1/note"]["post"].summary, "Create a note");
        assert_eq!(doc.paths["/v1/note/{uuid}"].len(), 3);
    }
}
