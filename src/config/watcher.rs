//! Route file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::routes::{load_routes, HandlerRegistry, RouteTree};

/// A watcher that reloads the route file whenever it changes.
pub struct RoutesWatcher {
    path: PathBuf,
    registry: HandlerRegistry,
    update_tx: mpsc::UnboundedSender<RouteTree>,
}

impl RoutesWatcher {
    /// Create a new RoutesWatcher.
    ///
    /// Returns the watcher and a receiver for reloaded trees.
    pub fn new(path: &Path, registry: HandlerRegistry) -> (Self, mpsc::UnboundedReceiver<RouteTree>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                registry,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching the file in a background thread.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx.clone();
        let path = self.path.clone();
        let registry = self.registry;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        tracing::info!("Route file change detected, reloading...");
                        match load_routes(&path, &registry) {
                            Ok(tree) => {
                                let _ = tx.send(tree);
                            }
                            Err(e) => {
                                tracing::error!("Failed to reload routes: {}. Keeping current routes.", e);
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Route watcher started");
        Ok(watcher)
    }
}
