//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! Route file (routes.file):
//!     routes::load_routes at startup
//!     watcher.rs detects change
//!     → reloaded RouteTree sent to the API owner
//!     → merged via Api::set_resources
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the route table reloads
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::ServerConfig;
pub use schema::{ApiConfig, ListenerConfig, LogFormat, ObservabilityConfig, RoutesConfig, TimeoutConfig};
pub use watcher::RoutesWatcher;
