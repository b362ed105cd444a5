//! Declarative REST routing on top of axum.
//!
//! Applications describe their API as a nested [`RouteTree`] of path
//! segments and methods, hand it to an [`Api`], and get:
//! - every handler wrapped so faults, errors and panics become JSON
//!   `{error, message}` responses
//! - a Swagger 2.0 document at `GET /endpoints` and a viewer at `GET /`
//! - incremental updates (`Api::set_resources`) that take effect while serving

pub mod config;
pub mod docs;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;
pub mod routes;

pub use config::ServerConfig;
pub use http::{Fault, HttpServer, RequestContext};
pub use lifecycle::Shutdown;
pub use registry::Api;
pub use routes::{Handler, RouteTree};
