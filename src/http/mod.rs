//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, request id, timeout, trace)
//!     → registry::dispatch (live router picks the adapter)
//!     → wrapper.rs (build RequestContext, run handler, catch faults)
//!         request.rs / params.rs / json.rs / auth.rs for handler input
//!     → response.rs (JSON envelope, status, headers)
//!     → Send to client
//! ```

pub mod auth;
pub mod fault;
pub mod json;
pub mod params;
pub mod request;
pub mod response;
pub mod server;
pub mod wrapper;

pub use auth::Authorization;
pub use fault::Fault;
pub use json::Json;
pub use params::Params;
pub use request::{RequestContext, X_REQUEST_ID};
pub use response::ResponseEnvelope;
pub use server::HttpServer;
