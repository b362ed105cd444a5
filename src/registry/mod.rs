//! Route registration and publication.
//!
//! # Data Flow
//! ```text
//! RouteTree (builder or route file)
//!     → api.rs (merge into the current tree)
//!     → registrar.rs (bind every (path, method), all-or-nothing)
//!     → axum Router built from the table
//!     → live.rs (atomically published)
//!     → http::server dispatches each request to the live router
//! ```
//!
//! # Design Decisions
//! - Registration runs against a staged copy; only a complete table is
//!   ever published
//! - In-flight requests keep the router they were dispatched to

pub mod api;
pub mod live;
pub mod registrar;

pub use api::Api;
pub use live::{dispatch, LiveRoutes};
pub use registrar::{Binding, Registrar};
