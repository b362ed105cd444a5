//! Declarative route trees.
//!
//! # Data Flow
//! ```text
//! builder calls / TOML route file (loader.rs)
//!     → tree.rs (validated RouteTree)
//!     → merge.rs (incremental updates)
//!     → registry::Registrar (bind to the router)
//!     → docs::describe (Swagger document)
//! ```
//!
//! # Design Decisions
//! - Method keys and route keys are distinct types; shape errors surface
//!   while the tree is built, never during a walk
//! - Trees are plain values: cloning is cheap (handlers are shared) and
//!   merging never mutates its inputs

pub mod error;
pub mod handler;
pub mod loader;
pub mod merge;
pub mod method;
pub mod segment;
pub mod tree;

pub use error::RouteError;
pub use handler::{Handler, HandlerFuture};
pub use loader::{load_routes, parse_routes, HandlerRegistry, LoadError};
pub use merge::merge;
pub use method::Method;
pub use segment::{ParamType, PathParam, RoutePath, Segment};
pub use tree::{Node, RouteTree};
