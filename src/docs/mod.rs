//! API documentation.
//!
//! # Data Flow
//! ```text
//! GET /          → page.rs (Swagger UI shell)
//!                     → browser fetches GET /endpoints
//! GET /endpoints → introspect.rs (walk the live RouteTree)
//!                     → SpecDocument as sorted, indented JSON
//! ```

pub mod introspect;
pub mod page;

pub use introspect::{api_title, describe, Operation, Parameter, SpecDocument};
pub use page::{index_html, SPEC_URL};
