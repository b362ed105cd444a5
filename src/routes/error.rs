//! Registration-time errors.

use thiserror::Error;

use crate::routes::method::Method;

/// Errors raised while building or registering a route tree.
///
/// All of these are fatal at startup: the tree has to be fixed before the
/// application can serve traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The tree has the wrong shape: a key that is neither a method nor a
    /// route, a malformed placeholder, or a value of the wrong kind.
    #[error("Expected either rest call (GET, POST, etc.) or route (/something, /<var>, etc.). Found: {found:?} ({reason})")]
    Structural { found: String, reason: String },

    /// A different handler is already bound to this (path, method).
    #[error("Attempting to register a second handler {incoming:?} for {method} {path} (already bound to {existing:?})")]
    Conflict {
        method: Method,
        path: String,
        existing: String,
        incoming: String,
    },

    /// Two spellings of the same route shape, e.g. `/n/<id>` and `/n/<int:id>`.
    #[error("Route {path} is ambiguous with already registered route {existing}")]
    Ambiguous { path: String, existing: String },

    /// The (path, method) pair is served by the documentation endpoints.
    #[error("{method} {path} is reserved for the API documentation")]
    Reserved { method: Method, path: String },

    /// The underlying router refused the route table.
    #[error("Router rejected the route table: {reason}")]
    Rejected { reason: String },
}

impl RouteError {
    pub(crate) fn structural(found: impl Into<String>, reason: impl Into<String>) -> Self {
        RouteError::Structural {
            found: found.into(),
            reason: reason.into(),
        }
    }

    /// True for shape errors, false for binding conflicts.
    pub fn is_structural(&self) -> bool {
        matches!(self, RouteError::Structural { .. })
    }

    /// True when two bindings collide on the same route.
    pub fn is_conflict(&self) -> bool {
        !self.is_structural()
    }
}
