//! Route tables declared in TOML.
//!
//! ```toml
//! ["/v1"."/note"]
//! POST = "Note::create"
//! GET = "Note::get_all"
//!
//! ["/v1"."/note"."/<uuid>"]
//! GET = "Note::get"
//! DELETE = "Note::delete"
//! ```
//!
//! Method keys name a handler in a [`HandlerRegistry`]; route keys hold
//! nested tables. Anything else is a structural error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::routes::error::RouteError;
use crate::routes::handler::Handler;
use crate::routes::method::Method;
use crate::routes::tree::RouteTree;

/// Handlers addressable by qualified name.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Handler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a handler under its qualified name.
    pub fn with(mut self, handler: Handler) -> Self {
        self.insert(handler);
        self
    }

    pub fn insert(&mut self, handler: Handler) {
        self.handlers.insert(handler.name().to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Error type for route file loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Route(#[from] RouteError),
}

/// Build a tree from TOML text.
pub fn parse_routes(text: &str, registry: &HandlerRegistry) -> Result<RouteTree, LoadError> {
    let table: toml::Table = toml::from_str(text)?;
    Ok(tree_from_table(&table, registry)?)
}

/// Load and resolve a route file.
pub fn load_routes(path: &Path, registry: &HandlerRegistry) -> Result<RouteTree, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_routes(&content, registry)
}

/// Resolve a parsed TOML table into a tree.
pub fn tree_from_table(table: &toml::Table, registry: &HandlerRegistry) -> Result<RouteTree, RouteError> {
    let mut tree = RouteTree::new();
    for (key, value) in table {
        if Method::is_method_key(key) {
            let toml::Value::String(name) = value else {
                return Err(RouteError::structural(
                    value.to_string(),
                    format!("{} must name a handler", key),
                ));
            };
            let handler = registry.get(name).ok_or_else(|| {
                RouteError::structural(name.as_str(), "no handler is registered under this name")
            })?;
            tree.insert(key, handler.clone())?;
        } else {
            let toml::Value::Table(nested) = value else {
                return Err(RouteError::structural(
                    value.to_string(),
                    format!("{:?} must hold a route table", key),
                ));
            };
            tree.insert(key, tree_from_table(nested, registry)?)?;
        }
    }
    Ok(tree)
}
