//! Handlers bound at route-tree leaves.
//!
//! A handler is an async function from [`RequestContext`] to
//! `Result<T, Fault>` where `T: Serialize`. Related handlers share a
//! namespace through plain Rust scoping (a module or the associated functions
//! of a unit struct); the qualified name only labels the handler in logs and
//! route listings, nothing is instantiated per call.
//!
//! Identity is the identity of the wrapped function: clones of one `Handler`
//! are the same handler, two `Handler::new` calls never are.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde::Serialize;
use serde_json::Value;

use crate::http::fault::Fault;
use crate::http::request::RequestContext;

/// Future returned by a handler after its output has been serialized.
pub type HandlerFuture = BoxFuture<'static, Result<Value, Fault>>;

type HandlerFn = dyn Fn(RequestContext) -> HandlerFuture + Send + Sync;

/// A unit of application logic for one method at one path.
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    summary: Option<Arc<str>>,
    func: Arc<HandlerFn>,
}

impl Handler {
    /// Wrap an async function under a qualified name such as `Note::create`.
    pub fn new<F, Fut, T>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let func = move |ctx: RequestContext| {
            let fut = func(ctx);
            async move { serialize(fut.await?) }.boxed()
        };
        Self::from_boxed(name.into(), Arc::new(func))
    }

    /// Wrap an async function that also receives a clone of shared state.
    pub fn with_state<S, F, Fut, T>(name: impl Into<String>, state: S, func: F) -> Self
    where
        S: Clone + Send + Sync + 'static,
        F: Fn(S, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, Fault>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let func = move |ctx: RequestContext| {
            let fut = func(state.clone(), ctx);
            async move { serialize(fut.await?) }.boxed()
        };
        Self::from_boxed(name.into(), Arc::new(func))
    }

    fn from_boxed(name: String, func: Arc<HandlerFn>) -> Self {
        let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        Self {
            name: name.into(),
            summary: None,
            func,
        }
    }

    /// Attach a documentation summary. The result is still the same handler.
    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(Arc::from(summary.into()));
        self
    }

    /// Qualified name, e.g. `Note::create`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary_text(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// True if both values wrap the same function.
    pub fn same_as(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }

    /// Invoke the handler.
    pub fn call(&self, ctx: RequestContext) -> HandlerFuture {
        (self.func)(ctx)
    }
}

fn serialize<T: Serialize>(value: T) -> Result<Value, Fault> {
    serde_json::to_value(value).map_err(|e| Fault::Internal(e.into()))
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("summary", &self.summary)
            .finish()
    }
}

/// Build a [`Handler`] from a function path, naming it after the path.
///
/// ```ignore
/// let h = handler!(Note::get_all);
/// assert_eq!(h.name(), "Note::get_all");
/// ```
#[macro_export]
macro_rules! handler {
    ($func:path) => {
        $crate::routes::Handler::new(stringify!($func), $func)
    };
    ($func:path, $state:expr) => {
        $crate::routes::Handler::with_state(stringify!($func), $state, $func)
    };
}
