//! Binding route trees to the router.
//!
//! # Responsibilities
//! - Walk a tree depth-first, accumulating the path
//! - Record one handler per (path, method)
//! - Build the axum method routers for every bound path
//!
//! # Design Decisions
//! - Binding the same handler twice is a no-op, so a whole tree can be
//!   re-applied after every merge
//! - `register` is strict: a different handler for a bound pair is a
//!   conflict. `apply` takes merge output, where the tree is authoritative
//!   and a different handler replaces the old one
//! - Both operations are all-or-nothing: on error the table is unchanged

use std::collections::{BTreeMap, BTreeSet, HashMap};

use axum::routing::MethodRouter;

use crate::http::wrapper::Adapter;
use crate::routes::{Handler, Method, RouteError, RoutePath, RouteTree};

/// Outcome of binding one (path, method).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Newly bound.
    Bound,
    /// Already bound to the same handler.
    Unchanged,
    /// A different handler was replaced (only through `apply`).
    Replaced,
}

#[derive(Debug, Clone)]
struct Entry {
    path: RoutePath,
    handler: Handler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Replace,
}

/// State of one registration pass.
struct Walk {
    mode: Mode,
    seen: BTreeSet<(String, Method)>,
    changed: usize,
}

/// The registration table, keyed by (raw path, method).
#[derive(Debug, Clone, Default)]
pub struct Registrar {
    table: BTreeMap<(String, Method), Entry>,
    shapes: HashMap<String, String>,
    reserved: BTreeSet<(String, Method)>,
}

impl Registrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep (path, method) out of reach of route trees.
    pub fn reserve(&mut self, path: &str, method: Method) {
        self.reserved.insert((path.to_string(), method));
    }

    /// Register every leaf of `tree`. A different handler for an already
    /// bound (path, method) is a [`RouteError::Conflict`].
    pub fn register(&mut self, tree: &RouteTree) -> Result<usize, RouteError> {
        self.stage(tree, Mode::Strict)
    }

    /// Register merge output: leaves that differ from the table replace it.
    pub fn apply(&mut self, tree: &RouteTree) -> Result<usize, RouteError> {
        self.stage(tree, Mode::Replace)
    }

    /// Returns how many bindings were added or replaced.
    fn stage(&mut self, tree: &RouteTree, mode: Mode) -> Result<usize, RouteError> {
        let mut staged = self.clone();
        let mut walk = Walk {
            mode,
            seen: BTreeSet::new(),
            changed: 0,
        };
        staged.walk(&RoutePath::root(), tree, &mut walk)?;
        *self = staged;
        Ok(walk.changed)
    }

    fn walk(&mut self, path: &RoutePath, tree: &RouteTree, walk: &mut Walk) -> Result<(), RouteError> {
        for (method, handler) in tree.methods() {
            if self.bind(path, method, handler, walk)? != Binding::Unchanged {
                walk.changed += 1;
            }
        }
        for (segment, subtree) in tree.children() {
            self.walk(&path.join(segment), subtree, walk)?;
        }
        Ok(())
    }

    fn bind(&mut self, path: &RoutePath, method: Method, handler: &Handler, walk: &mut Walk) -> Result<Binding, RouteError> {
        let raw = path.raw().to_string();
        let key = (raw.clone(), method);

        if self.reserved.contains(&key) {
            return Err(RouteError::Reserved { method, path: raw });
        }

        // Only bindings from before this walk may be replaced: one tree
        // spelling the same path twice (`/v1` + `/note`, `/v1/note`) must
        // agree on the handler.
        let first_in_walk = walk.seen.insert(key.clone());

        if let Some(entry) = self.table.get_mut(&key) {
            if entry.handler.same_as(handler) {
                // Summaries may change without changing identity.
                entry.handler = handler.clone();
                return Ok(Binding::Unchanged);
            }
            if walk.mode == Mode::Strict || !first_in_walk {
                return Err(RouteError::Conflict {
                    method,
                    path: raw,
                    existing: entry.handler.name().to_string(),
                    incoming: handler.name().to_string(),
                });
            }
            tracing::info!(
                method = %method,
                path = %raw,
                old = %entry.handler.name(),
                new = %handler.name(),
                "Replacing handler"
            );
            entry.handler = handler.clone();
            return Ok(Binding::Replaced);
        }

        let shape = path.shape();
        match self.shapes.get(&shape) {
            Some(existing) if *existing != raw => {
                return Err(RouteError::Ambiguous {
                    path: raw,
                    existing: existing.clone(),
                });
            }
            Some(_) => {}
            None => {
                self.shapes.insert(shape, raw.clone());
            }
        }

        tracing::debug!(method = %method, path = %raw, handler = %handler.name(), "Route bound");
        self.table.insert(
            key,
            Entry {
                path: path.clone(),
                handler: handler.clone(),
            },
        );
        Ok(Binding::Bound)
    }

    /// The handler bound to (raw path, method), if any.
    pub fn get(&self, path: &str, method: Method) -> Option<&Handler> {
        self.table.get(&(path.to_string(), method)).map(|e| &e.handler)
    }

    /// All bindings as (raw path, method, handler), sorted.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Method, &Handler)> {
        self.table.iter().map(|((p, m), e)| (p.as_str(), *m, &e.handler))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Method routers keyed by router path, one per bound path.
    pub fn method_routers(&self, max_body_bytes: usize) -> BTreeMap<String, MethodRouter> {
        let mut routers: BTreeMap<String, MethodRouter> = BTreeMap::new();
        for ((_, method), entry) in &self.table {
            let adapter = Adapter::new(entry.handler.clone(), *method, &entry.path, max_body_bytes);
            let path = entry.path.router_path();
            let router = match routers.remove(&path) {
                Some(existing) => existing.merge(adapter.into_method_router()),
                None => adapter.into_method_router(),
            };
            routers.insert(path, router);
        }
        routers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fault::Fault;
    use crate::http::request::RequestContext;
    use crate::routes::merge;

    async fn noop(_ctx: RequestContext) -> Result<(), Fault> {
        Ok(())
    }

    fn h(name: &str) -> Handler {
        Handler::new(name, noop)
    }

    fn notes(create: &Handler, get: &Handler) -> RouteTree {
        RouteTree::new()
            .route(
                "/v1/note",
                RouteTree::new()
                    .post(create.clone())
                    .route("/<uuid>", RouteTree::new().get(get.clone()))
                    .unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_register_twice_is_noop() {
        let (create, get) = (h("create"), h("get"));
        let tree = notes(&create, &get);
        let mut registrar = Registrar::new();

        assert_eq!(registrar.register(&tree).unwrap(), 2);
        assert_eq!(registrar.register(&tree).unwrap(), 0);
        assert_eq!(registrar.len(), 2);
        assert!(registrar.get("/v1/note/<uuid>", Method::Get).unwrap().same_as(&get));
    }

    #[test]
    fn test_direct_conflict() {
        let mut registrar = Registrar::new();
        registrar.register(&RouteTree::new().get(h("first"))).unwrap();

        let err = registrar.register(&RouteTree::new().get(h("second"))).unwrap_err();
        match err {
            RouteError::Conflict { method, path, .. } => {
                assert_eq!(method, Method::Get);
                assert_eq!(path, "/");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(registrar.get("/", Method::Get).unwrap().name(), "first");
    }

    #[test]
    fn test_merge_then_apply_prefers_incoming() {
        let (create, get) = (h("create"), h("get"));
        let t1 = notes(&create, &get);
        let get2 = h("get2");
        let t2 = notes(&create, &get2);

        let mut registrar = Registrar::new();
        registrar.apply(&t1).unwrap();
        let merged = merge(&t1, &t2);
        assert_eq!(registrar.apply(&merged).unwrap(), 1);
        assert!(registrar.get("/v1/note/<uuid>", Method::Get).unwrap().same_as(&get2));

        let mut fresh = Registrar::new();
        fresh.register(&merged).unwrap();
        assert!(fresh.get("/v1/note/<uuid>", Method::Get).unwrap().same_as(&get2));
    }

    fn two_spellings(a: &Handler, b: &Handler) -> RouteTree {
        RouteTree::new()
            .route("/v1", RouteTree::new().route("/note", RouteTree::new().get(a.clone())).unwrap())
            .unwrap()
            .route("/v1/note", RouteTree::new().get(b.clone()))
            .unwrap()
    }

    #[test]
    fn test_one_tree_cannot_bind_a_path_twice() {
        let (a, b) = (h("A"), h("B"));
        let tree = two_spellings(&a, &b);

        for mode in [Mode::Strict, Mode::Replace] {
            let mut registrar = Registrar::new();
            let err = registrar.stage(&tree, mode).unwrap_err();
            match err {
                RouteError::Conflict { method, path, .. } => {
                    assert_eq!(method, Method::Get);
                    assert_eq!(path, "/v1/note");
                }
                other => panic!("unexpected error: {:?}", other),
            }
            assert!(registrar.is_empty());
        }

        // Same handler under both spellings is fine.
        let mut registrar = Registrar::new();
        registrar.apply(&two_spellings(&a, &a)).unwrap();
        assert_eq!(registrar.len(), 1);
    }

    #[test]
    fn test_apply_replaces_only_earlier_bindings() {
        let (old, a, b) = (h("old"), h("A"), h("B"));
        let mut registrar = Registrar::new();
        registrar
            .apply(&RouteTree::new().route("/v1/note", RouteTree::new().get(old.clone())).unwrap())
            .unwrap();

        let err = registrar.apply(&two_spellings(&a, &b)).unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));
        assert!(registrar.get("/v1/note", Method::Get).unwrap().same_as(&old));

        assert_eq!(registrar.apply(&two_spellings(&a, &a)).unwrap(), 1);
        assert!(registrar.get("/v1/note", Method::Get).unwrap().same_as(&a));
    }

    #[test]
    fn test_disjoint_merge_registers_union() {
        let t1 = RouteTree::new().route("/a", RouteTree::new().get(h("a"))).unwrap();
        let t2 = RouteTree::new()
            .route("/b", RouteTree::new().get(h("b")).post(h("b2")))
            .unwrap();
        let mut registrar = Registrar::new();
        registrar.register(&merge(&t1, &t2)).unwrap();

        let bound: Vec<_> = registrar.iter().map(|(p, m, _)| (p.to_string(), m)).collect();
        assert_eq!(
            bound,
            vec![
                ("/a".to_string(), Method::Get),
                ("/b".to_string(), Method::Get),
                ("/b".to_string(), Method::Post),
            ]
        );
    }

    #[test]
    fn test_failed_register_leaves_table_unchanged() {
        let mut registrar = Registrar::new();
        registrar.register(&RouteTree::new().route("/x", RouteTree::new().get(h("x"))).unwrap()).unwrap();

        let bad = RouteTree::new()
            .route("/new", RouteTree::new().get(h("new")))
            .unwrap()
            .route("/x", RouteTree::new().get(h("other")))
            .unwrap();
        assert!(registrar.register(&bad).is_err());
        assert!(registrar.get("/new", Method::Get).is_none());
        assert_eq!(registrar.len(), 1);
    }

    #[test]
    fn test_ambiguous_and_reserved() {
        let mut registrar = Registrar::new();
        registrar.reserve("/endpoints", Method::Get);

        registrar.register(&RouteTree::new().route("/n/<id>", RouteTree::new().get(h("a"))).unwrap()).unwrap();
        let err = registrar
            .register(&RouteTree::new().route("/n/<int:id>", RouteTree::new().delete(h("b"))).unwrap())
            .unwrap_err();
        assert!(matches!(err, RouteError::Ambiguous { .. }));
        assert!(err.is_conflict());

        let err = registrar
            .register(&RouteTree::new().route("/endpoints", RouteTree::new().get(h("c"))).unwrap())
            .unwrap_err();
        assert!(matches!(err, RouteError::Reserved { .. }));

        // Other methods on a reserved path are fine.
        registrar
            .register(&RouteTree::new().route("/endpoints", RouteTree::new().post(h("d"))).unwrap())
            .unwrap();
    }

    #[test]
    fn test_method_routers_group_by_path() {
        let tree = RouteTree::new()
            .route("/a", RouteTree::new().get(h("g")).post(h("p")))
            .unwrap()
            .route("/b/<path:rest>", RouteTree::new().get(h("f")))
            .unwrap();
        let mut registrar = Registrar::new();
        registrar.register(&tree).unwrap();

        let routers = registrar.method_routers(1024);
        let paths: Vec<_> = routers.keys().cloned().collect();
        assert_eq!(paths, vec!["/a".to_string(), "/b/{*rest}".to_string()]);
    }
}
