//! The declarative route tree.
//!
//! A tree node holds handlers keyed by method and subtrees keyed by path
//! segment. Method keys and route keys cannot be confused: the types keep
//! them apart, and the mapping-style [`RouteTree::insert`] checks each key
//! against the kind of value it is given. Every check runs when the tree is
//! built, so registration only ever sees well-formed trees.

use std::collections::BTreeMap;

use crate::routes::error::RouteError;
use crate::routes::handler::Handler;
use crate::routes::method::Method;
use crate::routes::segment::Segment;

/// A value in the mapping form of a tree.
#[derive(Debug, Clone)]
pub enum Node {
    Handler(Handler),
    Tree(RouteTree),
}

impl From<Handler> for Node {
    fn from(handler: Handler) -> Self {
        Node::Handler(handler)
    }
}

impl From<RouteTree> for Node {
    fn from(tree: RouteTree) -> Self {
        Node::Tree(tree)
    }
}

/// Nested mapping from path segments and methods down to handlers.
#[derive(Debug, Clone, Default)]
pub struct RouteTree {
    methods: BTreeMap<Method, Handler>,
    children: BTreeMap<Segment, RouteTree>,
}

impl RouteTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `method` at this node.
    pub fn method(mut self, method: Method, handler: Handler) -> Self {
        self.methods.insert(method, handler);
        self
    }

    pub fn get(self, handler: Handler) -> Self {
        self.method(Method::Get, handler)
    }

    pub fn post(self, handler: Handler) -> Self {
        self.method(Method::Post, handler)
    }

    pub fn put(self, handler: Handler) -> Self {
        self.method(Method::Put, handler)
    }

    pub fn patch(self, handler: Handler) -> Self {
        self.method(Method::Patch, handler)
    }

    pub fn delete(self, handler: Handler) -> Self {
        self.method(Method::Delete, handler)
    }

    /// Nest `tree` under `segment`.
    pub fn route(mut self, segment: &str, tree: RouteTree) -> Result<Self, RouteError> {
        self.insert(segment, Node::Tree(tree))?;
        Ok(self)
    }

    /// Insert a value under a raw key, the way a nested mapping would be
    /// written: method names take handlers, `/`-prefixed keys take subtrees.
    pub fn insert(&mut self, key: &str, node: impl Into<Node>) -> Result<(), RouteError> {
        match (key.parse::<Method>(), node.into()) {
            (Ok(method), Node::Handler(handler)) => {
                self.methods.insert(method, handler);
                Ok(())
            }
            (Ok(_), Node::Tree(_)) => Err(RouteError::structural(
                key,
                "a method must map to a handler, found a route table",
            )),
            (Err(_), Node::Handler(handler)) => Err(RouteError::structural(
                handler.name(),
                format!("{:?} is not a method, so it must map to a route table", key),
            )),
            (Err(_), Node::Tree(tree)) => {
                let segment = Segment::parse(key)?;
                if segment.is_catch_all() && !tree.children.is_empty() {
                    return Err(RouteError::structural(
                        key,
                        "nothing can be nested below a path: placeholder",
                    ));
                }
                self.children.insert(segment, tree);
                Ok(())
            }
        }
    }

    /// Handlers bound at this node.
    pub fn methods(&self) -> impl Iterator<Item = (Method, &Handler)> {
        self.methods.iter().map(|(m, h)| (*m, h))
    }

    /// Subtrees of this node, ordered by segment.
    pub fn children(&self) -> impl Iterator<Item = (&Segment, &RouteTree)> {
        self.children.iter()
    }

    pub fn handler(&self, method: Method) -> Option<&Handler> {
        self.methods.get(&method)
    }

    /// Look up the subtree at `segment` directly below this node.
    pub fn child(&self, segment: &str) -> Option<&RouteTree> {
        self.children.iter().find(|(s, _)| s.as_str() == segment).map(|(_, t)| t)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.children.is_empty()
    }

    /// Number of (path, method) leaves in the whole tree.
    pub fn leaf_count(&self) -> usize {
        self.methods.len() + self.children.values().map(RouteTree::leaf_count).sum::<usize>()
    }

    /// Shallow update: every top-level key of `other` replaces the key of
    /// the same name here, subtrees included, without merging them.
    pub fn update(&mut self, other: RouteTree) {
        self.methods.extend(other.methods);
        self.children.extend(other.children);
    }

    pub(crate) fn parts(&self) -> (&BTreeMap<Method, Handler>, &BTreeMap<Segment, RouteTree>) {
        (&self.methods, &self.children)
    }

    pub(crate) fn from_parts(
        methods: BTreeMap<Method, Handler>,
        children: BTreeMap<Segment, RouteTree>,
    ) -> Self {
        Self { methods, children }
    }
}
