//! Deep merge of route trees.

use crate::routes::tree::RouteTree;

/// Key-wise union of two trees.
///
/// Subtrees present on both sides are merged recursively; for a method
/// present on both sides the incoming handler wins. Neither input is
/// modified.
pub fn merge(base: &RouteTree, incoming: &RouteTree) -> RouteTree {
    let (base_methods, base_children) = base.parts();
    let (new_methods, new_children) = incoming.parts();

    let mut methods = base_methods.clone();
    methods.extend(new_methods.iter().map(|(m, h)| (*m, h.clone())));

    let mut children = base_children.clone();
    for (segment, subtree) in new_children {
        let merged = match base_children.get(segment) {
            Some(existing) => merge(existing, subtree),
            None => subtree.clone(),
        };
        children.insert(segment.clone(), merged);
    }

    RouteTree::from_parts(methods, children)
}
