//! Swagger document generation.
//!
//! The tree is walked breadth-first, independently of registration, so a
//! document can be produced for any tree whether or not it was ever bound.

use std::collections::{BTreeMap, VecDeque};

use serde::Serialize;

use crate::routes::{RoutePath, RouteTree};

/// Machine-readable description of every route in a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecDocument {
    pub swagger: String,
    pub info: Info,
    pub paths: BTreeMap<String, BTreeMap<String, Operation>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// One method at one path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Operation {
    pub summary: String,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub description: String,
    pub schema: Schema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Describe `tree` for the application called `app_name`.
pub fn describe(tree: &RouteTree, app_name: &str) -> SpecDocument {
    let mut paths: BTreeMap<String, BTreeMap<String, Operation>> = BTreeMap::new();
    let mut queue = VecDeque::from([(RoutePath::root(), tree)]);

    while let Some((path, node)) = queue.pop_front() {
        for (method, handler) in node.methods() {
            let summary = match handler.summary_text() {
                Some(text) => text.to_string(),
                None => format!("Route for {}", path.raw()),
            };
            paths
                .entry(path.openapi())
                .or_default()
                .insert(method.as_lower().to_string(), Operation {
                    summary,
                    parameters: parameters(&path),
                });
        }
        for (segment, subtree) in node.children() {
            queue.push_back((path.join(segment), subtree));
        }
    }

    SpecDocument {
        swagger: "2.0".to_string(),
        info: Info {
            title: api_title(app_name),
            version: "1.0".to_string(),
        },
        paths,
    }
}

fn parameters(path: &RoutePath) -> Vec<Parameter> {
    path.params()
        .map(|p| Parameter {
            name: p.name.clone(),
            location: "path".to_string(),
            required: true,
            description: format!("{} for route {}", p.name, path.raw()),
            schema: Schema {
                kind: p.kind.doc_type().to_string(),
            },
        })
        .collect()
}

/// `notes_server.main` → `Notes Server API`.
pub fn api_title(app_name: &str) -> String {
    let base = app_name.split('.').next().unwrap_or_default().replace('_', " ");
    format!("{} API", title_case(&base))
}

// Word boundaries are any non-alphabetic character, so "v2api" → "V2Api".
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_word = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
