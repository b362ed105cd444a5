//! Path segment grammar.
//!
//! A segment is a route-tree key such as `/note`, `/<uuid>` or
//! `/files/<path:rest>`. Each `/`-separated component is either literal text
//! or a single placeholder `<[type:]name>` with
//! `type ∈ {"", "string:", "int:", "float:", "path:", "uuid:"}`.
//!
//! # Renderings
//! - raw: the tree spelling (`/note/<uuid:id>`), used in summaries
//! - OpenAPI: placeholders become `{name}` (`/note/{id}`)
//! - router: what axum binds (`/note/{id}`, catch-all `{*name}`)
//! - shape: placeholder names erased, used to detect ambiguous spellings

use std::cmp::Ordering;
use std::fmt;

use uuid::Uuid;

use crate::routes::error::RouteError;

/// Declared type of a path placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Unspecified,
    String,
    Int,
    Float,
    Path,
    Uuid,
}

impl ParamType {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "" => Some(ParamType::Unspecified),
            "string" => Some(ParamType::String),
            "int" => Some(ParamType::Int),
            "float" => Some(ParamType::Float),
            "path" => Some(ParamType::Path),
            "uuid" => Some(ParamType::Uuid),
            _ => None,
        }
    }

    /// The prefix as written in a placeholder, colon included.
    pub fn token(&self) -> &'static str {
        match self {
            ParamType::Unspecified => "",
            ParamType::String => "string:",
            ParamType::Int => "int:",
            ParamType::Float => "float:",
            ParamType::Path => "path:",
            ParamType::Uuid => "uuid:",
        }
    }

    /// Swagger type used for documentation.
    pub fn doc_type(&self) -> &'static str {
        match self {
            ParamType::Unspecified | ParamType::String | ParamType::Path | ParamType::Uuid => "string",
            ParamType::Int => "integer",
            ParamType::Float => "number",
        }
    }

    /// Whether a captured value satisfies this converter.
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            ParamType::Unspecified | ParamType::String => !value.is_empty() && !value.contains('/'),
            ParamType::Path => !value.is_empty(),
            ParamType::Int => !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
            ParamType::Float => match value.split_once('.') {
                Some((whole, frac)) => {
                    !whole.is_empty()
                        && !frac.is_empty()
                        && whole.bytes().all(|b| b.is_ascii_digit())
                        && frac.bytes().all(|b| b.is_ascii_digit())
                }
                None => false,
            },
            ParamType::Uuid => Uuid::parse_str(value).is_ok(),
        }
    }
}

/// A named placeholder extracted from a route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathParam {
    pub kind: ParamType,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
    Literal(String),
    Param(PathParam),
}

impl Component {
    fn parse(text: &str, segment: &str) -> Result<Self, RouteError> {
        let Some(inner) = text.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
            if text.contains(['<', '>', '{', '}']) {
                return Err(RouteError::structural(
                    segment,
                    "placeholders must span a whole path component",
                ));
            }
            return Ok(Component::Literal(text.to_string()));
        };

        let (token, name) = inner.split_once(':').unwrap_or(("", inner));
        let kind = ParamType::from_token(token).ok_or_else(|| {
            RouteError::structural(segment, format!("unknown placeholder type {:?}", token))
        })?;
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'_') {
            return Err(RouteError::structural(
                segment,
                format!("invalid placeholder name {:?}", name),
            ));
        }

        Ok(Component::Param(PathParam {
            kind,
            name: name.to_string(),
        }))
    }
}

/// A validated route-tree key.
#[derive(Debug, Clone)]
pub struct Segment {
    raw: String,
    components: Vec<Component>,
}

impl Segment {
    /// Parse a key such as `/note/<uuid:id>`.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let Some(rest) = raw.strip_prefix('/') else {
            return Err(RouteError::structural(raw, "routes must begin with '/'"));
        };

        let parts: Vec<&str> = rest.split('/').collect();
        let last = parts.len() - 1;
        let mut components = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            if part.is_empty() && i != last {
                return Err(RouteError::structural(raw, "empty path component"));
            }
            let component = Component::parse(part, raw)?;
            if let Component::Param(PathParam { kind: ParamType::Path, .. }) = component {
                if i != last {
                    return Err(RouteError::structural(
                        raw,
                        "a path: placeholder must be the last component",
                    ));
                }
            }
            components.push(component);
        }

        Ok(Self {
            raw: raw.to_string(),
            components,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// True when the segment ends in a `path:` placeholder, which swallows
    /// the rest of the URL.
    pub fn is_catch_all(&self) -> bool {
        matches!(
            self.components.last(),
            Some(Component::Param(PathParam { kind: ParamType::Path, .. }))
        )
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Segment {}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The full path accumulated while walking a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutePath {
    raw: String,
    components: Vec<Component>,
}

impl RoutePath {
    /// The empty path at the root of a tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend this path with a segment.
    pub fn join(&self, segment: &Segment) -> Self {
        let mut components = self.components.clone();
        components.extend(segment.components.iter().cloned());
        Self {
            raw: format!("{}{}", self.raw, segment.raw),
            components,
        }
    }

    /// Parse a full path such as `/v1/note/<uuid>`.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if raw.is_empty() || raw == "/" {
            return Ok(Self::root());
        }
        let segment = Segment::parse(raw)?;
        Ok(Self::root().join(&segment))
    }

    /// The path as spelled in the tree. The root renders as `/`.
    pub fn raw(&self) -> &str {
        if self.raw.is_empty() {
            "/"
        } else {
            &self.raw
        }
    }

    /// Placeholders in left-to-right order.
    pub fn params(&self) -> impl Iterator<Item = &PathParam> {
        self.components.iter().filter_map(|c| match c {
            Component::Param(p) => Some(p),
            Component::Literal(_) => None,
        })
    }

    pub fn has_params(&self) -> bool {
        self.params().next().is_some()
    }

    /// OpenAPI spelling: `/note/{id}`.
    pub fn openapi(&self) -> String {
        self.render(|p| format!("{{{}}}", p.name))
    }

    /// The path handed to the axum router.
    pub(crate) fn router_path(&self) -> String {
        self.render(|p| match p.kind {
            ParamType::Path => format!("{{*{}}}", p.name),
            _ => format!("{{{}}}", p.name),
        })
    }

    /// The router path with placeholder names erased.
    pub(crate) fn shape(&self) -> String {
        self.render(|p| match p.kind {
            ParamType::Path => "{*}".to_string(),
            _ => "{}".to_string(),
        })
    }

    fn render(&self, param: impl Fn(&PathParam) -> String) -> String {
        if self.components.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for component in &self.components {
            out.push('/');
            match component {
                Component::Literal(text) => out.push_str(text),
                Component::Param(p) => out.push_str(&param(p)),
            }
        }
        out
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}
