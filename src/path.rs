use std::fmt;

use crate::Error;

/// The path part of a route, normalized at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// A single template such as `/users/:id`.
    Path(String),
    /// Several templates; the route matches when any of them does.
    Paths(Vec<String>),
    /// Matches every path. Used when a route is registered without a path.
    Any,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Path(path) => f.write_str(path),
            Pattern::Paths(paths) => write!(f, "[{}]", paths.join(", ")),
            Pattern::Any => f.write_str("*"),
        }
    }
}

impl From<&str> for Pattern {
    fn from(path: &str) -> Self {
        Pattern::Path(path.to_owned())
    }
}

impl From<String> for Pattern {
    fn from(path: String) -> Self {
        Pattern::Path(path)
    }
}

impl From<Vec<String>> for Pattern {
    fn from(paths: Vec<String>) -> Self {
        Pattern::Paths(paths)
    }
}

impl From<Vec<&str>> for Pattern {
    fn from(paths: Vec<&str>) -> Self {
        Pattern::Paths(paths.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for Pattern {
    fn from(paths: &[&str]) -> Self {
        Pattern::Paths(paths.iter().map(|p| (*p).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Pattern {
    fn from(paths: [&str; N]) -> Self {
        Pattern::Paths(paths.iter().map(|p| (*p).to_owned()).collect())
    }
}

/// Path parameters captured by a successful match, in pattern order.
///
/// The dispatcher also stores them in the request extensions, so services
/// behind the router can read them.
///
/// ```rust
/// use switchyard::{Matcher, Pattern};
///
/// let matcher = Matcher::compile(&Pattern::from("/repos/:owner/:repo")).unwrap();
/// let params = matcher.matches("/repos/tokio-rs/axum").unwrap();
///
/// assert_eq!(params.len(), 2);
/// let names: Vec<_> = params.iter().map(|(name, _)| name).collect();
/// assert_eq!(names, ["owner", "repo"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    /// An empty set of parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value captured for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over `(name, value)` pairs in pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The number of captured parameters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_owned(), value.into()));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Wildcard(String),
}

/// One compiled path template.
#[derive(Debug, Clone)]
struct Template {
    segments: Vec<Segment>,
}

impl Template {
    fn parse(raw: &str) -> Result<Self, &'static str> {
        let Some(body) = raw.strip_prefix('/') else {
            return Err("pattern must start with `/`");
        };
        let body = body.strip_suffix('/').unwrap_or(body);
        if body.is_empty() {
            return Ok(Template {
                segments: Vec::new(),
            });
        }

        let parts: Vec<&str> = body.split('/').collect();
        let mut segments = Vec::with_capacity(parts.len());

        for (i, part) in parts.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                validate_name(name)?;
                Segment::Param(name.to_owned())
            } else if let Some(name) = part.strip_prefix('*') {
                if i + 1 != parts.len() {
                    return Err("wildcard must be the last segment");
                }
                if name.is_empty() {
                    Segment::Wildcard("*".to_owned())
                } else {
                    validate_name(name)?;
                    Segment::Wildcard(name.to_owned())
                }
            } else {
                Segment::Literal((*part).to_owned())
            };

            if let Segment::Param(name) | Segment::Wildcard(name) = &segment {
                let taken = segments.iter().any(|s| {
                    matches!(s, Segment::Param(n) | Segment::Wildcard(n) if n == name)
                });
                if taken {
                    return Err("duplicate parameter name");
                }
            }
            segments.push(segment);
        }

        Ok(Template { segments })
    }

    fn matches(&self, path: &str) -> Option<Params> {
        let path = path.strip_prefix('/')?;
        let path = path.strip_suffix('/').unwrap_or(path);
        let parts: Vec<&str> = if path.is_empty() {
            Vec::new()
        } else {
            path.split('/').collect()
        };

        let mut params = Params::new();
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => match parts.get(i) {
                    Some(value) if !value.is_empty() => params.insert(name, *value),
                    _ => return None,
                },
                Segment::Wildcard(name) => {
                    let rest = parts.get(i..).map(|tail| tail.join("/"));
                    params.insert(name, rest.unwrap_or_default());
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("parameter name must not be empty");
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("parameter name may only contain ASCII letters, digits and `_`");
    }
    Ok(())
}

/// A compiled [`Pattern`] that tests request paths and extracts parameters.
///
/// Matching is case-sensitive and anchored to the whole path. A single
/// trailing slash is ignored on both sides.
///
/// ```rust
/// use switchyard::{Matcher, Pattern};
///
/// let matcher = Matcher::compile(&Pattern::from("/users/:id")).unwrap();
/// let params = matcher.matches("/users/42").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(matcher.matches("/users/42/posts").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Matcher {
    kind: Kind,
}

#[derive(Debug, Clone)]
enum Kind {
    Any,
    Templates(Vec<Template>),
}

impl Matcher {
    /// Compiles every template of `pattern`, rejecting malformed ones.
    pub fn compile(pattern: &Pattern) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let kind = match pattern {
            Pattern::Any => Kind::Any,
            Pattern::Path(path) => Kind::Templates(vec![Template::parse(path).map_err(invalid)?]),
            Pattern::Paths(paths) => {
                if paths.is_empty() {
                    return Err(invalid("pattern list must not be empty"));
                }
                let templates = paths
                    .iter()
                    .map(|path| Template::parse(path))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(invalid)?;
                Kind::Templates(templates)
            }
        };

        Ok(Matcher { kind })
    }

    /// Returns the captured parameters when `path` matches.
    pub fn matches(&self, path: &str) -> Option<Params> {
        match &self.kind {
            Kind::Any => Some(Params::new()),
            Kind::Templates(templates) => templates.iter().find_map(|t| t.matches(path)),
        }
    }
}

/// Strips a normalized mount prefix from `path` on a segment boundary.
pub(crate) fn strip_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    match path.strip_prefix(prefix)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Normalizes a mount prefix: leading slash, no trailing slash, `/` becomes empty.
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    }
}
