use std::{fmt, sync::Arc};

use axum::http::Method;

use crate::{
    Error,
    handler::Handler,
    path::{Matcher, Params, Pattern},
};

/// The HTTP verbs a route answers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodFilter {
    /// Any verb. Written as `ALL` (or `*`) at registration.
    Any,
    /// Exactly one verb.
    Only(Method),
}

impl MethodFilter {
    /// Parses a verb, case-insensitively. `ALL` and `*` select every verb.
    pub fn parse(method: &str) -> Result<Self, Error> {
        let method = method.trim();
        if method.is_empty() {
            return Err(Error::InvalidMethod(method.to_owned()));
        }

        let upper = method.to_ascii_uppercase();
        if upper == "ALL" || upper == "*" {
            return Ok(MethodFilter::Any);
        }

        Method::from_bytes(upper.as_bytes())
            .map(MethodFilter::Only)
            .map_err(|_| Error::InvalidMethod(method.to_owned()))
    }

    /// Whether a request with `method` passes this filter.
    pub fn allows(&self, method: &Method) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Only(only) => only == method,
        }
    }
}

impl fmt::Display for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodFilter::Any => f.pad("ALL"),
            MethodFilter::Only(method) => f.pad(method.as_str()),
        }
    }
}

/// A registered `(method, pattern, handlers)` triple. Immutable once built.
#[derive(Clone)]
pub struct Route {
    method: MethodFilter,
    pattern: Pattern,
    matcher: Matcher,
    handlers: Arc<[Handler]>,
}

impl Route {
    pub(crate) fn new(
        method: MethodFilter,
        pattern: Pattern,
        handlers: Vec<Handler>,
    ) -> Result<Self, Error> {
        if handlers.is_empty() {
            return Err(Error::EmptyChain(format!("{method} {pattern}")));
        }
        let matcher = Matcher::compile(&pattern)?;

        Ok(Route {
            method,
            pattern,
            matcher,
            handlers: handlers.into(),
        })
    }

    /// The verb filter.
    pub fn method(&self) -> &MethodFilter {
        &self.method
    }

    /// The pattern as registered.
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The handler chain, in calling order.
    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    pub(crate) fn chain(&self) -> Arc<[Handler]> {
        Arc::clone(&self.handlers)
    }

    /// Returns the captured parameters when both the verb and the path match.
    pub fn matches(&self, method: &Method, path: &str) -> Option<Params> {
        if !self.method.allows(method) {
            return None;
        }
        self.matcher.matches(path)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A successful lookup: the first route that matched, and what it captured.
#[derive(Debug, Clone)]
pub struct Match<'a> {
    pub route: &'a Route,
    pub params: Params,
}

/// First-match-wins scan over routes in registration order.
pub(crate) fn find<'a>(routes: &'a [Route], method: &Method, path: &str) -> Option<Match<'a>> {
    routes.iter().find_map(|route| {
        route
            .matches(method, path)
            .map(|params| Match { route, params })
    })
}
