use std::ops::{Deref, DerefMut};

use axum::http::Method;
use serde::Deserialize;

use crate::{
    Error,
    handler::IntoHandlers,
    middleware::{Convention, MiddlewareOptions, RouterLayer},
    path::{self, Matcher, Pattern},
    route::{self, Match, MethodFilter, Route},
};

/// Construction options for a [`Router`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterOptions {
    /// Mount path stripped from request paths before matching.
    pub prefix: String,
    /// Use the legacy single-step convention for mounted middleware.
    pub legacy: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        RouterOptions {
            prefix: "/".to_owned(),
            legacy: false,
        }
    }
}

impl RouterOptions {
    /// Sets the mount path.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Selects the legacy convention for [`Router::middleware`].
    pub fn legacy(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }
}

/// An ordered table of method-aware routes that mounts as a Tower layer.
///
/// Routes are matched in registration order and the first match wins. The
/// table is built up front and then exported with [`Router::middleware`],
/// which returns a layer suitable for `axum::Router::layer` or
/// `tower::ServiceBuilder`.
///
/// ```rust
/// use switchyard::{MiddlewareOptions, Router, RouterOptions, handler};
///
/// let mut api = Router::with_options(RouterOptions::default().prefix("/api"));
/// api.load_methods()
///     .get("/users/:id", handler::from_fn(|mut ctx, next| async move {
///         let body = format!("user {}", ctx.param("id").unwrap_or_default());
///         ctx.set_body(body);
///         next.run(ctx).await
///     }))
///     .unwrap();
///
/// let app: axum::Router = axum::Router::new().layer(api.middleware(MiddlewareOptions::default()));
/// # drop(app);
/// ```
///
/// The verb shorthands only exist on the builder returned by
/// [`Router::load_methods`]:
///
/// ```compile_fail
/// use switchyard::{Router, handler};
///
/// let mut router = Router::new();
/// router.get("/", handler::from_fn(|ctx, next| next.run(ctx)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Router {
    options: RouterOptions,
    routes: Vec<Route>,
}

impl Router {
    /// An empty router mounted at `/` with the callback convention.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty router with the given options.
    pub fn with_options(options: RouterOptions) -> Self {
        Router {
            options,
            routes: Vec::new(),
        }
    }

    /// The options the router was built with.
    ///
    /// On [`Methods`], `options` is the `OPTIONS` verb; see there.
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// The registered routes, in matching order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Compiles `pattern` into a standalone path matcher.
    pub fn route(&self, pattern: impl Into<Pattern>) -> Result<Matcher, Error> {
        Matcher::compile(&pattern.into())
    }

    /// Appends a route to the table.
    ///
    /// `method` is an HTTP verb or `ALL`. Nothing is deduplicated: an
    /// earlier route with the same method and pattern keeps winning.
    pub fn add_route(
        &mut self,
        method: &str,
        pattern: impl Into<Pattern>,
        handlers: impl IntoHandlers,
    ) -> Result<&Route, Error> {
        let method = MethodFilter::parse(method)?;
        let route = Route::new(method, pattern.into(), handlers.into_handlers())?;

        tracing::debug!(
            method = %route.method(),
            pattern = %route.pattern(),
            handlers = route.handlers().len(),
            "route registered"
        );

        self.routes.push(route);
        Ok(&self.routes[self.routes.len() - 1])
    }

    /// Registers a route from a compact `"METHOD /pattern"` string.
    ///
    /// Without a path part, as in `add("GET", ...)`, the route matches every path.
    pub fn add(&mut self, definition: &str, handlers: impl IntoHandlers) -> Result<&Route, Error> {
        match definition.trim().split_once(char::is_whitespace) {
            Some((method, pattern)) => self.add_route(method, pattern.trim(), handlers),
            None => self.add_route(definition, Pattern::Any, handlers),
        }
    }

    /// Unlocks the verb shorthands (`get`, `post`, ...).
    pub fn load_methods(&mut self) -> Methods<'_> {
        Methods { router: self }
    }

    /// Finds the first route matching `method` and `path`.
    ///
    /// `path` is matched as given; no prefix is stripped.
    pub fn find(&self, method: &Method, path: &str) -> Option<Match<'_>> {
        route::find(&self.routes, method, path)
    }

    /// Exports the routes as a middleware layer.
    ///
    /// The layer works on a snapshot: routes added afterwards are not seen by it.
    pub fn middleware(&self, options: MiddlewareOptions) -> RouterLayer {
        let convention = if options.legacy.unwrap_or(self.options.legacy) {
            Convention::Legacy
        } else {
            Convention::Callback
        };
        self.layer(options.prefix.as_deref(), convention)
    }

    /// Like [`Router::middleware`], always using the legacy convention.
    pub fn legacy_middleware(&self, options: MiddlewareOptions) -> RouterLayer {
        self.layer(options.prefix.as_deref(), Convention::Legacy)
    }

    fn layer(&self, prefix: Option<&str>, convention: Convention) -> RouterLayer {
        let prefix = path::normalize_prefix(prefix.unwrap_or(&self.options.prefix));

        tracing::debug!(
            prefix = %prefix,
            ?convention,
            routes = self.routes.len(),
            "router mounted"
        );

        RouterLayer::new(self.routes.as_slice().into(), prefix, convention)
    }
}

/// A router with its verb shorthands loaded.
///
/// Dereferences to [`Router`], so everything else stays reachable. The one
/// exception is [`Router::options`]: on `Methods`, `options` registers an
/// `OPTIONS` route, so the accessor has to be called through the router.
///
/// ```rust
/// use switchyard::{Router, RouterOptions, handler};
///
/// let mut router = Router::with_options(RouterOptions::default().prefix("/api"));
/// let mut methods = router.load_methods();
/// methods
///     .options("/users", handler::from_fn(|ctx, next| next.run(ctx)))
///     .unwrap();
///
/// assert_eq!(Router::options(&methods).prefix, "/api");
/// assert_eq!((*methods).options().prefix, "/api");
/// assert_eq!(methods.routes().len(), 1);
/// ```
#[derive(Debug)]
pub struct Methods<'a> {
    router: &'a mut Router,
}

macro_rules! verbs {
    ($($(#[$doc:meta])* $name:ident => $method:literal;)*) => {
        impl Methods<'_> {
            $(
                $(#[$doc])*
                pub fn $name(
                    &mut self,
                    pattern: impl Into<Pattern>,
                    handlers: impl IntoHandlers,
                ) -> Result<&mut Self, Error> {
                    self.router.add_route($method, pattern, handlers)?;
                    Ok(self)
                }
            )*
        }
    };
}

verbs! {
    /// Registers a `GET` route.
    get => "GET";
    /// Registers a `POST` route.
    post => "POST";
    /// Registers a `PUT` route.
    put => "PUT";
    /// Registers a `PATCH` route.
    patch => "PATCH";
    /// Registers a `DELETE` route.
    delete => "DELETE";
    /// Alias for [`Methods::delete`].
    del => "DELETE";
    /// Registers a `HEAD` route.
    head => "HEAD";
    /// Registers an `OPTIONS` route. Shadows [`Router::options`].
    options => "OPTIONS";
    /// Registers a `TRACE` route.
    trace => "TRACE";
    /// Registers a `CONNECT` route.
    connect => "CONNECT";
    /// Registers a route for every verb.
    all => "ALL";
}

impl Deref for Methods<'_> {
    type Target = Router;

    fn deref(&self) -> &Router {
        self.router
    }
}

impl DerefMut for Methods<'_> {
    fn deref_mut(&mut self) -> &mut Router {
        self.router
    }
}
