use std::{
    convert::Infallible,
    pin::Pin,
    sync::Arc,
    task::{Context as TaskContext, Poll},
};

use axum::{extract::Request, response::Response};
use futures::{Future, FutureExt};
use serde::Deserialize;
use tower::{Layer, Service, ServiceExt};

use crate::{
    Context,
    handler::{Next, Terminal},
    path,
    route::{self, Match, Route},
};

/// Options accepted by [`Router::middleware`](crate::Router::middleware).
///
/// Unset fields fall back to the router's own [`RouterOptions`](crate::RouterOptions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MiddlewareOptions {
    pub prefix: Option<String>,
    pub legacy: Option<bool>,
}

impl MiddlewareOptions {
    /// Options that inherit everything from the router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts the layer under `prefix` instead of the router's own.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Overrides the router's choice of convention.
    pub fn legacy(mut self, legacy: bool) -> Self {
        self.legacy = Some(legacy);
        self
    }
}

/// How a mounted router hands control back to the host chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convention {
    /// The continuation after the last handler forwards to the wrapped
    /// service. A chain that never runs its continuation ends the request.
    Callback,
    /// The router yields to the wrapped service exactly once: where the
    /// chain runs its final continuation, or after the chain returns when
    /// it stopped early.
    Legacy,
}

#[derive(Debug)]
struct Table {
    routes: Arc<[Route]>,
    prefix: String,
    convention: Convention,
}

/// A Tower layer that dispatches requests through a router's routes.
///
/// Requests that match no route are handed to the wrapped service untouched,
/// so whatever is mounted after the router decides what a miss looks like.
///
/// # Example
///
/// ```rust
/// use switchyard::{Convention, MiddlewareOptions, Router, handler};
///
/// let mut router = Router::new();
/// router
///     .add("GET /health", handler::from_fn(|mut ctx, next| async move {
///         ctx.set_body("ok");
///         next.run(ctx).await
///     }))
///     .unwrap();
///
/// let layer = router.middleware(MiddlewareOptions::new().prefix("/internal/"));
/// assert_eq!(layer.convention(), Convention::Callback);
/// assert_eq!(layer.prefix(), "/internal");
/// assert_eq!(layer.routes().len(), 1);
///
/// let app: axum::Router = axum::Router::new().layer(layer);
/// # drop(app);
/// ```
#[derive(Debug, Clone)]
pub struct RouterLayer {
    table: Arc<Table>,
}

impl RouterLayer {
    pub(crate) fn new(routes: Arc<[Route]>, prefix: String, convention: Convention) -> Self {
        RouterLayer {
            table: Arc::new(Table {
                routes,
                prefix,
                convention,
            }),
        }
    }

    /// The convention this layer dispatches with.
    pub fn convention(&self) -> Convention {
        self.table.convention
    }

    /// Whether this layer uses the legacy single-step convention.
    pub fn is_legacy(&self) -> bool {
        self.table.convention == Convention::Legacy
    }

    /// The normalized mount prefix; empty when mounted at the root.
    pub fn prefix(&self) -> &str {
        &self.table.prefix
    }

    /// The routes this layer dispatches to, snapshotted when it was created.
    pub fn routes(&self) -> &[Route] {
        &self.table.routes
    }
}

impl<S> Layer<S> for RouterLayer {
    type Service = RouterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RouterService {
            inner,
            table: Arc::clone(&self.table),
        }
    }
}

/// The service produced by [`RouterLayer`].
#[derive(Debug, Clone)]
pub struct RouterService<S> {
    inner: S,
    table: Arc<Table>,
}

impl<S> Service<Request> for RouterService<S>
where
    S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let inner = self.inner.clone();
        let table = Arc::clone(&self.table);

        Box::pin(async move { Ok(table.dispatch(req, inner).await) })
    }
}

impl Table {
    async fn dispatch<S>(&self, req: Request, inner: S) -> Response
    where
        S: Service<Request, Response = Response, Error = Infallible> + Clone + Send + 'static,
        S::Future: Send + 'static,
    {
        let method = req.method().clone();
        let found = path::strip_prefix(&self.prefix, req.uri().path())
            .and_then(|path| route::find(&self.routes, &method, path));

        let Some(Match { route, params }) = found else {
            tracing::trace!(%method, path = req.uri().path(), "no route matched");
            return match inner.oneshot(req).await {
                Ok(response) => response,
                Err(never) => match never {},
            };
        };

        tracing::trace!(
            %method,
            path = req.uri().path(),
            pattern = %route.pattern(),
            "route matched"
        );

        let chain = route.chain();
        let ctx = Context::new(req, params);

        let ctx = match self.convention {
            Convention::Callback => {
                let terminal: Terminal = Box::new(move |ctx| ctx.forward(inner).boxed());
                Next::new(chain, terminal).run(ctx).await
            }
            Convention::Legacy => {
                let downstream = inner.clone();
                let terminal: Terminal = Box::new(move |ctx| ctx.forward(downstream).boxed());
                let ctx = Next::new(chain, terminal).run(ctx).await;
                if ctx.is_forwarded() {
                    ctx
                } else {
                    ctx.forward(inner).await
                }
            }
        };

        ctx.into_response()
    }
}
