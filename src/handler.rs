//! Route handlers and the continuation that links them.
//!
//! A route owns an ordered chain of [`Handler`]s. Each handler receives the
//! request [`Context`] and a [`Next`] continuation; running the continuation
//! invokes the following handler, and after the last one it falls through
//! to whatever the router was mounted in front of.
//!
//! Two calling conventions can be mixed freely inside one chain:
//!
//! - [`from_fn`]: an async function that owns the context and returns it,
//!   optionally awaiting `next.run(ctx)` in between.
//! - [`legacy`]: a synchronous single-step function that edits the context
//!   in place and answers with a [`Step`] telling the chain whether to
//!   yield to the continuation.

use std::{fmt, future::Future, sync::Arc};

use futures::{FutureExt, future::BoxFuture};

use crate::Context;

type CallbackFn = dyn Fn(Context, Next) -> BoxFuture<'static, Context> + Send + Sync;
type LegacyFn = dyn Fn(&mut Context) -> Step + Send + Sync;

/// What runs once the whole chain has yielded.
pub(crate) type Terminal = Box<dyn FnOnce(Context) -> BoxFuture<'static, Context> + Send>;

/// One link of a route's handler chain.
#[derive(Clone)]
pub struct Handler {
    kind: Kind,
}

#[derive(Clone)]
enum Kind {
    Callback(Arc<CallbackFn>),
    Legacy(Arc<LegacyFn>),
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Kind::Callback(_) => f.write_str("Handler::Callback"),
            Kind::Legacy(_) => f.write_str("Handler::Legacy"),
        }
    }
}

impl Handler {
    /// Whether this handler uses the single-step legacy convention.
    pub fn is_legacy(&self) -> bool {
        matches!(self.kind, Kind::Legacy(_))
    }

    fn call(&self, ctx: Context, next: Next) -> BoxFuture<'static, Context> {
        match &self.kind {
            Kind::Callback(f) => f(ctx, next),
            Kind::Legacy(f) => {
                let mut ctx = ctx;
                match f(&mut ctx) {
                    Step::Next => next.run(ctx).boxed(),
                    Step::Stop => futures::future::ready(ctx).boxed(),
                    Step::Then(resume) => async move {
                        let mut ctx = next.run(ctx).await;
                        resume(&mut ctx);
                        ctx
                    }
                    .boxed(),
                }
            }
        }
    }
}

/// Wraps an async function as a callback-style handler.
///
/// ```rust
/// use switchyard::handler;
///
/// let greet = handler::from_fn(|mut ctx, next| async move {
///     ctx.set_body("Hello world!");
///     next.run(ctx).await
/// });
/// assert!(!greet.is_legacy());
/// ```
pub fn from_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Context> + Send + 'static,
{
    let f = move |ctx: Context, next: Next| -> BoxFuture<'static, Context> { f(ctx, next).boxed() };
    Handler {
        kind: Kind::Callback(Arc::new(f)),
    }
}

/// Wraps a single-step function as a legacy handler.
///
/// The function runs up to its only suspension point and says what happens
/// there through the returned [`Step`].
///
/// ```rust
/// use switchyard::{Step, handler};
///
/// let append = handler::legacy(|ctx| {
///     let body = format!("{} and more", ctx.body_str().unwrap_or_default());
///     ctx.set_body(body);
///     Step::Next
/// });
/// assert!(append.is_legacy());
/// ```
pub fn legacy<F>(f: F) -> Handler
where
    F: Fn(&mut Context) -> Step + Send + Sync + 'static,
{
    Handler {
        kind: Kind::Legacy(Arc::new(f)),
    }
}

/// The outcome of a legacy handler's single step.
pub enum Step {
    /// Yield to the continuation.
    Next,
    /// Finish without yielding; the rest of the chain is skipped.
    Stop,
    /// Yield to the continuation, then resume with the given function.
    ///
    /// The function runs once the rest of the chain and the host stack have
    /// answered, so [`Context::downstream`] is set by then under either
    /// convention.
    Then(Box<dyn FnOnce(&mut Context) + Send>),
}

impl Step {
    /// Shorthand for `Step::Then(Box::new(resume))`.
    pub fn then<F>(resume: F) -> Self
    where
        F: FnOnce(&mut Context) + Send + 'static,
    {
        Step::Then(Box::new(resume))
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Next => f.write_str("Step::Next"),
            Step::Stop => f.write_str("Step::Stop"),
            Step::Then(_) => f.write_str("Step::Then(..)"),
        }
    }
}

/// The continuation handed to each handler.
///
/// Running it invokes the next handler of the chain, or falls through to
/// the rest of the host stack after the last one. It can run at most once.
pub struct Next {
    chain: Arc<[Handler]>,
    index: usize,
    terminal: Terminal,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Handler]>, terminal: Terminal) -> Self {
        Next {
            chain,
            index: 0,
            terminal,
        }
    }

    /// Runs the rest of the chain and returns the context it hands back.
    pub async fn run(self, ctx: Context) -> Context {
        let Next {
            chain,
            index,
            terminal,
        } = self;

        match chain.get(index).cloned() {
            Some(handler) => {
                let next = Next {
                    chain,
                    index: index + 1,
                    terminal,
                };
                handler.call(ctx, next).await
            }
            None => terminal(ctx).await,
        }
    }
}

/// Anything that can be turned into a route's handler chain.
pub trait IntoHandlers {
    /// Converts `self` into handlers, in calling order.
    fn into_handlers(self) -> Vec<Handler>;
}

impl IntoHandlers for Handler {
    fn into_handlers(self) -> Vec<Handler> {
        vec![self]
    }
}

impl IntoHandlers for Vec<Handler> {
    fn into_handlers(self) -> Vec<Handler> {
        self
    }
}

impl<const N: usize> IntoHandlers for [Handler; N] {
    fn into_handlers(self) -> Vec<Handler> {
        self.into()
    }
}
