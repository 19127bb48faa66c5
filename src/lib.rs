//! Method-aware route registration and dispatch for Axum and Tower stacks.
//!
//! A [`Router`] collects `(method, pattern, handlers)` routes and exports
//! them as a Tower [`Layer`](tower::Layer). Mounted in a host stack, the
//! layer runs the first matching route's handler chain and passes every
//! other request through to the next service untouched.

mod context;
mod error;
pub mod handler;
mod middleware;
mod path;
mod route;
mod router;

#[cfg(test)]
mod tests;

pub use context::Context;
pub use error::Error;
pub use handler::{Handler, IntoHandlers, Next, Step};
pub use middleware::{Convention, MiddlewareOptions, RouterLayer, RouterService};
pub use path::{Matcher, Params, Pattern};
pub use route::{Match, MethodFilter, Route};
pub use router::{Methods, Router, RouterOptions};
