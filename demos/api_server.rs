//! Example mounting a switchyard router in front of ordinary Axum routes.
//!
//! Routing order:
//! 1. Router routes under `/api/*`
//! 2. Axum routes: `/health`
//! 3. Axum fallback: everything else
//!
//! To run this example:
//! ```bash
//! cargo run --example api_server
//! ```
//!
//! Test commands:
//! ```bash
//! # Router routes
//! curl http://localhost:3000/api/companies
//! curl http://localhost:3000/api/users/42
//! curl -X DELETE http://localhost:3000/api/users/42
//!
//! # Axum route
//! curl http://localhost:3000/health
//!
//! # Fallback
//! curl http://localhost:3000/anything/else
//! ```

use std::net::SocketAddr;

use axum::{http::StatusCode, routing::get};
use switchyard::{MiddlewareOptions, Router, RouterOptions, Step, handler};
use tokio::net::TcpListener;

fn api() -> Result<Router, switchyard::Error> {
    let mut api = Router::with_options(RouterOptions::default().prefix("/api"));

    api.add(
        "GET /companies",
        [
            handler::from_fn(|mut ctx, next| async move {
                ctx.set_body("Hello world!");
                next.run(ctx).await
            }),
            handler::legacy(|ctx| {
                let body = format!("{} Try /api/users/42", ctx.body_str().unwrap_or_default());
                ctx.set_body(body);
                Step::Next
            }),
        ],
    )?;

    api.load_methods()
        .get(
            "/users/:id",
            handler::from_fn(|mut ctx, next| async move {
                let body = format!("User {}", ctx.param("id").unwrap_or_default());
                ctx.set_body(body);
                next.run(ctx).await
            }),
        )?
        .del(
            "/users/:id",
            handler::legacy(|ctx| {
                ctx.set_status(StatusCode::NO_CONTENT);
                Step::Stop
            }),
        )?;

    Ok(api)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api = api()?;

    let app = axum::Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(|| async { StatusCode::NOT_FOUND })
        .layer(api.middleware(MiddlewareOptions::default()));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    println!("Server running on http://{}", addr);
    println!("Routes:");
    for route in api.routes() {
        println!("  {:<7} /api{}", route.method(), route.pattern());
    }
    println!("  GET     /health");
    println!("  *       -> Fallback");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
