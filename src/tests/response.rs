use axum::http::{HeaderValue, StatusCode, header::CONTENT_TYPE};

use super::{Downstream, body_string, request};
use crate::{Context, Params};

fn context() -> Context {
    Context::new(request("GET", "/hello"), Params::new())
}

#[tokio::test]
async fn test_untouched_context_is_not_found() {
    let ctx = context();
    assert_eq!(ctx.status(), StatusCode::NOT_FOUND);

    let response = ctx.into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn test_body_implies_ok() {
    let mut ctx = context();
    ctx.set_body("Hello World!");
    assert_eq!(ctx.status(), StatusCode::OK);

    let response = ctx.into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_string(response).await, "Hello World!");
}

#[tokio::test]
async fn test_explicit_status_without_body() {
    let mut ctx = context();
    ctx.set_status(StatusCode::NO_CONTENT);

    let response = ctx.into_response();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(CONTENT_TYPE).is_none());
}

#[tokio::test]
async fn test_binary_body_content_type() {
    let mut ctx = context();
    ctx.set_body(vec![0xffu8, 0xfe, 0x00]);

    assert_eq!(ctx.body_str(), None);
    let response = ctx.into_response();

    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
}

#[tokio::test]
async fn test_response_headers_are_kept() {
    let mut ctx = context();
    ctx.set_body("{}");
    ctx.response_headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    ctx.response_headers_mut()
        .insert("x-rate-limit", HeaderValue::from_static("100"));

    let response = ctx.into_response();

    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(response.headers().get("x-rate-limit").unwrap(), "100");
}

#[tokio::test]
async fn test_handled_downstream_wins() {
    let downstream = Downstream::answering(StatusCode::CREATED);
    let mut ctx = context();
    ctx.set_body("from route");
    ctx.response_headers_mut()
        .insert("x-route", HeaderValue::from_static("yes"));

    let ctx = ctx.forward(downstream.clone()).await;
    assert_eq!(ctx.downstream().unwrap().status(), StatusCode::CREATED);
    let response = ctx.into_response();

    assert_eq!(downstream.calls(), 1);
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("x-route").unwrap(), "yes");
    assert_eq!(body_string(response).await, "downstream");
}

#[tokio::test]
async fn test_body_written_after_forward_replaces_downstream() {
    let mut ctx = context();
    ctx.set_body("before");

    let mut ctx = ctx.forward(Downstream::answering(StatusCode::OK)).await;
    ctx.set_body("after");
    let response = ctx.into_response();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
    assert_eq!(body_string(response).await, "after");
}

#[tokio::test]
async fn test_status_written_before_forward_is_replaced() {
    let mut ctx = context();
    ctx.set_status(StatusCode::ACCEPTED);

    let response = ctx
        .forward(Downstream::answering(StatusCode::CONFLICT))
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_string(response).await, "downstream");
}

#[tokio::test]
async fn test_unhandled_downstream_keeps_route_body() {
    let downstream = Downstream::unhandled();
    let mut ctx = context();
    ctx.set_body("from route");

    let response = ctx.forward(downstream.clone()).await.into_response();

    assert_eq!(downstream.calls(), 1);
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "from route");
}

#[tokio::test]
async fn test_unhandled_downstream_without_body_is_not_found() {
    let response = context()
        .forward(Downstream::unhandled())
        .await
        .into_response();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_accessors() {
    let mut params = Params::new();
    params.insert("id", "7");
    let mut ctx = Context::new(request("PATCH", "/items/7?full=true"), params);

    assert_eq!(ctx.method(), "PATCH");
    assert_eq!(ctx.path(), "/items/7");
    assert_eq!(ctx.uri().query(), Some("full=true"));
    assert_eq!(ctx.param("id"), Some("7"));
    assert_eq!(
        ctx.extensions().get::<Params>().and_then(|p| p.get("id")),
        Some("7")
    );

    let body = axum::body::to_bytes(ctx.take_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}
