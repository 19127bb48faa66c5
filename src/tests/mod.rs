mod rejection;
mod response;

use std::{
    convert::Infallible,
    future::{Ready, ready},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    task::{Context as TaskContext, Poll},
};

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::Response,
};
use tower::Service;

/// Stands in for whatever the router is mounted in front of.
#[derive(Clone)]
pub(super) struct Downstream {
    calls: Arc<AtomicUsize>,
    status: StatusCode,
}

impl Downstream {
    /// A downstream that handles nothing.
    pub(super) fn unhandled() -> Self {
        Self::answering(StatusCode::NOT_FOUND)
    }

    pub(super) fn answering(status: StatusCode) -> Self {
        Downstream {
            calls: Arc::new(AtomicUsize::new(0)),
            status,
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Service<Request> for Downstream {
    type Response = Response;
    type Error = Infallible;
    type Future = Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _cx: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: Request) -> Self::Future {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = if self.status == StatusCode::NOT_FOUND {
            Body::empty()
        } else {
            Body::from("downstream")
        };
        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        ready(Ok(response))
    }
}

pub(super) fn request(method: &str, uri: &str) -> Request {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub(super) async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
