use std::convert::Infallible;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::Request,
    http::{
        Extensions, HeaderMap, HeaderValue, Method, StatusCode, Uri, header::CONTENT_TYPE,
        request::Parts,
    },
    response::Response,
};
use tower::{Service, ServiceExt};

use crate::path::Params;

/// Per-request state shared by the handlers of a matched route.
///
/// A `Context` owns the incoming request for the duration of one dispatch
/// and accumulates the response the handlers build. Setting a body without
/// an explicit status answers `200 OK`; a context nobody wrote to answers
/// `404 Not Found`.
///
/// Once the continuation has reached the rest of the host stack, the later
/// write wins: a status or body set after `next.run(ctx).await` returns
/// replaces the downstream's, while the downstream's answer replaces
/// anything the handlers wrote before yielding.
///
/// # Example
///
/// ```rust
/// use switchyard::handler;
///
/// let shout = handler::from_fn(|ctx, next| async move {
///     let mut ctx = next.run(ctx).await;
///     let loud = ctx.body_str().map(str::to_uppercase);
///     if let Some(loud) = loud {
///         ctx.set_body(loud);
///     }
///     ctx
/// });
/// # drop(shout);
/// ```
pub struct Context {
    parts: Parts,
    body: Option<Body>,
    params: Params,
    status: Option<StatusCode>,
    headers: HeaderMap,
    response_body: Option<Bytes>,
    downstream: Option<Response>,
    revision: u64,
    status_revision: u64,
    body_revision: u64,
    forwarded_at: Option<u64>,
}

impl Context {
    pub(crate) fn new(request: Request, params: Params) -> Self {
        let (mut parts, body) = request.into_parts();
        parts.extensions.insert(params.clone());

        Context {
            parts,
            body: Some(body),
            params,
            status: None,
            headers: HeaderMap::new(),
            response_body: None,
            downstream: None,
            revision: 0,
            status_revision: 0,
            body_revision: 0,
            forwarded_at: None,
        }
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// The request URI, including the query string.
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// The full request path, before any mount prefix was stripped.
    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// The request extensions. The matched [`Params`] are always present.
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Mutable request extensions; the downstream service receives them as-is.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// The parameters captured by the matched route's pattern.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Shorthand for `self.params().get(name)`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Takes the request body. Later calls, and the downstream service, see an empty body.
    pub fn take_body(&mut self) -> Body {
        self.body.take().unwrap_or_else(Body::empty)
    }

    /// The status the context would answer with if nobody downstream handles the request.
    pub fn status(&self) -> StatusCode {
        match (self.status, &self.response_body) {
            (Some(status), _) => status,
            (None, Some(_)) => StatusCode::OK,
            (None, None) => StatusCode::NOT_FOUND,
        }
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.revision += 1;
        self.status_revision = self.revision;
        self.status = Some(status);
    }

    /// The response body written by the handlers, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.response_body.as_ref()
    }

    /// The response body as text, when one is set and is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        self.response_body
            .as_ref()
            .and_then(|body| std::str::from_utf8(body).ok())
    }

    /// Sets the response body. Text bodies are sent as `text/plain`.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.revision += 1;
        self.body_revision = self.revision;
        self.response_body = Some(body.into());
    }

    /// Response headers. They are added on top of whichever response wins.
    pub fn response_headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable response headers.
    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The response produced by the rest of the host chain, once it has run.
    pub fn downstream(&self) -> Option<&Response> {
        self.downstream.as_ref()
    }

    /// Whether the request has already been handed to the wrapped service.
    pub(crate) fn is_forwarded(&self) -> bool {
        self.forwarded_at.is_some()
    }

    /// Hands the request to the wrapped service and records its response.
    pub(crate) async fn forward<S>(mut self, inner: S) -> Context
    where
        S: Service<Request, Response = Response, Error = Infallible>,
    {
        let request = Request::from_parts(self.parts.clone(), self.take_body());
        let response = match inner.oneshot(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        };
        self.downstream = Some(response);
        self.forwarded_at = Some(self.revision);
        self
    }

    /// Resolves the final response.
    ///
    /// A handled downstream response is the base, with any status or body
    /// the handlers wrote after it returned laid on top. A downstream that
    /// answered an empty `404` counts as unhandled and yields to whatever
    /// the handlers wrote. A context nobody wrote to falls back to the
    /// downstream `404` (or an empty one).
    pub fn into_response(self) -> Response {
        let written_after = |revision: u64| self.forwarded_at.is_some_and(|at| revision > at);
        let status_after = self.status.filter(|_| written_after(self.status_revision));
        let body_after = written_after(self.body_revision);

        let Context {
            status,
            headers,
            response_body,
            downstream,
            ..
        } = self;

        match downstream {
            Some(response) if !is_unhandled(&response) => {
                let (mut parts, body) = response.into_parts();
                if let Some(status) = status_after {
                    parts.status = status;
                }
                let body = match response_body {
                    Some(bytes) if body_after => {
                        parts.headers.insert(CONTENT_TYPE, content_type(&bytes));
                        Body::from(bytes)
                    }
                    _ => body,
                };
                parts.headers.extend(headers);
                Response::from_parts(parts, body)
            }
            _ if status.is_some() || response_body.is_some() => {
                let content_type = response_body.as_ref().map(content_type);

                let mut response =
                    Response::new(response_body.map_or_else(Body::empty, Body::from));
                *response.status_mut() = status.unwrap_or(StatusCode::OK);
                if let Some(content_type) = content_type {
                    response.headers_mut().insert(CONTENT_TYPE, content_type);
                }
                response.headers_mut().extend(headers);
                response
            }
            Some(response) => response,
            None => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::NOT_FOUND;
                response
            }
        }
    }
}

/// An empty `404` is what a host answers when nothing handled the request.
fn is_unhandled(response: &Response) -> bool {
    response.status() == StatusCode::NOT_FOUND && response.body().size_hint().exact() == Some(0)
}

fn content_type(body: &Bytes) -> HeaderValue {
    if std::str::from_utf8(body).is_ok() {
        HeaderValue::from_static("text/plain; charset=utf-8")
    } else {
        HeaderValue::from_static("application/octet-stream")
    }
}
