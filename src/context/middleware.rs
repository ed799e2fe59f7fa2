//! Inbound context middleware.
//! Builds the request context before the handler runs.

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use std::sync::Arc;
use tracing::Instrument;

use crate::context::RequestContext;

/// Attach an `Arc<RequestContext>` to the request extensions and run the
/// handler inside a `request` span carrying the request id.
pub async fn propagate_context(mut req: Request<Body>, next: Next) -> Response {
    let ctx = Arc::new(RequestContext::from_headers(req.headers()));
    req.extensions_mut().insert(ctx.clone());

    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        method = %req.method(),
        path = %req.uri().path(),
    );

    let response = next.run(req).instrument(span).await;

    tracing::debug!(
        request_id = %ctx.request_id(),
        status = response.status().as_u16(),
        response_time_ms = ctx.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}
