//! Span hooks for outbound calls.

use reqwest::Method;
use tracing::Span;
use url::Url;

/// Span wrapping one outbound call. Query and fragment never reach the span.
pub fn outbound_span(downstream: &str, method: &Method, url: &Url, request_id: &str) -> Span {
    tracing::info_span!(
        "outbound",
        downstream = %downstream,
        method = %method,
        url = %sanitized_url(url),
        request_id = %request_id,
    )
}

pub fn sanitized_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.to_string()
}
