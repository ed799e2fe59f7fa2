//! Outbound header composition.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};

use crate::config::ServiceIdentity;
use crate::context::{RequestContext, X_SERVICE_NAME, X_SERVICE_VERSION};

pub const APPLICATION_JSON: &str = "application/json";
pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Headers every outbound call carries: the context's forwarded headers plus
/// this service's identity and a JSON content type.
pub fn identity_headers(ctx: &RequestContext, identity: &ServiceIdentity) -> HeaderMap {
    let mut headers = ctx.forwarded_headers().clone();

    for (name, value) in [
        (X_SERVICE_NAME, identity.name.as_str()),
        (X_SERVICE_VERSION, identity.version.as_str()),
    ] {
        match HeaderValue::from_str(value) {
            Ok(v) => {
                headers.insert(HeaderName::from_static(name), v);
            }
            Err(_) => {
                tracing::warn!(header = name, value = %value, "Skipping invalid identity header")
            }
        }
    }
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers
}

/// Merge identity headers into the caller's headers.
///
/// Identity headers only fill names the caller did not set.
pub fn compose_headers(
    caller: Option<HeaderMap>,
    ctx: &RequestContext,
    identity: &ServiceIdentity,
) -> HeaderMap {
    let mut headers = caller.unwrap_or_default();
    for (name, value) in identity_headers(ctx, identity).iter() {
        if !headers.contains_key(name) {
            headers.insert(name.clone(), value.clone());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{X_REQUEST_ID, X_VISITOR_ID};

    fn identity() -> ServiceIdentity {
        ServiceIdentity {
            name: "orders".into(),
            version: "4.2.0".into(),
        }
    }

    #[test]
    fn test_identity_injected_when_absent() {
        let ctx = RequestContext::new("req-1");
        let headers = compose_headers(None, &ctx, &identity());

        assert_eq!(headers.get(X_SERVICE_NAME).unwrap(), "orders");
        assert_eq!(headers.get(X_SERVICE_VERSION).unwrap(), "4.2.0");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), APPLICATION_JSON);
        assert_eq!(headers.get(X_REQUEST_ID).unwrap(), "req-1");
    }

    #[test]
    fn test_caller_headers_win() {
        let ctx = RequestContext::new("req-1");
        let mut caller = HeaderMap::new();
        caller.insert(
            HeaderName::from_bytes(b"X-Service-Name").unwrap(),
            HeaderValue::from_static("impersonated"),
        );
        caller.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        caller.insert("x-request-id", HeaderValue::from_static("caller-id"));

        let headers = compose_headers(Some(caller), &ctx, &identity());

        assert_eq!(headers.get(X_SERVICE_NAME).unwrap(), "impersonated");
        assert_eq!(headers.get_all(X_SERVICE_NAME).iter().count(), 1);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(headers.get(X_REQUEST_ID).unwrap(), "caller-id");
        assert_eq!(headers.get(X_SERVICE_VERSION).unwrap(), "4.2.0");
    }

    #[test]
    fn test_forwarded_context_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-visitor-id", HeaderValue::from_static("v-77"));
        let ctx = RequestContext::from_headers(&inbound);

        let headers = compose_headers(None, &ctx, &identity());
        assert_eq!(headers.get(X_VISITOR_ID).unwrap(), "v-77");
    }
}
