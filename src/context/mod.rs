//! Per-request correlation context.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → middleware.rs (build RequestContext, attach to request extensions)
//!     → handler extracts Arc<RequestContext>
//!     → passed explicitly to every DownstreamClient call
//!     → compose::headers forwards correlation headers downstream
//! ```
//!
//! # Design Decisions
//! - Context is an explicit, immutable value threaded through calls; there is
//!   no ambient global lookup
//! - Shared as `Arc<RequestContext>` so concurrent tasks of one request can
//!   hold it without copying, while unrelated requests never share one
//! - Values are read, never invented: absent inbound headers forward as empty

pub mod middleware;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};

pub use middleware::propagate_context;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_VISITOR_ID: &str = "x-visitor-id";
pub const X_SOURCE_IP: &str = "x-source-ip";
pub const X_SOURCE_USER_AGENT: &str = "x-source-user-agent";
pub const X_SOURCE_REFERER: &str = "x-source-referer";
pub const X_SERVICE_NAME: &str = "x-service-name";
pub const X_SERVICE_VERSION: &str = "x-service-version";
pub const X_SHARED_CONTEXT: &str = "x-shared-context";

/// Inbound headers copied verbatim into the forwarded set.
const FORWARDED_HEADERS: [&str; 4] = [
    X_VISITOR_ID,
    X_SOURCE_IP,
    X_SOURCE_USER_AGENT,
    X_SOURCE_REFERER,
];

/// Correlation data for one logical request or background task.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    user_agent: Option<String>,
    shared_context: Option<String>,
    forwarded: HeaderMap,
    values: HashMap<String, String>,
    started_at: Instant,
}

impl RequestContext {
    /// Create a context with the given request id and nothing to forward but the id.
    pub fn new(request_id: impl Into<String>) -> Self {
        let request_id = request_id.into();
        let mut forwarded = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            forwarded.insert(HeaderName::from_static(X_REQUEST_ID), value);
        }

        Self {
            request_id,
            user_agent: None,
            shared_context: None,
            forwarded,
            values: HashMap::new(),
            started_at: Instant::now(),
        }
    }

    /// Context for work not tied to an inbound request.
    pub fn background() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    /// Build the context from inbound request headers.
    ///
    /// The request id is reused when the caller sent one, otherwise a UUID v4
    /// is generated.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = header_str(headers, X_REQUEST_ID)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut ctx = Self::new(request_id);
        for name in FORWARDED_HEADERS {
            let value = headers
                .get(name)
                .cloned()
                .unwrap_or_else(|| HeaderValue::from_static(""));
            ctx.forwarded.insert(HeaderName::from_static(name), value);
        }
        ctx.user_agent = header_str(headers, USER_AGENT.as_str()).map(str::to_string);
        ctx.shared_context = header_str(headers, X_SHARED_CONTEXT).map(str::to_string);
        ctx
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// The inbound caller's `user-agent`.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Headers every outbound call made on behalf of this context carries.
    pub fn forwarded_headers(&self) -> &HeaderMap {
        &self.forwarded
    }

    /// Store an arbitrary value. Keys are case-insensitive.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_lowercase(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&key.to_lowercase()).map(String::as_str)
    }

    /// Time since the context was created.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// The `user_context` object carried in the `X-SHARED-CONTEXT` header.
    pub fn user_from_shared_context(&self) -> ServiceResult<Value> {
        self.shared_context
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
            .and_then(|mut v| v.get_mut("user_context").map(Value::take))
            .filter(|user| !user.is_null())
            .ok_or_else(|| {
                ServiceError::forbidden(serde_json::json!({ "message": "Invalid Auth Headers" }))
            })
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
