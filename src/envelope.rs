//! Response envelope rendering.
//!
//! Peer services talk to each other with a common JSON envelope:
//! `{"is_success": bool, "status_code": int, "data" | "error": ..., "meta"?: ...}`.
//! This module renders both shapes and remaps status codes the same way on
//! every service so that envelopes stay comparable across hops.

use serde_json::{json, Map, Value};
use std::collections::HashMap;

use crate::error::{ErrorBody, ServiceError};

/// Status codes that are never surfaced verbatim to callers.
pub fn map_status_code(status_code: u16) -> u16 {
    match status_code {
        404 => 400,
        403 => 401,
        405 => 400,
        other => other,
    }
}

/// Build a success envelope around `data`.
pub fn success_envelope(data: Value, status_code: u16, meta: Option<Value>) -> Value {
    let mut body = Map::new();
    body.insert("data".into(), data);
    body.insert("is_success".into(), Value::Bool(true));
    body.insert("status_code".into(), json!(map_status_code(status_code)));
    if let Some(meta) = meta.filter(|m| !m.is_null()) {
        body.insert("meta".into(), meta);
    }
    Value::Object(body)
}

/// Build a failure envelope for `err`.
///
/// A plain-message error becomes `{"message": .., "errors": [..]}`; when the
/// error carries an `error_id` registered in `catalog`, the canned body
/// replaces the generated `{"message": ..}` entry. Structured errors are
/// emitted as-is.
pub fn error_envelope(err: &ServiceError, catalog: Option<&ErrorCatalog>) -> Value {
    let status_code = map_status_code(err.status_code());

    let error = match err.error() {
        ErrorBody::Structured(v) if v.is_object() => v.clone(),
        other => {
            let message = other.to_value();
            let canned = err
                .error_id()
                .and_then(|id| catalog.and_then(|c| c.get(id)))
                .cloned();
            let entry = canned.unwrap_or_else(|| json!({ "message": message }));
            json!({ "message": message, "errors": [entry] })
        }
    };

    let mut body = Map::new();
    body.insert("is_success".into(), Value::Bool(false));
    body.insert("status_code".into(), json!(status_code));
    body.insert("error".into(), error);
    if let Some(meta) = err.meta().filter(|m| !m.is_null()) {
        body.insert("meta".into(), meta.clone());
    }
    Value::Object(body)
}

/// Pre-registered canned error bodies, keyed by error id.
#[derive(Debug, Clone, Default)]
pub struct ErrorCatalog {
    entries: HashMap<String, Value>,
}

impl ErrorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned body under `error_id`, replacing any previous entry.
    pub fn register(&mut self, error_id: impl Into<String>, body: Value) {
        self.entries.insert(error_id.into(), body);
    }

    pub fn get(&self, error_id: &str) -> Option<&Value> {
        self.entries.get(error_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for ErrorCatalog {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status_code(404), 400);
        assert_eq!(map_status_code(403), 401);
        assert_eq!(map_status_code(405), 400);
        assert_eq!(map_status_code(200), 200);
        assert_eq!(map_status_code(500), 500);
    }

    #[test]
    fn test_success_envelope() {
        let body = success_envelope(json!({"id": 7}), 200, None);
        assert_eq!(
            body,
            json!({"data": {"id": 7}, "is_success": true, "status_code": 200})
        );

        let body = success_envelope(json!([]), 200, Some(json!({"total": 0})));
        assert_eq!(body["meta"], json!({"total": 0}));
    }

    #[test]
    fn test_error_envelope_message() {
        let err = ServiceError::not_found("user not found");
        let body = error_envelope(&err, None);
        assert_eq!(
            body,
            json!({
                "is_success": false,
                "status_code": 400,
                "error": {
                    "message": "user not found",
                    "errors": [{"message": "user not found"}]
                }
            })
        );
    }

    #[test]
    fn test_error_envelope_uses_catalog() {
        let mut catalog = ErrorCatalog::new();
        catalog.register("USER_MISSING", json!({"message": "No such user", "code": 17}));

        let err = ServiceError::bad_request("user missing").with_error_id("USER_MISSING");
        let body = error_envelope(&err, Some(&catalog));
        assert_eq!(body["error"]["errors"][0], json!({"message": "No such user", "code": 17}));
        assert_eq!(body["error"]["message"], json!("user missing"));
    }

    #[test]
    fn test_error_envelope_structured_passthrough() {
        let err = ServiceError::inter_service(json!({"message": "bad", "errors": []}), 422)
            .with_meta(Some(json!({"trace": "abc"})));
        let body = error_envelope(&err, None);
        assert_eq!(body["error"], json!({"message": "bad", "errors": []}));
        assert_eq!(body["status_code"], json!(422));
        assert_eq!(body["meta"], json!({"trace": "abc"}));
    }
}
