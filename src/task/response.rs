//! Uniform result of a successful downstream call.

use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Normalized downstream response. Only produced by the response parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AsyncTaskResponse {
    data: Value,
    meta: Option<Value>,
    status: u16,
    headers: HashMap<String, String>,
}

impl AsyncTaskResponse {
    pub(crate) fn new(
        data: Value,
        meta: Option<Value>,
        status: u16,
        headers: HashMap<String, String>,
    ) -> Self {
        Self {
            data,
            meta,
            status,
            headers,
        }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn into_data(self) -> Value {
        self.data
    }

    pub fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Response headers the caller asked to surface. Empty unless requested.
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Render as the success envelope handlers return to their own callers.
    pub fn to_envelope(&self) -> Value {
        json!({
            "data": self.data,
            "meta": self.meta,
            "headers": self.headers,
            "partial_complete": false,
            "is_success": true,
        })
    }
}
