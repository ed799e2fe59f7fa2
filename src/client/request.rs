//! Per-call request parameters.

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;
use std::time::Duration;

use crate::compose::{QueryParams, QueryValue};
use crate::error::{ServiceError, ServiceResult};

/// Outbound request body.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Serialized as JSON. Under multipart only a string is accepted, sent as-is.
    Json(Value),
    /// Sent unencoded.
    Raw(Vec<u8>),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Bytes to put on the wire.
    ///
    /// Multipart bodies are never encoded: a `Raw` body or a JSON string is
    /// sent unchanged, and any other JSON value is rejected.
    pub(crate) fn into_bytes(self, multipart: bool) -> ServiceResult<Option<Vec<u8>>> {
        match self {
            RequestBody::Empty | RequestBody::Json(Value::Null) => Ok(None),
            RequestBody::Raw(bytes) => Ok(Some(bytes)),
            RequestBody::Json(Value::String(s)) if multipart => Ok(Some(s.into_bytes())),
            RequestBody::Json(_) if multipart => Err(ServiceError::bad_request(
                "Multipart body must be raw bytes or a string",
            )),
            RequestBody::Json(value) => Ok(Some(value.to_string().into_bytes())),
        }
    }
}

/// Everything one downstream call needs besides the client itself.
#[derive(Debug, Clone)]
pub struct RequestParams {
    pub method: Method,
    pub path: String,
    pub body: RequestBody,
    pub query: QueryParams,
    /// Overrides the downstream's default timeout.
    pub timeout: Option<Duration>,
    pub headers: Option<HeaderMap>,
    pub multipart: bool,
    /// Response headers to surface on the result.
    pub response_headers: Option<Vec<String>>,
    /// Rewrap the raw payload as a success envelope before parsing.
    pub purge_response_keys: bool,
}

impl RequestParams {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            query: QueryParams::new(),
            timeout: None,
            headers: None,
            multipart: false,
            response_headers: None,
            purge_response_keys: false,
        }
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn raw(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    pub fn query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Add one query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.query.push(key, value);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn multipart(mut self) -> Self {
        self.multipart = true;
        self
    }

    pub fn response_headers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.response_headers = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn purge_response_keys(mut self) -> Self {
        self.purge_response_keys = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_builder() {
        let params = RequestParams::new(Method::POST, "/v1/orders")
            .json(json!({"sku": "A1"}))
            .param("dry_run", true)
            .timeout(Duration::from_secs(5))
            .response_headers(["x-total-count"]);

        assert_eq!(params.method, Method::POST);
        assert_eq!(params.query.len(), 1);
        assert_eq!(params.timeout, Some(Duration::from_secs(5)));
        assert_eq!(params.response_headers, Some(vec!["x-total-count".to_string()]));
        assert!(!params.multipart);
    }

    #[test]
    fn test_body_encoding() {
        let json_body = RequestBody::Json(json!({"a": 1}));
        assert_eq!(json_body.into_bytes(false).unwrap(), Some(br#"{"a":1}"#.to_vec()));

        let form = RequestBody::Json(json!("--boundary\r\nraw"));
        assert_eq!(form.into_bytes(true).unwrap(), Some(b"--boundary\r\nraw".to_vec()));

        assert_eq!(RequestBody::Empty.into_bytes(false).unwrap(), None);
        assert_eq!(RequestBody::Raw(vec![1, 2]).into_bytes(true).unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_multipart_rejects_structured_json() {
        let err = RequestBody::Json(json!({"file": "abc"}))
            .into_bytes(true)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.status_code(), 400);
    }
}
