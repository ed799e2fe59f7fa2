//! Downstream response parsing.
//!
//! # Responsibilities
//! - Turn a decoded payload + status + headers into an [`AsyncTaskResponse`]
//! - Turn a downstream failure into an inter-service [`ServiceError`] carrying
//!   the downstream's own status, error payload, machine code and meta
//! - Surface only the response headers the caller allow-listed
//!
//! # Payload Shapes
//! ```text
//! Envelope         {"is_success", "status_code", "data" | "error" | "errors", "meta"?}
//! EnvelopeErrors   same, failures always read "errors"
//! EnvelopeMessage  same success shape, failures read "message" | "error" + "code",
//!                  a missing "is_success" counts as failure
//! HttpStatus       plain JSON body, success iff HTTP 200,
//!                  failures read "message" | "error" + "code"
//! ```
//!
//! # Design Decisions
//! - The set of shapes is small and known: a closed enum chosen per
//!   downstream at construction time, not a trait object
//! - Failures are expected traffic, so they are logged at DEBUG only
//! - Headers are never forwarded implicitly

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::error::{ServiceError, ServiceResult};
use crate::task::AsyncTaskResponse;

const MALFORMED: &str = "Malformed downstream response";

/// Payload shape a downstream answers with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    #[default]
    Envelope,
    EnvelopeErrors,
    EnvelopeMessage,
    HttpStatus,
}

impl ParserKind {
    /// Parse one downstream response.
    pub fn parse(
        self,
        payload: Value,
        status_code: u16,
        headers: &HeaderMap,
        response_headers: Option<&[String]>,
    ) -> ServiceResult<AsyncTaskResponse> {
        match self {
            ParserKind::Envelope | ParserKind::EnvelopeErrors | ParserKind::EnvelopeMessage => {
                self.parse_envelope(payload, status_code, headers, response_headers)
            }
            ParserKind::HttpStatus => {
                parse_http_status(payload, status_code, headers, response_headers)
            }
        }
    }

    fn parse_envelope(
        self,
        payload: Value,
        status_code: u16,
        headers: &HeaderMap,
        response_headers: Option<&[String]>,
    ) -> ServiceResult<AsyncTaskResponse> {
        let Value::Object(mut body) = payload else {
            return Err(malformed(status_code));
        };

        let is_success = match (self, body.get("is_success").and_then(Value::as_bool)) {
            (_, Some(flag)) => flag,
            (ParserKind::EnvelopeMessage, None) => false,
            (_, None) => return Err(malformed(status_code)),
        };

        let envelope_status = body
            .get("status_code")
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
            .unwrap_or(status_code);
        let meta = take_non_null(&mut body, "meta");

        if is_success {
            let data = body.remove("data").unwrap_or(Value::Null);
            let headers = project_headers(headers, response_headers);
            return Ok(AsyncTaskResponse::new(data, meta, envelope_status, headers));
        }

        let failure = match self {
            ParserKind::EnvelopeErrors => {
                let error = body.remove("errors").unwrap_or(Value::Null);
                ServiceError::inter_service(error, envelope_status)
            }
            ParserKind::EnvelopeMessage => {
                let error = first_truthy(&mut body, &["message", "error"]);
                ServiceError::inter_service(error, status_code)
                    .with_code(take_non_null(&mut body, "code"))
            }
            _ => {
                let error = first_truthy(&mut body, &["error", "errors"]);
                ServiceError::inter_service(error, envelope_status)
            }
        };
        Err(log_failure(failure.with_meta(meta)))
    }
}

fn parse_http_status(
    payload: Value,
    status_code: u16,
    headers: &HeaderMap,
    response_headers: Option<&[String]>,
) -> ServiceResult<AsyncTaskResponse> {
    if status_code == 200 {
        let meta = payload.get("meta").filter(|m| !m.is_null()).cloned();
        let headers = project_headers(headers, response_headers);
        return Ok(AsyncTaskResponse::new(payload, meta, status_code, headers));
    }

    let failure = match payload {
        Value::Object(mut body) => {
            let error = first_truthy(&mut body, &["message", "error"]);
            ServiceError::inter_service(error, status_code)
                .with_code(take_non_null(&mut body, "code"))
                .with_meta(take_non_null(&mut body, "meta"))
        }
        other => ServiceError::inter_service(other, status_code),
    };
    Err(log_failure(failure))
}

/// Restrict response headers to the caller's allow-list.
///
/// Allow-listed names the response does not carry are left out.
pub fn project_headers(
    headers: &HeaderMap,
    response_headers: Option<&[String]>,
) -> HashMap<String, String> {
    let mut projected = HashMap::new();
    let Some(allow) = response_headers else {
        return projected;
    };
    if headers.is_empty() {
        return projected;
    }

    for name in allow {
        if let Some(value) = headers.get(name.as_str()).and_then(|v| v.to_str().ok()) {
            projected.insert(name.clone(), value.to_string());
        }
    }
    projected
}

fn malformed(status_code: u16) -> ServiceError {
    log_failure(ServiceError::inter_service(MALFORMED, status_code))
}

fn log_failure(err: ServiceError) -> ServiceError {
    tracing::debug!(
        status_code = err.status_code(),
        error = %err.error(),
        code = ?err.code(),
        "Downstream returned failure"
    );
    err
}

fn take_non_null(body: &mut Map<String, Value>, key: &str) -> Option<Value> {
    body.remove(key).filter(|v| !v.is_null())
}

/// First value among `keys` that is not empty/false/null; otherwise the last one.
fn first_truthy(body: &mut Map<String, Value>, keys: &[&str]) -> Value {
    for key in keys {
        if body.get(*key).is_some_and(is_truthy) {
            return body.remove(*key).unwrap_or(Value::Null);
        }
    }
    keys.last()
        .and_then(|key| body.remove(*key))
        .unwrap_or(Value::Null)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
