//! Typed failures surfaced by the communication core.
//!
//! # Responsibilities
//! - One error type for every failure a handler can see: local validation,
//!   downstream failures, transport failures and executor misconfiguration
//! - Carry enough of the downstream's own answer (status, error payload,
//!   machine code, meta) for the caller to re-map it outward
//! - Decide how loudly a propagated error is logged
//!
//! # Design Decisions
//! - Flat: kinds differ only in default status code, never in behaviour
//! - Construction never fails; builder-style `with_*` methods fill optional fields
//! - Errors are `Clone` so a task's captured error can be inspected and re-raised

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::envelope::{self, ErrorCatalog};

/// Result type for communication-core operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Discriminant of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller supplied something invalid.
    BadRequest,
    /// Requested entity does not exist.
    NotFound,
    /// Caller is not allowed to perform the operation.
    Forbidden,
    /// An outbound call exceeded its deadline.
    RequestTimeout,
    /// A downstream service answered with a failure envelope.
    InterService,
    /// The outbound call failed below the application layer (connect, I/O, decode).
    Transport,
    /// The task executor was misconfigured or a task could not complete.
    TaskExecutor,
}

impl ErrorKind {
    /// Status code used when none is given explicitly.
    pub fn default_status(self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Forbidden => 403,
            ErrorKind::RequestTimeout => 408,
            ErrorKind::InterService => 400,
            ErrorKind::Transport => 500,
            ErrorKind::TaskExecutor => 400,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::BadRequest => "bad request",
            ErrorKind::NotFound => "not found",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::RequestTimeout => "request timeout",
            ErrorKind::InterService => "inter-service request failed",
            ErrorKind::Transport => "transport error",
            ErrorKind::TaskExecutor => "task executor error",
        };
        f.write_str(name)
    }
}

/// Error content: a plain message or a structured JSON document.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Message(String),
    Structured(Value),
}

impl ErrorBody {
    /// The message text, if this is a plain message.
    pub fn as_message(&self) -> Option<&str> {
        match self {
            ErrorBody::Message(m) => Some(m),
            ErrorBody::Structured(_) => None,
        }
    }

    /// Render as JSON.
    pub fn to_value(&self) -> Value {
        match self {
            ErrorBody::Message(m) => Value::String(m.clone()),
            ErrorBody::Structured(v) => v.clone(),
        }
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorBody::Message(m) => f.write_str(m),
            ErrorBody::Structured(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for ErrorBody {
    fn from(s: &str) -> Self {
        ErrorBody::Message(s.to_string())
    }
}

impl From<String> for ErrorBody {
    fn from(s: String) -> Self {
        ErrorBody::Message(s)
    }
}

impl From<Value> for ErrorBody {
    /// JSON strings collapse to plain messages; everything else stays structured.
    fn from(v: Value) -> Self {
        match v {
            Value::String(s) => ErrorBody::Message(s),
            other => ErrorBody::Structured(other),
        }
    }
}

/// A typed failure with status code, optional metadata and logging policy.
#[derive(Debug, Clone, Error)]
#[error("{kind} ({status_code}): {error}")]
pub struct ServiceError {
    kind: ErrorKind,
    error: ErrorBody,
    status_code: u16,
    meta: Option<Value>,
    quiet: bool,
    error_id: Option<String>,
    code: Option<Value>,
}

impl ServiceError {
    /// Create an error of the given kind with its default status code.
    pub fn new(kind: ErrorKind, error: impl Into<ErrorBody>) -> Self {
        Self {
            kind,
            error: error.into(),
            status_code: kind.default_status(),
            meta: None,
            quiet: true,
            error_id: None,
            code: None,
        }
    }

    pub fn bad_request(error: impl Into<ErrorBody>) -> Self {
        Self::new(ErrorKind::BadRequest, error)
    }

    pub fn not_found(error: impl Into<ErrorBody>) -> Self {
        Self::new(ErrorKind::NotFound, error)
    }

    pub fn forbidden(error: impl Into<ErrorBody>) -> Self {
        Self::new(ErrorKind::Forbidden, error)
    }

    pub fn timeout(error: impl Into<ErrorBody>) -> Self {
        Self::new(ErrorKind::RequestTimeout, error)
    }

    /// A downstream failure carrying the downstream's own status code.
    pub fn inter_service(error: impl Into<ErrorBody>, status_code: u16) -> Self {
        Self::new(ErrorKind::InterService, error).with_status(status_code)
    }

    pub fn transport(error: impl Into<ErrorBody>) -> Self {
        Self::new(ErrorKind::Transport, error)
    }

    pub fn task_executor(error: impl Into<ErrorBody>) -> Self {
        Self::new(ErrorKind::TaskExecutor, error)
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn with_meta(mut self, meta: Option<Value>) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_error_id(mut self, error_id: impl Into<String>) -> Self {
        self.error_id = Some(error_id.into());
        self
    }

    pub fn with_code(mut self, code: Option<Value>) -> Self {
        self.code = code;
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn error(&self) -> &ErrorBody {
        &self.error
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    pub fn quiet(&self) -> bool {
        self.quiet
    }

    pub fn error_id(&self) -> Option<&str> {
        self.error_id.as_deref()
    }

    /// Machine-readable code forwarded from a downstream service.
    pub fn code(&self) -> Option<&Value> {
        self.code.as_ref()
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::RequestTimeout
    }

    /// Render the client-facing failure envelope for this error.
    pub fn to_response_body(&self, catalog: Option<&ErrorCatalog>) -> Value {
        envelope::error_envelope(self, catalog)
    }

    /// Log a propagated error on behalf of the handler named `endpoint`.
    ///
    /// Quiet errors and client-side inter-service failures go to INFO;
    /// anything else is an ERROR with the full error payload attached.
    pub fn report(&self, endpoint: &str) {
        let client_side = matches!(self.status_code, 400 | 401 | 403 | 404);
        let loud = match self.kind {
            ErrorKind::InterService => !client_side,
            ErrorKind::Transport | ErrorKind::RequestTimeout => true,
            _ => !self.quiet,
        };

        if loud {
            tracing::error!(
                endpoint = %endpoint,
                kind = %self.kind,
                status_code = self.status_code,
                error = %self.error,
                "Handled exception"
            );
        } else {
            tracing::info!(
                endpoint = %endpoint,
                kind = %self.kind,
                status_code = self.status_code,
                "Handled exception"
            );
        }
    }
}
