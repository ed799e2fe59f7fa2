//! Client for one peer service.
//!
//! # Data Flow
//! ```text
//! RequestParams + RequestContext
//!     → host + path, query merged          (compose::query)
//!     → caller headers + identity headers  (compose::headers)
//!     → pool permit + send + body read     (one timeout around all three)
//!     → JSON decode, optional purge        (success envelope)
//!     → ParserKind::parse                  → AsyncTaskResponse | ServiceError
//! ```
//!
//! # Design Decisions
//! - Failures are never retried: each call reports its outcome once
//! - Raw reqwest/decode errors never escape; they become `RequestTimeout` or
//!   `Transport` errors at this layer
//! - Timing goes to the `interservice::external` target at DEBUG

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use url::Url;

use crate::client::pool::ConnectionPool;
use crate::client::request::RequestParams;
use crate::compose::{apply_query, compose_headers, QueryParams, MULTIPART_FORM_DATA};
use crate::config::{ClientConfig, DownstreamConfig, ServiceIdentity};
use crate::context::RequestContext;
use crate::envelope::success_envelope;
use crate::error::{ServiceError, ServiceResult};
use crate::observability::{metrics, tracing::outbound_span, EXTERNAL_TARGET};
use crate::parser::ParserKind;
use crate::task::AsyncTaskResponse;

pub const TIMEOUT_MESSAGE: &str = "Inter service request timeout error";

struct RawResponse {
    status: u16,
    headers: HeaderMap,
    body: Vec<u8>,
}

/// A configured peer service.
#[derive(Debug, Clone)]
pub struct DownstreamClient {
    name: String,
    host: String,
    parser: ParserKind,
    timeout: Duration,
    pool: Arc<ConnectionPool>,
    identity: Arc<ServiceIdentity>,
}

impl DownstreamClient {
    /// Client with the envelope parser and a 60s timeout.
    pub fn new(
        name: impl Into<String>,
        host: impl Into<String>,
        pool: Arc<ConnectionPool>,
        identity: Arc<ServiceIdentity>,
    ) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            parser: ParserKind::default(),
            timeout: Duration::from_secs(ClientConfig::default().timeout_secs),
            pool,
            identity,
        }
    }

    pub fn from_config(
        downstream: &DownstreamConfig,
        client: &ClientConfig,
        pool: Arc<ConnectionPool>,
        identity: Arc<ServiceIdentity>,
    ) -> Self {
        let timeout_secs = downstream.timeout_secs.unwrap_or(client.timeout_secs);
        Self::new(&downstream.name, &downstream.host, pool, identity)
            .with_parser(downstream.parser)
            .with_timeout(Duration::from_secs(timeout_secs))
    }

    pub fn with_parser(mut self, parser: ParserKind) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn set_host(&mut self, host: String) {
        self.host = host;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn parser(&self) -> ParserKind {
        self.parser
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET with query parameters. See [`request`](Self::request) for every other option.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: QueryParams,
    ) -> ServiceResult<AsyncTaskResponse> {
        self.request(ctx, RequestParams::new(Method::GET, path).query(query))
            .await
    }

    /// POST with a JSON body. See [`request`](Self::request) for every other option.
    pub async fn post(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: Value,
    ) -> ServiceResult<AsyncTaskResponse> {
        self.request(ctx, RequestParams::new(Method::POST, path).json(body))
            .await
    }

    /// PUT with a JSON body. See [`request`](Self::request) for every other option.
    pub async fn put(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: Value,
    ) -> ServiceResult<AsyncTaskResponse> {
        self.request(ctx, RequestParams::new(Method::PUT, path).json(body))
            .await
    }

    /// PATCH with a JSON body. See [`request`](Self::request) for every other option.
    pub async fn patch(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: Value,
    ) -> ServiceResult<AsyncTaskResponse> {
        self.request(ctx, RequestParams::new(Method::PATCH, path).json(body))
            .await
    }

    /// DELETE with query parameters. See [`request`](Self::request) for every other option.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        path: &str,
        query: QueryParams,
    ) -> ServiceResult<AsyncTaskResponse> {
        self.request(ctx, RequestParams::new(Method::DELETE, path).query(query))
            .await
    }

    /// Execute one call and parse its response.
    pub async fn request(
        &self,
        ctx: &RequestContext,
        params: RequestParams,
    ) -> ServiceResult<AsyncTaskResponse> {
        let url = self.resolve_url(&params.path, &params.query)?;
        let span = outbound_span(&self.name, &params.method, &url, ctx.request_id());
        self.execute(ctx, params, url).instrument(span).await
    }

    fn resolve_url(&self, path: &str, query: &QueryParams) -> ServiceResult<Url> {
        let raw = format!("{}{}", self.host, path);
        let mut url = Url::parse(&raw).map_err(|e| {
            ServiceError::transport(json!({
                "message": format!("Invalid downstream URL {}: {}", raw, e)
            }))
        })?;
        apply_query(&mut url, query);
        Ok(url)
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        params: RequestParams,
        url: Url,
    ) -> ServiceResult<AsyncTaskResponse> {
        let RequestParams {
            method,
            body,
            timeout,
            headers,
            multipart,
            response_headers,
            purge_response_keys,
            ..
        } = params;

        let timeout = timeout.unwrap_or(self.timeout);
        let mut headers = compose_headers(headers, ctx, &self.identity);
        if multipart {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(MULTIPART_FORM_DATA));
        }

        let mut builder = self
            .pool
            .client()
            .request(method.clone(), url.clone())
            .headers(headers);
        if let Some(bytes) = body.into_bytes(multipart)? {
            builder = builder.body(bytes);
        }

        let start = Instant::now();
        let host_key = host_key(&url);
        let call = async {
            let _permit = self.pool.acquire(&host_key).await?;
            let response = builder.send().await.map_err(map_reqwest_error)?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(map_reqwest_error)?;
            Ok::<_, ServiceError>(RawResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        };

        let outcome = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(raw)) => Ok(raw),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(timeout_error()),
        };
        let elapsed = start.elapsed();

        let status_label = match &outcome {
            Ok(raw) => raw.status.to_string(),
            Err(err) if err.is_timeout() => "timeout".to_string(),
            Err(_) => "transport".to_string(),
        };
        tracing::debug!(
            target: EXTERNAL_TARGET,
            url = %url,
            downstream = %self.name,
            method = %method,
            status = %status_label,
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            timeout_ms = timeout.as_millis() as u64,
            service_name = %self.identity.name,
            service_version = %self.identity.version,
            request_id = %ctx.request_id(),
            "External call"
        );
        metrics::record_outbound_call(&self.name, method.as_str(), &status_label, elapsed);

        let raw = outcome?;
        let mut payload: Value = serde_json::from_slice(&raw.body).map_err(|e| {
            ServiceError::transport(json!({
                "message": format!("Failed to decode downstream response: {}", e)
            }))
        })?;
        if purge_response_keys {
            payload = success_envelope(payload, 200, None);
        }

        self.parser
            .parse(payload, raw.status, &raw.headers, response_headers.as_deref())
    }
}

fn timeout_error() -> ServiceError {
    ServiceError::timeout(json!({ "message": TIMEOUT_MESSAGE }))
}

fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        timeout_error()
    } else {
        ServiceError::transport(json!({ "message": err.to_string() }))
    }
}

/// Pool key for a URL: host plus effective port.
fn host_key(url: &Url) -> String {
    format!(
        "{}:{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default()
    )
}
