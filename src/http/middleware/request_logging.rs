//! Request/response logging middleware.
//!
//! One record per request:
//!
//! ```text
//! skip check ─ match ─→ handler, nothing logged
//!      │
//!      └─ capture (id, metadata, headers, request body)
//!           → handler
//!           → response body wrapped in CaptureBody
//!           → end of stream: status, size, duration, response body
//!           → redact → severity by status → Logger
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName},
    middleware::{self, Next},
    response::Response,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RequestLoggingConfig;
use crate::http::middleware::capture::{capture_request_body, CaptureBody, ResponseCapture};
use crate::http::middleware::redaction::{
    canonical_header_name, redact_body_with, redact_headers, should_redact_header, BodyRedaction,
    REDACTED,
};
use crate::http::request::{resolve_remote_addr, resolve_request_id, X_REQUEST_ID};
use crate::observability::{Fields, Logger, Severity};

/// Named starting points for [`RequestLogConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogPreset {
    /// Headers, no bodies, skips `/health` and `/metrics`.
    #[default]
    Default,
    /// Request line only, skips `/health`.
    Simple,
    /// Headers and both bodies, nothing skipped.
    Detailed,
    /// Headers only, wide redaction lists.
    SecurityAware,
}

/// Middleware settings.
#[derive(Debug, Clone)]
pub struct RequestLogConfig {
    pub logger: Logger,
    /// Paths compared by exact equality. Matching requests are not logged.
    pub skip_paths: HashSet<String>,
    pub log_request_body: bool,
    pub log_response_body: bool,
    pub log_headers: bool,
    /// Upper bound for captured request and response bodies, in bytes.
    pub max_body_size: usize,
    /// Canonical header names whose values are replaced.
    pub redact_headers: HashSet<String>,
    /// Names scrubbed from captured bodies, applied in order.
    pub redact_body_fields: Vec<String>,
    pub body_redaction: BodyRedaction,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn string_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RequestLogConfig {
    pub fn new(logger: Logger) -> Self {
        Self::preset(logger, LogPreset::Default)
    }

    pub fn preset(logger: Logger, preset: LogPreset) -> Self {
        match preset {
            LogPreset::Default => Self {
                logger,
                skip_paths: string_set(&["/health", "/metrics"]),
                log_request_body: false,
                log_response_body: false,
                log_headers: true,
                max_body_size: 1024 * 1024,
                redact_headers: string_set(&["Authorization", "Cookie", "X-Api-Key"]),
                redact_body_fields: strings(&["password", "token", "secret"]),
                body_redaction: BodyRedaction::Substring,
            },
            LogPreset::Simple => Self {
                logger,
                skip_paths: string_set(&["/health"]),
                log_request_body: false,
                log_response_body: false,
                log_headers: false,
                max_body_size: 1024,
                redact_headers: HashSet::new(),
                redact_body_fields: Vec::new(),
                body_redaction: BodyRedaction::Substring,
            },
            LogPreset::Detailed => Self {
                logger,
                skip_paths: HashSet::new(),
                log_request_body: true,
                log_response_body: true,
                log_headers: true,
                max_body_size: 10 * 1024,
                redact_headers: string_set(&["Authorization", "Cookie"]),
                redact_body_fields: strings(&["password", "token"]),
                body_redaction: BodyRedaction::Substring,
            },
            LogPreset::SecurityAware => Self {
                logger,
                skip_paths: string_set(&["/health", "/metrics"]),
                log_request_body: false,
                log_response_body: false,
                log_headers: true,
                max_body_size: 512,
                redact_headers: string_set(&["Authorization", "Cookie", "X-Api-Key", "X-Auth-Token"]),
                redact_body_fields: strings(&["password", "token", "secret", "key", "auth"]),
                body_redaction: BodyRedaction::Substring,
            },
        }
    }

    pub fn simple(logger: Logger) -> Self {
        Self::preset(logger, LogPreset::Simple)
    }

    pub fn detailed(logger: Logger) -> Self {
        Self::preset(logger, LogPreset::Detailed)
    }

    pub fn security_aware(logger: Logger) -> Self {
        Self::preset(logger, LogPreset::SecurityAware)
    }

    /// Start from the configured preset and apply explicit overrides.
    pub fn from_settings(logger: Logger, settings: &RequestLoggingConfig) -> Self {
        let mut config = Self::preset(logger, settings.preset);
        if let Some(paths) = &settings.skip_paths {
            config.skip_paths = paths.iter().cloned().collect();
        }
        if let Some(enabled) = settings.log_request_body {
            config.log_request_body = enabled;
        }
        if let Some(enabled) = settings.log_response_body {
            config.log_response_body = enabled;
        }
        if let Some(enabled) = settings.log_headers {
            config.log_headers = enabled;
        }
        if let Some(size) = settings.max_body_size {
            config.max_body_size = size;
        }
        if let Some(names) = &settings.redact_headers {
            config.redact_headers = names.iter().cloned().collect();
        }
        if let Some(fields) = &settings.redact_body_fields {
            config.redact_body_fields = fields.clone();
        }
        if let Some(mode) = settings.body_redaction {
            config.body_redaction = mode;
        }
        config
    }

    pub fn should_skip(&self, path: &str) -> bool {
        self.skip_paths.contains(path)
    }

    fn redact(&self, body: &str) -> String {
        redact_body_with(body, &self.redact_body_fields, self.body_redaction)
    }

    /// `value` of header `name`, or [`REDACTED`] if the header is in the
    /// redact set.
    fn redact_header_value(&self, name: &str, value: String) -> String {
        if should_redact_header(&canonical_header_name(name), &self.redact_headers) {
            REDACTED.to_string()
        } else {
            value
        }
    }
}

/// Live, swappable middleware configuration. Requests read the current
/// value when they start.
#[derive(Debug, Clone)]
pub struct RequestLogHandle {
    config: Arc<ArcSwap<RequestLogConfig>>,
}

impl RequestLogHandle {
    pub fn new(config: RequestLogConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    pub fn load(&self) -> Arc<RequestLogConfig> {
        self.config.load_full()
    }

    /// Replace the configuration for subsequent requests.
    pub fn store(&self, config: RequestLogConfig) {
        self.config.store(Arc::new(config));
    }
}

/// Wrap every route of `router` with request logging.
pub fn install<S>(router: Router<S>, handle: RequestLogHandle) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(handle, log_requests))
}

/// Everything logged about one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLogEntry {
    pub request_id: String,
    pub method: String,
    pub url: String,
    pub remote_addr: String,
    pub user_agent: String,
    pub referer: String,
    pub headers: BTreeMap<String, String>,
    pub request_body: String,
    pub response_body: String,
    pub status_code: u16,
    pub duration: Duration,
    pub size_bytes: u64,
}

impl RequestLogEntry {
    /// `METHOD URL STATUS`.
    pub fn message(&self) -> String {
        format!("{} {} {}", self.method, self.url, self.status_code)
    }

    pub fn severity(&self) -> Severity {
        severity_for_status(self.status_code)
    }

    /// Populated fields. Referer, headers and bodies only when non-empty.
    pub fn fields(&self) -> Fields {
        let duration_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX);
        let mut fields = crate::fields! {
            "request_id" => self.request_id,
            "method" => self.method,
            "url" => self.url,
            "remote_addr" => self.remote_addr,
            "user_agent" => self.user_agent,
            "status_code" => self.status_code,
            "duration_ms" => duration_ms,
            "size_bytes" => self.size_bytes,
        };

        if !self.referer.is_empty() {
            fields.insert("referer".into(), Value::from(self.referer.as_str()));
        }
        if !self.headers.is_empty() {
            let headers = self
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            fields.insert("headers".into(), Value::Object(headers));
        }
        if !self.request_body.is_empty() {
            fields.insert("request_body".into(), Value::from(self.request_body.as_str()));
        }
        if !self.response_body.is_empty() {
            fields.insert("response_body".into(), Value::from(self.response_body.as_str()));
        }
        fields
    }
}

/// `>=500` ERROR, `400..=499` WARN, everything else INFO.
pub fn severity_for_status(status: u16) -> Severity {
    match status {
        500.. => Severity::Error,
        400..=499 => Severity::Warn,
        _ => Severity::Info,
    }
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

/// Middleware function. Install with [`install`] or
/// `axum::middleware::from_fn_with_state`.
pub async fn log_requests(
    State(handle): State<RequestLogHandle>,
    request: Request,
    next: Next,
) -> Response {
    let config = handle.load();
    let start = Instant::now();

    if config.should_skip(request.uri().path()) {
        return next.run(request).await;
    }

    let (entry, request) = capture(&config, request).await;
    let response = next.run(request).await;
    finalize(config, entry, start, response)
}

async fn capture(config: &RequestLogConfig, request: Request) -> (RequestLogEntry, Request) {
    let headers = request.headers();
    let mut entry = RequestLogEntry {
        request_id: config.redact_header_value(X_REQUEST_ID, resolve_request_id(&request)),
        method: request.method().to_string(),
        url: request.uri().to_string(),
        remote_addr: resolve_remote_addr(&request),
        user_agent: config.redact_header_value(
            header::USER_AGENT.as_str(),
            header_text(headers, header::USER_AGENT),
        ),
        referer: config.redact_header_value(
            header::REFERER.as_str(),
            header_text(headers, header::REFERER),
        ),
        ..RequestLogEntry::default()
    };

    if config.log_headers {
        entry.headers = redact_headers(headers, &config.redact_headers);
    }

    if !config.log_request_body {
        return (entry, request);
    }

    let (parts, body) = request.into_parts();
    let (body, captured) = capture_request_body(body, config.max_body_size).await;
    match captured {
        Ok(text) => entry.request_body = config.redact(&text),
        Err(e) => crate::log_warn!(
            config.logger,
            "Failed to read request body",
            crate::fields! {
                "request_id" => entry.request_id,
                "error" => e.to_string(),
            }
        ),
    }

    (entry, Request::from_parts(parts, body))
}

fn finalize(
    config: Arc<RequestLogConfig>,
    mut entry: RequestLogEntry,
    start: Instant,
    response: Response,
) -> Response {
    let (parts, body) = response.into_parts();

    let mut capture = if config.log_response_body {
        ResponseCapture::mirrored(config.max_body_size)
    } else {
        ResponseCapture::new()
    };
    capture.set_status(parts.status);

    let body = CaptureBody::new(body, capture, move |capture| {
        entry.duration = start.elapsed();
        entry.status_code = capture.status().as_u16();
        entry.size_bytes = capture.size();
        if let Some(text) = capture.body_text() {
            entry.response_body = config.redact(&text);
        }
        emit(&config.logger, &entry);
    });

    Response::from_parts(parts, Body::new(body))
}

fn emit(logger: &Logger, entry: &RequestLogEntry) {
    logger.log_at(entry.severity(), &entry.message(), Some(entry.fields()), crate::caller!());
}
