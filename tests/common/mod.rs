//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::response::Response;
use serde_json::Value;

use api_server::observability::{Format, Logger, LoggerConfig, SharedBuffer, Severity};

/// A JSON logger writing into an in-memory buffer.
pub fn capture_logger(level: Severity) -> (Logger, SharedBuffer) {
    let buffer = SharedBuffer::new();
    let logger = LoggerConfig::builder()
        .level(level)
        .sink(buffer.sink())
        .format(Format::Json)
        .colorize(false)
        .into_logger();
    (logger, buffer)
}

/// Every line in the buffer, parsed as a JSON record.
pub fn records(buffer: &SharedBuffer) -> Vec<Value> {
    buffer
        .lines()
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Drain a response body. Request log entries are written once the body
/// has been fully read.
pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn empty() -> Body {
    Body::empty()
}
