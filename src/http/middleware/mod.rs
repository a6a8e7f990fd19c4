//! HTTP middleware.
//!
//! # Data Flow
//! ```text
//! request
//!     → request_logging.rs (skip check, capture, emit)
//!         → capture.rs (bounded request body read, response observer)
//!         → redaction.rs (headers, bodies)
//!     → handler
//! ```

pub mod capture;
pub mod redaction;
pub mod request_logging;

pub use capture::{capture_request_body, BodyCaptureError, CaptureBody, ResponseCapture};
pub use redaction::{redact_body, redact_headers, BodyRedaction, REDACTED};
pub use request_logging::{
    install, log_requests, severity_for_status, LogPreset, RequestLogConfig, RequestLogEntry,
    RequestLogHandle,
};
