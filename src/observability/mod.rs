//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Call sites (handlers, middleware, main):
//!     → Logger::{debug,info,warn,error,fatal} or log_*! macros
//!     → logging.rs (threshold check, field merge, caller)
//!     → format.rs (text or JSON)
//!     → sink.rs (one line per record)
//!
//! tracing events from library plumbing:
//!     → bridge.rs (LoggerLayer)
//!     → same Logger
//! ```
//!
//! # Design Decisions
//! - Loggers are passed explicitly; `global` only holds a startup default
//! - Field maps are ordered so text output is reproducible
//! - Request ID is the only correlation carried between records

pub mod bridge;
pub mod format;
pub mod global;
pub mod level;
pub mod logging;
mod macros;
pub mod record;
pub mod sink;

pub use bridge::LoggerLayer;
pub use format::Format;
pub use level::{ParseSeverityError, Severity};
pub use logging::{Logger, LoggerConfig, LoggerConfigBuilder};
pub use record::{Caller, Fields, LogRecord};
pub use sink::{SharedBuffer, Sink};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
