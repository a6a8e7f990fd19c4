//! API server with leveled structured logging and request/response logging
//! middleware.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::AppConfig;
pub use http::ApiServer;
pub use lifecycle::Shutdown;
pub use observability::{Logger, LoggerConfig, Severity};
