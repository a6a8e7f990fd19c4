//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! api.toml (first of api.toml, assets/api.toml, config/api.toml, or --config)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → new AppConfig sent to the reload loop
//!     → logger threshold and request-logging config swapped
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A reload that fails validation keeps the previous configuration

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{find_config_file, load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, DebugConfig, LoggingConfig, RequestLoggingConfig, SecurityConfig, ServerConfig,
    TlsConfig, UploadsConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
