//! Process-wide default logger.
//!
//! Components receive their [`Logger`] explicitly. This module keeps one
//! owned default instance for code that runs before any wiring exists,
//! such as early startup in `main`. It is created once, either by
//! [`install`] or lazily on first use with default settings, and is never
//! replaced afterwards.

use std::sync::OnceLock;

use crate::observability::level::Severity;
use crate::observability::logging::Logger;
use crate::observability::record::Fields;

static DEFAULT: OnceLock<Logger> = OnceLock::new();

/// Install the default logger. Fails with the given logger if a default
/// already exists.
pub fn install(logger: Logger) -> Result<(), Logger> {
    DEFAULT.set(logger)
}

/// The default logger, created with default settings if none was installed.
pub fn logger() -> &'static Logger {
    DEFAULT.get_or_init(Logger::default)
}

pub fn set_level(level: Severity) {
    logger().set_level(level);
}

#[track_caller]
pub fn debug(message: &str, fields: Option<Fields>) {
    logger().debug(message, fields);
}

#[track_caller]
pub fn info(message: &str, fields: Option<Fields>) {
    logger().info(message, fields);
}

#[track_caller]
pub fn warn(message: &str, fields: Option<Fields>) {
    logger().warn(message, fields);
}

#[track_caller]
pub fn error(message: &str, fields: Option<Fields>) {
    logger().error(message, fields);
}

#[track_caller]
pub fn fatal(message: &str, fields: Option<Fields>) -> ! {
    logger().fatal(message, fields)
}
