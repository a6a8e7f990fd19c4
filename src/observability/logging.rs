//! Structured, leveled logging.
//!
//! # Responsibilities
//! - Filter records against a severity threshold
//! - Merge persistent base fields with per-call fields
//! - Render records as colorized text or JSON and write them to a sink
//! - Allow the threshold and output settings to change at runtime
//!
//! # Design Decisions
//! - Configuration is built once through [`LoggerConfig::builder`]; runtime
//!   setters exist for hot reload
//! - State sits behind a reader/writer lock: emission is read-shared, every
//!   setter is exclusive
//! - Call sites pass their location explicitly (`#[track_caller]` or the
//!   `log_*!` macros), no stack walking

use std::panic::Location;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Local, SecondsFormat};
use serde_json::Value;

use crate::observability::format::{render_json, render_text, Format};
use crate::observability::level::Severity;
use crate::observability::record::{Caller, Fields, LogRecord};
use crate::observability::sink::Sink;

/// Logger settings.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum severity that gets written.
    pub level: Severity,
    pub sink: Sink,
    pub format: Format,
    /// Wrap timestamp and level in ANSI colors (text format only).
    pub colorize: bool,
    /// Attach file, line and function of the call site.
    pub show_caller: bool,
    /// Base fields attached to every record.
    pub fields: Fields,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Severity::Info,
            sink: Sink::stdout(),
            format: Format::Text,
            colorize: true,
            show_caller: true,
            fields: Fields::new(),
        }
    }
}

impl LoggerConfig {
    pub fn builder() -> LoggerConfigBuilder {
        LoggerConfigBuilder::default()
    }
}

/// Builder for [`LoggerConfig`].
#[derive(Debug, Default)]
pub struct LoggerConfigBuilder {
    config: LoggerConfig,
}

impl LoggerConfigBuilder {
    pub fn level(mut self, level: Severity) -> Self {
        self.config.level = level;
        self
    }

    pub fn sink(mut self, sink: Sink) -> Self {
        self.config.sink = sink;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.config.format = format;
        self
    }

    pub fn colorize(mut self, enabled: bool) -> Self {
        self.config.colorize = enabled;
        self
    }

    pub fn show_caller(mut self, enabled: bool) -> Self {
        self.config.show_caller = enabled;
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.fields.insert(key.into(), value.into());
        self
    }

    pub fn fields(mut self, fields: Fields) -> Self {
        self.config.fields.extend(fields);
        self
    }

    pub fn build(self) -> LoggerConfig {
        self.config
    }

    /// Shorthand for `Logger::new(self.build())`.
    pub fn into_logger(self) -> Logger {
        Logger::new(self.config)
    }
}

/// Shared handle to a leveled logger. Clones write through the same state.
#[derive(Debug, Clone)]
pub struct Logger {
    state: Arc<RwLock<LoggerConfig>>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LoggerConfig::default())
    }
}

impl Logger {
    pub fn new(config: LoggerConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(config)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LoggerConfig> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LoggerConfig> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current threshold.
    pub fn level(&self) -> Severity {
        self.read().level
    }

    /// Whether a record at `severity` would be written.
    pub fn enabled(&self, severity: Severity) -> bool {
        severity >= self.read().level
    }

    /// Snapshot of the current settings.
    pub fn config(&self) -> LoggerConfig {
        self.read().clone()
    }

    pub fn set_level(&self, level: Severity) -> &Self {
        self.write().level = level;
        self
    }

    pub fn set_sink(&self, sink: Sink) -> &Self {
        self.write().sink = sink;
        self
    }

    pub fn set_format(&self, format: Format) -> &Self {
        self.write().format = format;
        self
    }

    pub fn set_colorize(&self, enabled: bool) -> &Self {
        self.write().colorize = enabled;
        self
    }

    pub fn set_show_caller(&self, enabled: bool) -> &Self {
        self.write().show_caller = enabled;
        self
    }

    /// Attach a base field. It stays on this logger for every later record.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        self.write().fields.insert(key.into(), value.into());
        self
    }

    /// Merge several base fields.
    pub fn with_fields(&self, fields: Fields) -> &Self {
        self.write().fields.extend(fields);
        self
    }

    /// Independent logger with the current settings and sink plus `fields`.
    /// Later changes to either logger do not affect the other.
    pub fn child(&self, fields: Fields) -> Logger {
        let mut config = self.config();
        config.fields.extend(fields);
        Logger::new(config)
    }

    #[track_caller]
    pub fn debug(&self, message: &str, fields: Option<Fields>) {
        self.log_at(Severity::Debug, message, fields, Caller::from_location(Location::caller()));
    }

    #[track_caller]
    pub fn info(&self, message: &str, fields: Option<Fields>) {
        self.log_at(Severity::Info, message, fields, Caller::from_location(Location::caller()));
    }

    #[track_caller]
    pub fn warn(&self, message: &str, fields: Option<Fields>) {
        self.log_at(Severity::Warn, message, fields, Caller::from_location(Location::caller()));
    }

    #[track_caller]
    pub fn error(&self, message: &str, fields: Option<Fields>) {
        self.log_at(Severity::Error, message, fields, Caller::from_location(Location::caller()));
    }

    /// Write a FATAL record, then exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: &str, fields: Option<Fields>) -> ! {
        self.fatal_at(message, fields, Caller::from_location(Location::caller()))
    }

    #[track_caller]
    pub fn log(&self, severity: Severity, message: &str, fields: Option<Fields>) {
        self.log_at(severity, message, fields, Caller::from_location(Location::caller()));
    }

    /// Emit with an explicit caller. A FATAL record is written but does not
    /// exit; use [`Logger::fatal_at`] for that.
    pub fn log_at(&self, severity: Severity, message: &str, fields: Option<Fields>, caller: Caller) {
        let state = self.read();
        if severity < state.level {
            return;
        }

        let mut merged = state.fields.clone();
        if let Some(fields) = fields {
            merged.extend(fields);
        }

        let record = LogRecord {
            timestamp: Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            level: severity,
            message: message.to_string(),
            caller: state.show_caller.then_some(caller).filter(Caller::is_known),
            fields: merged,
        };

        let line = match state.format {
            Format::Json => match render_json(&record) {
                Ok(line) => line,
                Err(e) => {
                    eprintln!("logger error: failed to encode record: {}", e);
                    return;
                }
            },
            Format::Text => render_text(&record, state.colorize),
        };

        if let Err(e) = state.sink.write_line(&line) {
            eprintln!("logger error: failed to write record: {}", e);
        }
    }

    /// Write a FATAL record with an explicit caller, then exit with status 1.
    /// The exit happens only after the write has returned.
    pub fn fatal_at(&self, message: &str, fields: Option<Fields>, caller: Caller) -> ! {
        self.log_at(Severity::Fatal, message, fields, caller);
        std::process::exit(1)
    }
}
