//! Log record model.

use std::collections::BTreeMap;
use std::panic::Location;

use serde::Serialize;
use serde_json::Value;

use crate::observability::level::Severity;

/// Structured key/value fields. Ordered so text output is stable.
pub type Fields = BTreeMap<String, Value>;

/// Source location of a log call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    /// File basename.
    pub file: String,
    pub line: u32,
    /// Short function name, empty when the call site could not name it.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub function: String,
}

impl Caller {
    /// Build a caller from a full file path and a fully qualified function
    /// path, keeping only the basename and the last path segment.
    pub fn new(file: &str, line: u32, function: &str) -> Self {
        Self {
            file: basename(file).to_string(),
            line,
            function: short_function(function).to_string(),
        }
    }

    /// False for a location with no file, such as a `tracing` event
    /// without metadata.
    pub fn is_known(&self) -> bool {
        !self.file.is_empty()
    }

    /// Caller from a `#[track_caller]` location. Locations carry no function
    /// name.
    pub fn from_location(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line(), "")
    }
}

fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn short_function(path: &str) -> &str {
    path.split("::")
        .filter(|segment| !segment.is_empty() && *segment != "{{closure}}")
        .last()
        .unwrap_or("")
}

/// A single rendered log line before formatting.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// RFC3339 timestamp.
    pub timestamp: String,
    pub level: Severity,
    pub message: String,
    #[serde(flatten)]
    pub caller: Option<Caller>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: Fields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_trims_paths() {
        let caller = Caller::new("src/http/handlers.rs", 42, "api_server::http::handlers::index::{{closure}}");
        assert_eq!(caller.file, "handlers.rs");
        assert_eq!(caller.line, 42);
        assert_eq!(caller.function, "index");

        let caller = Caller::new("C:\\work\\main.rs", 7, "");
        assert_eq!(caller.file, "main.rs");
        assert_eq!(caller.function, "");
    }

    #[test]
    fn test_json_shape_omits_empty_parts() {
        let record = LogRecord {
            timestamp: "2024-01-01T00:00:00Z".into(),
            level: Severity::Info,
            message: "hello".into(),
            caller: None,
            fields: Fields::new(),
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"timestamp":"2024-01-01T00:00:00Z","level":"INFO","message":"hello"}"#
        );

        let mut fields = Fields::new();
        fields.insert("k".into(), Value::from(1));
        let record = LogRecord {
            caller: Some(Caller::new("a/b.rs", 3, "m::f")),
            fields,
            ..record
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"timestamp":"2024-01-01T00:00:00Z","level":"INFO","message":"hello","file":"b.rs","line":3,"function":"f","fields":{"k":1}}"#
        );
    }
}
