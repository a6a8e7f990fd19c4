//! Record rendering: colorized text and JSON.

use std::fmt::Write;

use serde_json::Value;

use crate::observability::level::Severity;
use crate::observability::record::LogRecord;

pub const COLOR_RESET: &str = "\x1b[0m";
pub const COLOR_RED: &str = "\x1b[31m";
pub const COLOR_GREEN: &str = "\x1b[32m";
pub const COLOR_YELLOW: &str = "\x1b[33m";
pub const COLOR_PURPLE: &str = "\x1b[35m";
pub const COLOR_CYAN: &str = "\x1b[36m";
pub const COLOR_WHITE: &str = "\x1b[37m";

/// Output format of a logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// ANSI color for a severity.
pub fn color(severity: Severity) -> &'static str {
    match severity {
        Severity::Debug => COLOR_CYAN,
        Severity::Info => COLOR_GREEN,
        Severity::Warn => COLOR_YELLOW,
        Severity::Error => COLOR_RED,
        Severity::Fatal => COLOR_PURPLE,
    }
}

/// Render `[timestamp] LEVEL (file:line function) message key=value ...`.
///
/// Fields come out in key order. Strings are printed raw, every other value
/// as compact JSON.
pub fn render_text(record: &LogRecord, colorize: bool) -> String {
    let (color, reset) = if colorize {
        (color(record.level), COLOR_RESET)
    } else {
        ("", "")
    };

    let mut out = String::with_capacity(64 + record.message.len());
    // Writing into a String cannot fail.
    let _ = write!(
        out,
        "{color}[{}]{reset} {color}{}{reset}",
        record.timestamp, record.level
    );

    if let Some(caller) = record.caller.as_ref().filter(|c| !c.file.is_empty()) {
        let white = if colorize { COLOR_WHITE } else { "" };
        if caller.function.is_empty() {
            let _ = write!(out, " {white}({}:{}){reset}", caller.file, caller.line);
        } else {
            let _ = write!(
                out,
                " {white}({}:{} {}){reset}",
                caller.file, caller.line, caller.function
            );
        }
    }

    out.push(' ');
    out.push_str(&record.message);

    for (key, value) in &record.fields {
        let _ = write!(out, " {key}={}", render_value(value));
    }

    out
}

/// Serialize the record as one line of JSON.
pub fn render_json(record: &LogRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string(record)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::record::{Caller, Fields};

    fn record() -> LogRecord {
        let mut fields = Fields::new();
        fields.insert("zeta".into(), Value::from("last"));
        fields.insert("alpha".into(), Value::from(1));
        fields.insert("nested".into(), serde_json::json!({"a": true}));
        LogRecord {
            timestamp: "2024-05-01T10:00:00Z".into(),
            level: Severity::Warn,
            message: "disk almost full".into(),
            caller: Some(Caller::new("src/main.rs", 12, "api_server::main")),
            fields,
        }
    }

    #[test]
    fn test_plain_text_line() {
        assert_eq!(
            render_text(&record(), false),
            r#"[2024-05-01T10:00:00Z] WARN (main.rs:12 main) disk almost full alpha=1 nested={"a":true} zeta=last"#
        );
    }

    #[test]
    fn test_colorized_line_resets_every_span() {
        let line = render_text(&record(), true);
        assert!(line.starts_with("\x1b[33m[2024-05-01T10:00:00Z]\x1b[0m \x1b[33mWARN\x1b[0m"));
        assert!(line.contains("\x1b[37m(main.rs:12 main)\x1b[0m"));
    }

    #[test]
    fn test_caller_segment_omitted_when_absent() {
        let mut record = record();
        record.caller = None;
        record.fields.clear();
        assert_eq!(
            render_text(&record, false),
            "[2024-05-01T10:00:00Z] WARN disk almost full"
        );
    }

    #[test]
    fn test_distinct_colors() {
        let colors: std::collections::HashSet<_> = Severity::ALL.iter().map(|s| color(*s)).collect();
        assert_eq!(colors.len(), 5);
    }
}
