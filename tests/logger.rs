//! Leveled logger behavior through the public API.

use std::fs;
use std::process::Command;

use api_server::observability::{Format, LoggerConfig, SharedBuffer, Severity, Sink};
use api_server::{fields, log_error, log_info, log_warn};

mod common;
use common::{capture_logger, records};

#[test]
fn test_threshold_drops_lower_severities() {
    let (logger, buffer) = capture_logger(Severity::Warn);

    logger.info("x", None);
    assert!(buffer.lines().is_empty());

    logger.error("y", None);
    let records = records(&buffer);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "ERROR");
    assert_eq!(records[0]["message"], "y");
}

#[test]
fn test_every_severity_against_every_threshold() {
    let emitters = [Severity::Debug, Severity::Info, Severity::Warn, Severity::Error];
    for threshold in Severity::ALL {
        let (logger, buffer) = capture_logger(threshold);
        for severity in emitters {
            logger.log(severity, "m", None);
        }
        let expected = emitters.iter().filter(|s| **s >= threshold).count();
        assert_eq!(buffer.lines().len(), expected, "threshold {threshold}");
    }
}

#[test]
fn test_level_change_is_seen_by_clones() {
    let (logger, buffer) = capture_logger(Severity::Info);
    let clone = logger.clone();

    logger.set_level(Severity::Error);
    clone.warn("hidden", None);
    assert!(buffer.lines().is_empty());

    clone.set_level(Severity::Debug);
    logger.debug("shown", None);
    assert_eq!(buffer.lines().len(), 1);
}

#[test]
fn test_macros_record_caller_and_fields() {
    let (logger, buffer) = capture_logger(Severity::Debug);
    logger.with_field("service", "API");

    log_info!(logger, "started", fields! { "port" => 8080 });
    log_warn!(logger, "slow");
    log_error!(logger, "failed", fields! { "service" => "override" });

    let records = records(&buffer);
    assert_eq!(records.len(), 3);

    assert_eq!(records[0]["file"], "logger.rs");
    assert_eq!(records[0]["function"], "test_macros_record_caller_and_fields");
    assert_eq!(records[0]["fields"]["port"], 8080);
    assert_eq!(records[0]["fields"]["service"], "API");

    assert_eq!(records[1]["level"], "WARN");
    assert_eq!(records[2]["fields"]["service"], "override");
}

#[test]
fn test_text_output_is_sorted_and_plain() {
    let buffer = SharedBuffer::new();
    let logger = LoggerConfig::builder()
        .sink(buffer.sink())
        .format(Format::Text)
        .colorize(false)
        .show_caller(false)
        .into_logger();

    logger.info("hello", Some(fields! { "zeta" => 1, "alpha" => "a" }));

    let line = &buffer.lines()[0];
    assert!(line.starts_with('['));
    assert!(line.ends_with("INFO hello alpha=a zeta=1"), "{line}");
    assert!(!line.contains('\x1b'));
}

/// Set in the child process spawned by `test_fatal_writes_record_then_exits`.
const FATAL_LOG_PATH: &str = "API_SERVER_TEST_FATAL_LOG_PATH";

#[test]
fn test_fatal_writes_record_then_exits() {
    if let Ok(path) = std::env::var(FATAL_LOG_PATH) {
        let file = fs::File::create(path).unwrap();
        let logger = LoggerConfig::builder()
            .sink(Sink::new(file))
            .format(Format::Json)
            .into_logger();
        logger.fatal("cannot continue", Some(fields! { "code" => 7 }));
    }

    let path = std::env::temp_dir().join(format!("api-server-fatal-{}.log", uuid::Uuid::new_v4()));
    let status = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", "test_fatal_writes_record_then_exits", "--test-threads=1"])
        .env(FATAL_LOG_PATH, &path)
        .status()
        .unwrap();

    assert_eq!(status.code(), Some(1));

    let contents = fs::read_to_string(&path).unwrap();
    fs::remove_file(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["level"], "FATAL");
    assert_eq!(record["message"], "cannot continue");
    assert_eq!(record["fields"]["code"], 7);
}
