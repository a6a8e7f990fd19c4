//! Sensitive data redaction for request logs.

use std::collections::{BTreeMap, HashSet};

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder substituted for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// How configured body field names are applied to captured bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyRedaction {
    /// Replace every literal occurrence of each name in the raw text.
    #[default]
    Substring,
    /// Replace the values of matching object keys when the body is JSON,
    /// falling back to `Substring` otherwise.
    JsonKeys,
}

/// Canonical header spelling: first letter and every letter after a `-`
/// uppercased, the rest lowercased (`x-api-key` → `X-Api-Key`).
pub fn canonical_header_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = true;
    for c in name.chars() {
        if upper {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        upper = c == '-';
    }
    out
}

/// Exact, case-sensitive match of an already canonical name.
pub fn should_redact_header(name: &str, redact: &HashSet<String>) -> bool {
    redact.contains(name)
}

/// Collect headers under their canonical names, keeping the first value of
/// each. Values of headers listed in `redact` become [`REDACTED`].
pub fn redact_headers(headers: &HeaderMap, redact: &HashSet<String>) -> BTreeMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            let value = headers.get(name)?;
            let canonical = canonical_header_name(name.as_str());
            let value = if should_redact_header(&canonical, redact) {
                REDACTED.to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            Some((canonical, value))
        })
        .collect()
}

/// Replace every literal occurrence of each field name with [`REDACTED`].
///
/// This is text substitution: a name appearing inside unrelated text is
/// replaced too.
pub fn redact_body(body: &str, fields: &[String]) -> String {
    fields
        .iter()
        .filter(|field| !field.is_empty())
        .fold(body.to_string(), |acc, field| acc.replace(field.as_str(), REDACTED))
}

/// Apply `mode` to a captured body.
pub fn redact_body_with(body: &str, fields: &[String], mode: BodyRedaction) -> String {
    match mode {
        BodyRedaction::Substring => redact_body(body, fields),
        BodyRedaction::JsonKeys => match serde_json::from_str::<Value>(body) {
            Ok(mut value) => {
                redact_json_keys(&mut value, fields);
                value.to_string()
            }
            Err(_) => redact_body(body, fields),
        },
    }
}

fn redact_json_keys(value: &mut Value, fields: &[String]) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if fields.iter().any(|f| f == key) {
                    *val = Value::String(REDACTED.to_string());
                } else {
                    redact_json_keys(val, fields);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                redact_json_keys(item, fields);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn set(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("authorization"), "Authorization");
        assert_eq!(canonical_header_name("x-api-key"), "X-Api-Key");
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
    }

    #[test]
    fn test_header_redaction() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer secret-token"));
        headers.insert("x-api-key", HeaderValue::from_static("k-123"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.append("accept", HeaderValue::from_static("text/plain"));

        let out = redact_headers(&headers, &set(&["Authorization", "X-Api-Key"]));

        assert_eq!(out["Authorization"], REDACTED);
        assert_eq!(out["X-Api-Key"], REDACTED);
        assert_eq!(out["Accept"], "application/json");
        assert!(!out.values().any(|v| v.contains("secret-token") || v == "k-123"));
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("session=abc"));

        let out = redact_headers(&headers, &set(&["COOKIE"]));
        assert_eq!(out["Cookie"], "session=abc");
    }

    #[test]
    fn test_body_substring_redaction() {
        let fields = vec!["password".to_string()];
        assert_eq!(redact_body(r#"{"password":"123"}"#, &fields), r#"{"[REDACTED]":"123"}"#);
        assert_eq!(
            redact_body("reset your password now", &fields),
            "reset your [REDACTED] now"
        );
        assert_eq!(redact_body("unchanged", &[String::new()]), "unchanged");
    }

    #[test]
    fn test_body_json_keys_redaction() {
        let fields = vec!["password".to_string(), "token".to_string()];
        let body = r#"{"user":"ana","password":"123","nested":[{"token":"t"}],"note":"password"}"#;

        let value: Value = serde_json::from_str(&redact_body_with(body, &fields, BodyRedaction::JsonKeys)).unwrap();
        assert_eq!(value["password"], REDACTED);
        assert_eq!(value["nested"][0]["token"], REDACTED);
        assert_eq!(value["user"], "ana");
        assert_eq!(value["note"], "password");

        assert_eq!(
            redact_body_with("password=1", &fields, BodyRedaction::JsonKeys),
            "[REDACTED]=1"
        );
    }
}
