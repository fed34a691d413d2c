//! Parsing of user-typed JSON and header blocks, and response formatting.
//!
//! Pure functions only; nothing here touches the network or disk.

use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::models::{HeaderSet, ResponseEnvelope};

/// Parse a JSON object. Blank input is an empty object.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ValidationError::InvalidJson(
            "Expected a JSON object.".to_string(),
        )),
        Err(e) => Err(ValidationError::InvalidJson(e.to_string())),
    }
}

/// Parse headers given either as a JSON object or as `Key: Value` lines.
///
/// JSON values that are not strings are stored in their JSON text form, so
/// `{"A": 1}` yields `A: 1`. Anything that does not parse as JSON at all is
/// read line by line.
pub fn parse_headers(raw: &str) -> Result<HeaderSet, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(HeaderSet::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, stringify(v)))
            .collect()),
        Ok(_) => Err(ValidationError::InvalidJson(
            "Headers JSON must be an object.".to_string(),
        )),
        Err(_) => parse_header_lines(raw),
    }
}

/// Parse `Key: Value` lines, splitting on the first colon. Blank lines are skipped.
pub fn parse_header_lines(raw: &str) -> Result<HeaderSet, ValidationError> {
    let mut headers = HeaderSet::new();
    for line in raw.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| ValidationError::InvalidHeaderLine(line.to_string()))?;
        headers.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(headers)
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Pretty-print a body if it is JSON, otherwise return it untouched.
pub fn pretty_body(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|json| serde_json::to_string_pretty(&json).ok())
        .unwrap_or_else(|| text.to_string())
}

/// Render an envelope for the response pane.
pub fn format_response(response: &ResponseEnvelope) -> String {
    format!(
        "Status: {}\nTime: {:.1} ms\nBody:\n{}",
        response.status,
        response.duration_ms,
        pretty_body(&response.text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_object_blank_is_empty() {
        assert!(parse_json_object("").unwrap().is_empty());
        assert!(parse_json_object("   \n").unwrap().is_empty());
        assert!(parse_json_object("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_json_object_rejects_non_objects() {
        for raw in ["[1, 2]", "42", "\"text\"", "null", "true", "{broken"] {
            assert!(
                matches!(parse_json_object(raw), Err(ValidationError::InvalidJson(_))),
                "expected InvalidJson for {raw}"
            );
        }
    }

    #[test]
    fn test_parse_json_object_keeps_values() {
        let map = parse_json_object(r#"{"id": 7, "name": "x"}"#).unwrap();
        assert_eq!(map["id"], Value::from(7));
        assert_eq!(map["name"], Value::from("x"));
    }

    #[test]
    fn test_parse_headers_json_values_stringified() {
        let headers = parse_headers(r#"{"A": 1, "B": "two", "C": true}"#).unwrap();
        assert_eq!(headers["A"], "1");
        assert_eq!(headers["B"], "two");
        assert_eq!(headers["C"], "true");
    }

    #[test]
    fn test_parse_headers_json_array_rejected() {
        assert!(matches!(
            parse_headers("[1]"),
            Err(ValidationError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_parse_headers_lines() {
        let raw = "Authorization: Bearer abc\n\n  X-Trace :  a:b:c  \n";
        let headers = parse_headers(raw).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["Authorization"], "Bearer abc");
        assert_eq!(headers["X-Trace"], "a:b:c");
    }

    #[test]
    fn test_parse_headers_last_duplicate_wins() {
        let headers = parse_headers("A: 1\nA: 2").unwrap();
        assert_eq!(headers["A"], "2");
    }

    #[test]
    fn test_parse_headers_line_without_colon() {
        let err = parse_headers("Good: yes\nNoColonHere").unwrap_err();
        assert_eq!(err, ValidationError::InvalidHeaderLine("NoColonHere".into()));
        assert!(err.to_string().contains("NoColonHere"));
    }

    #[test]
    fn test_format_response_pretty_prints_json() {
        let response = ResponseEnvelope {
            status: 200,
            text: r#"{"data":{"ok":true}}"#.to_string(),
            duration_ms: 12.345,
        };
        let out = format_response(&response);
        assert!(out.starts_with("Status: 200\nTime: 12.3 ms\nBody:\n"));
        assert!(out.contains("{\n  \"data\": {\n    \"ok\": true\n  }\n}"));
    }

    #[test]
    fn test_format_response_keeps_raw_body() {
        let response = ResponseEnvelope {
            status: 502,
            text: "<html>bad gateway</html>".to_string(),
            duration_ms: 0.0,
        };
        assert_eq!(
            format_response(&response),
            "Status: 502\nTime: 0.0 ms\nBody:\n<html>bad gateway</html>"
        );
    }
}
