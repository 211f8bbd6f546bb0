//! Detail panel derivation
//!
//! Pure functions turning a fetched [`RequestDetail`] into display strings.
//! Nothing here fails: malformed headers, queries or bodies are replaced by
//! a substitute rendering.

use chrono::{DateTime, Local, Utc};
use echoendpoint_common::{RequestDetail, RequestId};
use serde_json::{Map, Value};

pub const EMPTY_MARKER: &str = "(empty)";
pub const UNKNOWN: &str = "unknown";
const HEADER_PARSE_ERROR: &str = "Unable to parse headers";

/// Rendered detail of one captured request
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub id: RequestId,
    pub method: String,
    pub path: String,
    /// `<timestamp> · <remote ip>`
    pub meta: String,
    /// Headers as indented JSON
    pub headers: String,
    /// Query parameters as indented JSON
    pub query: String,
    pub body_preview: String,
    pub body_raw: String,
    pub size_caption: String,
}

impl DetailView {
    pub fn derive(detail: &RequestDetail) -> Self {
        let body_text = detail.body_text.as_deref();
        let body_blob = detail.body_blob_base64.as_deref();

        Self {
            id: detail.id.clone(),
            method: detail.method.clone(),
            path: detail.path.clone(),
            meta: meta_line(detail.received_at.as_ref(), detail.remote_ip.as_deref()),
            headers: pretty(parse_headers(detail.headers_json.as_deref())),
            query: pretty(parse_query(detail.query.as_deref())),
            body_preview: body_preview(body_text, body_blob),
            body_raw: body_raw(body_text, body_blob),
            size_caption: size_caption(detail.body_size, detail.truncated),
        }
    }
}

/// Parse the stored header blob; any failure yields a single error entry
pub fn parse_headers(blob: Option<&str>) -> Map<String, Value> {
    match blob.map(serde_json::from_str::<Map<String, Value>>) {
        Some(Ok(headers)) => headers,
        _ => {
            let mut fallback = Map::new();
            fallback.insert(
                "error".to_string(),
                Value::String(HEADER_PARSE_ERROR.to_string()),
            );
            fallback
        }
    }
}

/// Parse a URL-encoded query string; later duplicates win
pub fn parse_query(query: Option<&str>) -> Map<String, Value> {
    let mut params = Map::new();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let query = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.insert(key.into_owned(), Value::String(value.into_owned()));
        }
    }
    params
}

/// Pretty-printed JSON body when it parses, the raw text otherwise
pub fn body_preview(text: Option<&str>, blob_base64: Option<&str>) -> String {
    match non_empty(text) {
        Some(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
            Err(_) => text.to_string(),
        },
        None => blob_or_empty(blob_base64),
    }
}

/// The body exactly as stored
pub fn body_raw(text: Option<&str>, blob_base64: Option<&str>) -> String {
    match non_empty(text) {
        Some(text) => text.to_string(),
        None => blob_or_empty(blob_base64),
    }
}

/// `<n> bytes`, with a marker when the backend capped the stored body
pub fn size_caption(body_size: u64, truncated: bool) -> String {
    if truncated {
        format!("{} bytes (truncated)", body_size)
    } else {
        format!("{} bytes", body_size)
    }
}

/// Local time for display, `unknown` when absent
pub fn format_timestamp(timestamp: Option<&DateTime<Utc>>) -> String {
    match timestamp {
        Some(ts) => ts
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => UNKNOWN.to_string(),
    }
}

fn meta_line(received_at: Option<&DateTime<Utc>>, remote_ip: Option<&str>) -> String {
    format!(
        "{} · {}",
        format_timestamp(received_at),
        non_empty(remote_ip).unwrap_or(UNKNOWN)
    )
}

fn blob_or_empty(blob_base64: Option<&str>) -> String {
    match non_empty(blob_base64) {
        Some(blob) => format!("base64:{}", blob),
        None => EMPTY_MARKER.to_string(),
    }
}

fn pretty(map: Map<String, Value>) -> String {
    let value = Value::Object(map);
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(json: &str) -> RequestDetail {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_non_json_body_falls_back_to_raw() {
        let view = DetailView::derive(&detail(
            r#"{"id": 42, "method": "POST", "path": "/wh/t", "body_text": "not json", "body_size": 8}"#,
        ));
        assert_eq!(view.body_preview, "not json");
        assert_eq!(view.body_raw, "not json");
        assert_eq!(view.size_caption, "8 bytes");
    }

    #[test]
    fn test_json_body_is_pretty_printed() {
        assert_eq!(
            body_preview(Some(r#"{"a":1,"b":[true]}"#), None),
            "{\n  \"a\": 1,\n  \"b\": [\n    true\n  ]\n}"
        );
    }

    #[test]
    fn test_blob_only_body() {
        assert_eq!(body_preview(None, Some("AAEC")), "base64:AAEC");
        assert_eq!(body_preview(Some(""), Some("AAEC")), "base64:AAEC");
        assert_eq!(body_raw(None, Some("AAEC")), "base64:AAEC");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(body_preview(None, None), "(empty)");
        assert_eq!(body_preview(Some(""), Some("")), "(empty)");
        assert_eq!(body_raw(None, None), "(empty)");
    }

    #[test]
    fn test_headers_keep_backend_order() {
        let headers = pretty(parse_headers(Some(
            r#"{"x-b": "2", "content-type": "application/json"}"#,
        )));
        assert_eq!(
            headers,
            "{\n  \"x-b\": \"2\",\n  \"content-type\": \"application/json\"\n}"
        );
    }

    #[test]
    fn test_unparseable_headers_become_error_entry() {
        let expected = "{\n  \"error\": \"Unable to parse headers\"\n}";
        assert_eq!(pretty(parse_headers(Some("{broken"))), expected);
        assert_eq!(pretty(parse_headers(Some("[1, 2]"))), expected);
        assert_eq!(pretty(parse_headers(None)), expected);
    }

    #[test]
    fn test_query_parsing() {
        let params = parse_query(Some("a=1&b=hello%20world&a=2&flag"));
        assert_eq!(params.get("a"), Some(&Value::String("2".to_string())));
        assert_eq!(
            params.get("b"),
            Some(&Value::String("hello world".to_string()))
        );
        assert_eq!(params.get("flag"), Some(&Value::String(String::new())));

        assert_eq!(pretty(parse_query(None)), "{}");
        assert_eq!(pretty(parse_query(Some(""))), "{}");
    }

    #[test]
    fn test_size_caption_marks_truncation() {
        assert_eq!(size_caption(2_000_000, true), "2000000 bytes (truncated)");
        assert_eq!(size_caption(0, false), "0 bytes");
    }

    #[test]
    fn test_meta_line_unknowns() {
        let view = DetailView::derive(&detail(r#"{"id": 1}"#));
        assert_eq!(view.meta, "unknown · unknown");

        let view = DetailView::derive(&detail(
            r#"{"id": 1, "received_at": "2024-05-01T10:20:30+00:00", "remote_ip": "10.0.0.7"}"#,
        ));
        assert!(view.meta.ends_with(" · 10.0.0.7"));
        assert!(!view.meta.starts_with(UNKNOWN));
    }
}
