//! EchoEndpoint Common - Wire contract for the webhook inbox backend
//!
//! This crate holds the request/response shapes served by the capture
//! backend, the route table, and the canned-response settings rules used by
//! the CLI before anything is sent over the network.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub mod response;

pub use response::{ResponseConfig, ResponseConfigError, ResponseConfigUpdate};

/// Wire decoding errors
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Body blob is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Opaque identifier of a captured request.
///
/// The backend hands out integer row ids today; string ids are accepted so
/// the client never has to care.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    Text(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{}", n),
            RequestId::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for RequestId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i64>() {
            Ok(n) => RequestId::Number(n),
            Err(_) => RequestId::Text(s.to_string()),
        })
    }
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        RequestId::Number(n)
    }
}

/// One row of the inbox list.
///
/// Page items and pushed `request_received` payloads decode into this same
/// shape; extra fields sent by the list endpoint are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub id: RequestId,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl RequestSummary {
    /// Decode a pushed event payload
    pub fn from_event_data(data: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Method for display, `N/A` when the backend sent none
    pub fn display_method(&self) -> &str {
        match self.method.as_deref() {
            Some(m) if !m.is_empty() => m,
            _ => "N/A",
        }
    }

    /// Path for display, `/` when the backend sent none
    pub fn display_path(&self) -> &str {
        match self.path.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => "/",
        }
    }
}

/// One page of the request list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPage {
    pub items: Vec<RequestSummary>,
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

/// Full detail of a captured request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDetail {
    pub id: RequestId,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub received_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remote_ip: Option<String>,
    /// Request headers as a JSON object serialized to a string
    #[serde(default)]
    pub headers_json: Option<String>,
    /// Raw query string without the leading `?`
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub body_text: Option<String>,
    #[serde(default)]
    pub body_blob_base64: Option<String>,
    #[serde(default)]
    pub body_size: u64,
    #[serde(default, with = "flag_serde")]
    pub truncated: bool,
}

impl RequestDetail {
    /// Decode the stored body blob.
    ///
    /// Falls back to the text body when no blob was stored.
    pub fn body_bytes(&self) -> Result<Vec<u8>, WireError> {
        match self.body_blob_base64.as_deref() {
            Some(blob) if !blob.is_empty() => Ok(STANDARD.decode(blob)?),
            _ => Ok(self
                .body_text
                .as_deref()
                .map(|t| t.as_bytes().to_vec())
                .unwrap_or_default()),
        }
    }

    /// The list row this detail corresponds to
    pub fn summary(&self) -> RequestSummary {
        RequestSummary {
            id: self.id.clone(),
            received_at: self.received_at,
            method: Some(self.method.clone()),
            path: Some(self.path.clone()),
        }
    }
}

/// The backend stores `truncated` as a SQLite integer; accept 0/1 as well as
/// a real boolean.
mod flag_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bool(*value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Flag>::deserialize(deserializer)? {
            Some(Flag::Bool(b)) => b,
            Some(Flag::Int(n)) => n != 0,
            None => false,
        })
    }
}

/// Backend route table
pub mod routes {
    use super::RequestId;

    /// Paginated request list for an endpoint
    pub fn list(token: &str) -> String {
        format!("/api/endpoints/{}/requests", token)
    }

    /// Detail of a single captured request
    pub fn detail(id: &RequestId) -> String {
        format!("/api/requests/{}", id)
    }

    /// Destructive clear of all captured requests
    pub fn clear(token: &str) -> String {
        format!("/api/endpoints/{}/clear", token)
    }

    /// JSON export of every captured request
    pub fn export(token: &str) -> String {
        format!("/api/endpoints/{}/export", token)
    }

    /// Canned response configuration
    pub fn response(token: &str) -> String {
        format!("/api/endpoints/{}/response", token)
    }

    /// Server-sent event stream
    pub fn events(token: &str) -> String {
        format!("/events/{}", token)
    }

    /// Endpoint creation (answers with a redirect to the dashboard)
    pub const CREATE: &str = "/create";

    /// Prefix of the dashboard path that carries the token
    pub const DASHBOARD_PREFIX: &str = "/e/";

    /// Web dashboard for an endpoint
    pub fn dashboard(token: &str) -> String {
        format!("{}{}", DASHBOARD_PREFIX, token)
    }

    /// Public capture URL that webhooks are pointed at
    pub fn webhook(token: &str) -> String {
        format!("/wh/{}", token)
    }
}

/// Constants for the protocol
pub mod constants {
    /// SSE event name for a newly captured request
    pub const REQUEST_RECEIVED_EVENT: &str = "request_received";

    /// Page size used when the config does not override it
    pub const DEFAULT_PAGE_LIMIT: u32 = 200;

    /// Largest body the backend stores before truncating (bytes)
    pub const MAX_STORED_BODY_BYTES: u64 = 1_048_576;

    /// Default backend URL for a local deployment
    pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_from_event_payload() {
        let summary = RequestSummary::from_event_data(
            r#"{"id": 42, "received_at": "2024-05-01T10:20:30.123456+00:00", "method": "POST", "path": "/wh/abc"}"#,
        )
        .unwrap();

        assert_eq!(summary.id, RequestId::Number(42));
        assert_eq!(summary.display_method(), "POST");
        assert_eq!(summary.display_path(), "/wh/abc");
        assert!(summary.received_at.is_some());
    }

    #[test]
    fn test_summary_display_fallbacks() {
        let summary =
            RequestSummary::from_event_data(r#"{"id": "abc", "received_at": null}"#).unwrap();
        assert_eq!(summary.id, RequestId::Text("abc".to_string()));
        assert_eq!(summary.display_method(), "N/A");
        assert_eq!(summary.display_path(), "/");
        assert!(summary.received_at.is_none());
    }

    #[test]
    fn test_malformed_event_payload() {
        assert!(RequestSummary::from_event_data("not json").is_err());
        assert!(RequestSummary::from_event_data(r#"{"method": "GET"}"#).is_err());
    }

    #[test]
    fn test_list_page_ignores_extra_fields() {
        let page: ListPage = serde_json::from_str(
            r#"{"items": [{"id": 1, "received_at": "2024-05-01T10:20:30+00:00", "method": "GET",
                "path": "/wh/t", "query": "a=1", "content_type": null, "remote_ip": "127.0.0.1",
                "user_agent": "curl", "truncated": 0, "body_size": 0}], "limit": 200, "offset": 0}"#,
        )
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.limit, 200);
    }

    #[test]
    fn test_detail_truncated_flag_accepts_int_and_bool() {
        let as_int: RequestDetail =
            serde_json::from_str(r#"{"id": 1, "truncated": 1, "body_size": 10}"#).unwrap();
        assert!(as_int.truncated);

        let as_bool: RequestDetail =
            serde_json::from_str(r#"{"id": 1, "truncated": false}"#).unwrap();
        assert!(!as_bool.truncated);

        let missing: RequestDetail = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(!missing.truncated);
        assert_eq!(missing.body_size, 0);
    }

    #[test]
    fn test_detail_body_bytes() {
        let detail: RequestDetail = serde_json::from_str(
            r#"{"id": 7, "body_text": "hi", "body_blob_base64": "AAEC"}"#,
        )
        .unwrap();
        assert_eq!(detail.body_bytes().unwrap(), vec![0u8, 1, 2]);

        let text_only: RequestDetail =
            serde_json::from_str(r#"{"id": 7, "body_text": "hi", "body_blob_base64": ""}"#)
                .unwrap();
        assert_eq!(text_only.body_bytes().unwrap(), b"hi".to_vec());

        let broken: RequestDetail =
            serde_json::from_str(r#"{"id": 7, "body_blob_base64": "***"}"#).unwrap();
        assert!(broken.body_bytes().is_err());
    }

    #[test]
    fn test_request_id_parse() {
        assert_eq!("17".parse::<RequestId>().unwrap(), RequestId::Number(17));
        assert_eq!(
            "req_17".parse::<RequestId>().unwrap(),
            RequestId::Text("req_17".to_string())
        );
        assert_eq!(RequestId::Number(17).to_string(), "17");
    }

    #[test]
    fn test_routes() {
        assert_eq!(routes::list("tok"), "/api/endpoints/tok/requests");
        assert_eq!(routes::detail(&RequestId::Number(3)), "/api/requests/3");
        assert_eq!(routes::events("tok"), "/events/tok");
        assert_eq!(routes::dashboard("tok"), "/e/tok");
        assert_eq!(routes::webhook("tok"), "/wh/tok");
    }
}
