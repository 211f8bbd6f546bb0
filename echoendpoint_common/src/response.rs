//! Canned response settings for an endpoint

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Status codes offered by the response settings, with reason labels
pub const STATUS_OPTIONS: &[(u16, &str)] = &[
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (204, "No Content"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (304, "Not Modified"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (409, "Conflict"),
    (422, "Unprocessable Entity"),
    (429, "Too Many Requests"),
    (500, "Internal Server Error"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
];

/// Content types the backend will answer with
pub const CONTENT_TYPES: &[&str] = &[
    "application/json",
    "text/plain",
    "text/html",
    "application/xml",
    "application/x-www-form-urlencoded",
    "application/octet-stream",
];

pub const DEFAULT_STATUS_CODE: u16 = 200;
pub const DEFAULT_BODY: &str = r#"{"message":"ok"}"#;
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Rejections raised before a settings change reaches the network
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResponseConfigError {
    #[error("Status code {0} is outside 100-599")]
    InvalidStatusCode(u16),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
}

/// Stored response configuration as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseConfig {
    pub status_code: u16,
    pub body: Value,
    #[serde(default)]
    pub content_type: Option<String>,
}

impl ResponseConfig {
    /// The response the backend falls back to when nothing is configured
    pub fn fallback() -> Self {
        Self {
            status_code: DEFAULT_STATUS_CODE,
            body: Value::String(DEFAULT_BODY.to_string()),
            content_type: Some(DEFAULT_CONTENT_TYPE.to_string()),
        }
    }

    /// Body as editable text; non-string bodies are pretty-printed
    pub fn body_text(&self) -> String {
        match &self.body {
            Value::String(s) => s.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }

    /// `200 - OK` style caption; unknown codes are shown bare
    pub fn status_caption(&self) -> String {
        match status_label(self.status_code) {
            Some(label) => format!("{} - {}", self.status_code, label),
            None => self.status_code.to_string(),
        }
    }
}

/// Settings change sent with `PUT`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseConfigUpdate {
    pub status_code: u16,
    pub body: String,
    pub content_type: String,
}

impl ResponseConfigUpdate {
    /// Validate and build an update; nothing invalid ever leaves the client
    pub fn new(
        status_code: u16,
        body: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Result<Self, ResponseConfigError> {
        validate_status_code(status_code)?;
        let content_type = content_type.into();
        if !CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(ResponseConfigError::UnsupportedContentType(content_type));
        }
        Ok(Self {
            status_code,
            body: body.into(),
            content_type,
        })
    }
}

/// Status codes must be in 100-599
pub fn validate_status_code(status_code: u16) -> Result<(), ResponseConfigError> {
    if (100..=599).contains(&status_code) {
        Ok(())
    } else {
        Err(ResponseConfigError::InvalidStatusCode(status_code))
    }
}

/// Reason label for one of the offered status codes
pub fn status_label(status_code: u16) -> Option<&'static str> {
    STATUS_OPTIONS
        .iter()
        .find(|(code, _)| *code == status_code)
        .map(|(_, label)| *label)
}
