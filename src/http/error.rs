//! Response and error shapes shared by the client and its interceptor.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A completed request with a success status.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub url: String,
    pub headers: HeaderMap,
    /// Body parsed as JSON. Non-JSON bodies are kept as a JSON string and an
    /// empty body is `null`.
    pub data: Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.data)
    }
}

/// A failed request.
#[derive(Debug)]
pub enum ApiError {
    /// No response was received (connection refused, timeout, invalid URL, ...).
    Transport(reqwest::Error),
    /// The server answered with a non-success status.
    Status {
        status: StatusCode,
        url: String,
        data: Value,
    },
}

impl ApiError {
    /// Status code of the response, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Transport(_) => None,
            ApiError::Status { status, .. } => Some(*status),
        }
    }

    /// Body of the response, if one was received.
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiError::Transport(_) => None,
            ApiError::Status { data, .. } => Some(data),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(e) => write!(f, "Request failed: {}", e),
            ApiError::Status { status, url, .. } => {
                write!(f, "HTTP {} from {}", status.as_u16(), url)
            }
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Transport(e) => Some(e),
            ApiError::Status { .. } => None,
        }
    }
}

pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
