//! Mapping from failed-response status codes to user-facing notifications.
//!
//! Classification is pure: it looks at the status and body only. Acting on
//! the result is the interceptor's job.

use reqwest::StatusCode;
use serde_json::Value;

/// Status codes that are reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Unauthorized,
    NotFound,
    ServerError,
}

/// Whether a failure ends the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Keep,
    Invalidate,
}

/// How the message value is turned into notification text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rendering {
    /// Strings verbatim, anything else JSON-serialized.
    Raw,
    /// Always JSON-serialized, so strings keep their quotes.
    Serialized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ErrorKind,
    pub message: String,
    pub session_action: SessionAction,
}

impl ErrorKind {
    pub fn from_status(status: StatusCode) -> Option<Self> {
        match status {
            StatusCode::BAD_REQUEST => Some(ErrorKind::BadRequest),
            StatusCode::UNAUTHORIZED => Some(ErrorKind::Unauthorized),
            StatusCode::NOT_FOUND => Some(ErrorKind::NotFound),
            StatusCode::INTERNAL_SERVER_ERROR => Some(ErrorKind::ServerError),
            _ => None,
        }
    }

    /// Message used when the body carries no usable `error` field.
    pub fn fallback_message(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Invalid credentials",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::ServerError => "Internal ServerError",
        }
    }

    pub fn session_action(self) -> SessionAction {
        match self {
            ErrorKind::Unauthorized => SessionAction::Invalidate,
            _ => SessionAction::Keep,
        }
    }

    fn rendering(self) -> Rendering {
        match self {
            ErrorKind::BadRequest | ErrorKind::ServerError => Rendering::Serialized,
            ErrorKind::Unauthorized | ErrorKind::NotFound => Rendering::Raw,
        }
    }
}

/// Classifies a failed response. Returns `None` for statuses that are passed
/// through without any side effect.
pub fn classify(status: StatusCode, data: &Value) -> Option<Classification> {
    let kind = ErrorKind::from_status(status)?;

    let fallback = Value::String(kind.fallback_message().to_string());
    let value = error_field(data).unwrap_or(&fallback);

    let message = match kind.rendering() {
        Rendering::Raw => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        Rendering::Serialized => value.to_string(),
    };

    Some(Classification {
        kind,
        message,
        session_action: kind.session_action(),
    })
}

/// The body's `error` field, when it is present and truthy.
fn error_field(data: &Value) -> Option<&Value> {
    data.as_object()?.get("error").filter(|v| is_truthy(v))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
