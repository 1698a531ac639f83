//! The remote API wraps every payload as `{success, message, data}` and
//! reports failures as a non-2xx status with at least `{message}` in the body.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ClientError};

const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    data: Value,
}

fn default_success() -> bool {
    true
}

/// Decode a response body into `data`, or into the normalized error shape.
pub fn decode_body(status: u16, body: &[u8]) -> Result<Value, ClientError> {
    if !(200..300).contains(&status) {
        return Err(ClientError::Api(error_from_body(status, body)));
    }

    let envelope: RawEnvelope = serde_json::from_slice(body).map_err(|e| {
        ClientError::Protocol(format!("Malformed response envelope (HTTP {status}): {e}"))
    })?;

    if !envelope.success {
        let message = envelope
            .message
            .as_ref()
            .and_then(flatten_message)
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        return Err(ClientError::Api(ApiError::new(message, status)));
    }

    Ok(envelope.data)
}

/// Build `{message, statusCode}` from an error response.
///
/// `message` may be a string or a list of strings; anything unparseable
/// falls back to the status's canonical reason.
pub fn error_from_body(status: u16, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(flatten_message))
        .or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
    ApiError::new(message, status)
}

fn flatten_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(", "))
            }
        }
        _ => None,
    }
}

pub fn decode_data<T: DeserializeOwned>(data: Value) -> Result<T, ClientError> {
    serde_json::from_value(data)
        .map_err(|e| ClientError::Protocol(format!("Unexpected response data: {e}")))
}
