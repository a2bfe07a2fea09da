//! Response payload decoding.
//!
//! The client does not interpret payload shapes. A body is handed back as
//! the server sent it: JSON when it parses, a string when it does not,
//! `null` when empty.

use serde_json::Value;
use tracing::debug;

use crate::http::error::{HttpError, HttpResult};

/// Decoded server payload.
pub type Payload = Value;

/// Read a response, mapping non-2xx statuses to [`HttpError::Status`].
///
/// A non-2xx response whose body cannot be read is still a status error,
/// with a `null` body.
pub async fn read_payload(response: reqwest::Response) -> HttpResult<Payload> {
    let status = response.status();
    let url = response.url().to_string();
    let bytes = match response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) if !status.is_success() => {
            debug!(status = status.as_u16(), error = %e, "Error body could not be read");
            return Err(HttpError::Status {
                status,
                url,
                body: Value::Null,
            });
        }
        Err(e) => return Err(e.into()),
    };
    let body = decode_body(&bytes);

    if status.is_success() {
        Ok(body)
    } else {
        Err(HttpError::Status { status, url, body })
    }
}

/// Decode a raw response body.
pub fn decode_body(bytes: &[u8]) -> Payload {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}
