//! JSON codec between raw transport text and typed protocol messages.
//!
//! Decoding is strict: a payload that is not a `{method, params}` envelope,
//! names a method this client does not know, or carries params that violate
//! the schema is an error. The session treats all of these as fatal, since
//! each one means the client and server disagree about the protocol.

use serde::Deserialize;

use crate::error::{Result, SessionError};
use crate::protocol::{ClientNote, ServerMethod, ServerNote};

/// Untyped `{method, params}` envelope, parsed before dispatching on the tag.
#[derive(Deserialize)]
struct Envelope {
    method: String,
    #[serde(default)]
    params: serde_json::Value,
}

/// Decode a raw inbound payload into a [`ServerNote`].
///
/// # Errors
///
/// - [`SessionError::Decode`] if the payload is not valid JSON, is not a
///   `{method, params}` object, or its params do not match the schema.
/// - [`SessionError::UnhandledMethod`] if the method tag is not one of
///   [`ServerMethod`].
pub fn decode_server_note(raw: &str) -> Result<ServerNote> {
    let envelope: Envelope =
        serde_json::from_str(raw).map_err(|source| SessionError::Decode { source })?;

    if ServerMethod::from_method(&envelope.method).is_none() {
        return Err(SessionError::UnhandledMethod {
            method: envelope.method,
        });
    }

    let value = serde_json::json!({
        "method": envelope.method,
        "params": envelope.params,
    });
    serde_json::from_value(value).map_err(|source| SessionError::Decode { source })
}

/// Encode a [`ClientNote`] for transmission.
///
/// # Errors
///
/// Returns [`SessionError::Serialization`] if the note cannot be serialized.
pub fn encode_client_note(note: &ClientNote) -> Result<String> {
    Ok(serde_json::to_string(note)?)
}
