//! Error types for the protocol layer.
//!
//! Each Snatch crate defines its own error enum, so a `ProtocolError`
//! always means "the bytes or the message shape were wrong", never a
//! networking or game-rule problem.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, an unknown
    /// `type` tag, or a truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, e.g. a game
    /// action sent before the connection joined a room.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
