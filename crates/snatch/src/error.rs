//! Unified error type for the Snatch server.

use snatch_protocol::ProtocolError;
use snatch_room::RoomError;
use snatch_session::SessionError;
use snatch_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SnatchError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (player not in any room).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, actor gone).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Reading the dictionary file failed.
    #[error("dictionary: {0}")]
    Dictionary(#[from] std::io::Error),
}

impl SnatchError {
    /// The HTTP-style status code reported to clients in an `Error` frame.
    pub fn code(&self) -> u16 {
        match self {
            Self::Protocol(_) => 400,
            Self::Session(SessionError::NotRegistered(_)) => 409,
            Self::Session(SessionError::Room(e)) | Self::Room(e) => match e {
                RoomError::NotFound(_) | RoomError::NotInRoom(..) => 404,
                RoomError::Unavailable(_) => 503,
            },
            Self::Transport(_) | Self::Dictionary(_) => 500,
        }
    }
}
