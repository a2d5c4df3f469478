//! Error types for the room layer.
//!
//! Game rule violations are never errors: the room answers them with
//! chat notices. These are the infrastructure failures around a room.

use snatch_protocol::{PlayerId, RoomId};

/// Errors that can occur when talking to a room.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The player has never joined this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The room actor has stopped and its channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}
