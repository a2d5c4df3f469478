//! Error types for the session layer.

use snatch_protocol::PlayerId;
use snatch_room::RoomError;

/// Errors that can occur while routing a connection to its room.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection has not joined a room (or already left it).
    #[error("player {0} is not in any room")]
    NotRegistered(PlayerId),

    /// The room refused or could not be reached.
    #[error(transparent)]
    Room(#[from] RoomError),
}
