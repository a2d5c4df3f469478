//! Core protocol types for Snatch's wire format.
//!
//! Everything in this module is serialized, sent over the socket, and
//! deserialized on the other side. The game-specific vocabulary
//! (commands, events, snapshots) lives in [`crate::game`]; this module
//! holds identity and framing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Command, ServerEvent};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a connected player.
///
/// The server derives it from the connection id, so it is unique within
/// the process and changes when a client reconnects. Newtype over `u64`
/// so it can't be confused with a room id.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A room key: either a name chosen by the players (public rooms) or a
/// random hex token (private rooms).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the room key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RoomId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Recipient: who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event produced by a room.
///
/// Room operations return a list of `(Recipient, ServerEvent)` pairs and
/// the room actor delivers each one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every player currently connected to the room.
    All,

    /// One specific player (private notices, rules text).
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// SystemMessage: session-level messages
// ---------------------------------------------------------------------------

/// Messages that manage the connection and room membership rather than
/// the game itself.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
/// `{ "type": "JoinRoom", "nickname": "ann", "room": "lobby" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: "Put me in this room as `nickname`."
    /// `room: None` asks for a fresh private room.
    JoinRoom {
        nickname: String,
        #[serde(default)]
        room: Option<RoomId>,
    },

    /// Server → Client: "You're in." Carries the identity the server
    /// assigned so the client can recognise itself in snapshots.
    RoomJoined {
        room_id: RoomId,
        player_id: PlayerId,
        private: bool,
    },

    /// Client → Server: "I'm leaving my room (but keeping the socket)."
    LeaveRoom,

    /// Client → Server keep-alive. `client_time` is echoed back.
    Heartbeat { client_time: u64 },

    /// Server → Client keep-alive reply.
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Either direction: "I'm disconnecting."
    Disconnect { reason: String },

    /// Server → Client: "Something went wrong."
    /// `code` follows HTTP conventions (400 bad request, 404 not found, ...).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// The content of a frame.
///
/// `#[serde(tag = "type", content = "data")]` produces adjacently tagged
/// JSON, e.g. `{ "type": "Action", "data": { "command": "FLIP" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    /// Session plumbing (join, leave, heartbeat, errors).
    System(SystemMessage),

    /// Client → Server game command.
    Action(Command),

    /// Client → Server chat line. Lines starting with `/` are commands.
    Chat { text: String },

    /// Server → Client game output (chat notices, room snapshots).
    Event(ServerEvent),
}

/// The top-level frame. Every message on the wire is an `Envelope`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-direction sequence number, used for ordering diagnostics.
    pub seq: u64,

    /// What the frame carries.
    pub payload: Payload,
}
