//! Game vocabulary: the commands a player can issue in a room, the events
//! a room sends back, and the periodic room snapshot.

use serde::{Deserialize, Serialize};

use crate::{PlayerId, RoomId};

// ---------------------------------------------------------------------------
// Command: client → room
// ---------------------------------------------------------------------------

/// A game command addressed to the sender's current room.
///
/// Serialized with the command name as an internal tag, matching the names
/// players type after a slash:
///
/// ```json
/// {"command": "STEAL_WORD", "victim": 3, "old_word": "cat", "new_word": "cats"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Reveal the next hidden tile. Only the player whose turn it is.
    Flip,

    /// Claim a word from the center tiles. Claim-lock holder only.
    CreateWord { word: String },

    /// Extend `victim`'s `old_word` with center tiles into `new_word`.
    /// Claim-lock holder only.
    StealWord {
        victim: PlayerId,
        old_word: String,
        new_word: String,
    },

    /// Give one of your own words back to the center.
    Return { word: String },

    /// Add a word to the room dictionary (private rooms only).
    Override { word: String },

    /// Force a new round (private rooms only).
    Reset,

    /// Declare that you have nothing more to play this round.
    Done,

    /// Acquire the claim lock.
    PauseGame,

    /// Release the claim lock.
    UnpauseGame,

    /// Ask for the rules text.
    Rules,

    /// Anything the server doesn't recognise.
    #[serde(other)]
    Unknown,
}

impl Command {
    /// Parses a chat line of the form `/name arg...`.
    ///
    /// Returns `None` when the line is plain chat. Unknown names and
    /// commands missing their arguments parse as [`Command::Unknown`].
    pub fn parse_slash(line: &str) -> Option<Self> {
        let rest = line.trim().strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default().to_ascii_uppercase();
        let args: Vec<&str> = parts.collect();

        let command = match (name.as_str(), args.as_slice()) {
            ("FLIP", _) => Self::Flip,
            ("CREATE" | "CREATE_WORD", [word, ..]) => Self::CreateWord {
                word: word.to_string(),
            },
            ("STEAL" | "STEAL_WORD", [victim, old_word, new_word, ..]) => {
                match victim.trim_start_matches("P-").parse::<u64>() {
                    Ok(id) => Self::StealWord {
                        victim: PlayerId(id),
                        old_word: old_word.to_string(),
                        new_word: new_word.to_string(),
                    },
                    Err(_) => Self::Unknown,
                }
            }
            ("RETURN", [word, ..]) => Self::Return {
                word: word.to_string(),
            },
            ("OVERRIDE", [word, ..]) => Self::Override {
                word: word.to_string(),
            },
            ("RESET", _) => Self::Reset,
            ("DONE", _) => Self::Done,
            ("PAUSE" | "PAUSE_GAME", _) => Self::PauseGame,
            ("UNPAUSE" | "UNPAUSE_GAME", _) => Self::UnpauseGame,
            ("RULES", _) => Self::Rules,
            _ => Self::Unknown,
        };
        Some(command)
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Flip => "FLIP",
            Self::CreateWord { .. } => "CREATE_WORD",
            Self::StealWord { .. } => "STEAL_WORD",
            Self::Return { .. } => "RETURN",
            Self::Override { .. } => "OVERRIDE",
            Self::Reset => "RESET",
            Self::Done => "DONE",
            Self::PauseGame => "PAUSE_GAME",
            Self::UnpauseGame => "UNPAUSE_GAME",
            Self::Rules => "RULES",
            Self::Unknown => "UNKNOWN",
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent: room → client
// ---------------------------------------------------------------------------

/// A line in the room's chat log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ChatMessage {
    /// A server notice everybody in the room sees.
    Server { text: String },

    /// A server notice only the recipient sees.
    Private { text: String },

    /// Something a player typed.
    Player {
        player_id: PlayerId,
        nickname: String,
        text: String,
    },
}

impl ChatMessage {
    /// The message body regardless of kind.
    pub fn text(&self) -> &str {
        match self {
            Self::Server { text }
            | Self::Private { text }
            | Self::Player { text, .. } => text,
        }
    }
}

/// Everything a room pushes to its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ServerEvent {
    /// A chat line or notice.
    Message(ChatMessage),

    /// The full visible state of the room.
    Snapshot(RoomSnapshot),
}

/// One player as seen in a [`RoomSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub nickname: String,
    pub active: bool,
    pub done: bool,
    pub score: u32,
    pub words: Vec<String>,
}

/// The state broadcast after every command and on the periodic timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    /// "Private Game" or "Public Game".
    pub room_name: String,
    pub room_id: RoomId,
    pub unflipped_count: usize,
    pub flipped: Vec<char>,
    pub players: Vec<PlayerView>,
    /// Whose turn it is to flip, `None` when nobody is active.
    pub current_player: Option<PlayerId>,
    /// Claim-lock holder.
    pub paused_player: Option<PlayerId>,
    pub paused: bool,
    pub private: bool,
}
