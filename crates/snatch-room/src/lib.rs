//! Room state machine and room actor for Snatch.
//!
//! A room is a table of players racing to build words from a shared pool
//! of letter tiles. Each room runs as an isolated Tokio task (actor
//! model); nothing outside the actor touches its state.
//!
//! # Key types
//!
//! - [`Room`]: the game rules; synchronous and I/O-free
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`spawn_room`]: start an actor for a room
//! - [`LetterPool`], [`Player`], [`ClaimLock`], [`TurnTracker`]: the
//!   pieces a room is built from
//! - [`Dictionary`], [`Scoring`]: pluggable word validation and scoring
//! - [`GameConfig`]: timeouts and limits

mod config;
mod dictionary;
mod error;
mod game;
mod lock;
mod player;
mod pool;
mod room;
mod scoring;
mod turn;

pub use config::GameConfig;
pub use dictionary::{Dictionary, WordList};
pub use error::RoomError;
pub use game::{Outbox, RULES, Room};
pub use lock::ClaimLock;
pub use player::Player;
pub use pool::{LETTER_DISTRIBUTION, LetterPool};
pub use room::{PlayerSender, RoomHandle, RoomInfo, spawn_room};
pub use scoring::{LengthScoring, Scoring};
pub use turn::TurnTracker;
