//! # Snatch
//!
//! A multi-room word-snatching game server. Players flip letter tiles into
//! a shared center, claim words built from them, and steal each other's
//! words by extending them.
//!
//! This crate wires the layers together:
//!
//! ```text
//! snatch-transport (WebSocket) → snatch-protocol (Envelope, JSON)
//!     → snatch-session (registry) → snatch-room (one actor per room)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use snatch::prelude::*;
//!
//! # async fn run() -> Result<(), SnatchError> {
//! let server = SnatchServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .game_config(GameConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod logging;
mod server;

pub use config::ServerConfig;
pub use error::SnatchError;
pub use logging::init_logging;
pub use server::{SnatchServer, SnatchServerBuilder};

/// The types most servers and tests need.
pub mod prelude {
    pub use crate::{
        ServerConfig, SnatchError, SnatchServer, SnatchServerBuilder,
    };
    pub use snatch_protocol::{
        ChatMessage, Codec, Command, Envelope, JsonCodec, Payload, PlayerId,
        RoomId, RoomSnapshot, ServerEvent, SystemMessage,
    };
    pub use snatch_room::{Dictionary, GameConfig, WordList};
}
