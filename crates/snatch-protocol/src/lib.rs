//! Wire protocol for Snatch.
//!
//! This crate defines the "language" that clients and the game server
//! speak:
//!
//! - **Identity** ([`PlayerId`], [`RoomId`]): who is talking and where.
//! - **Game messages** ([`Command`], [`ServerEvent`], [`RoomSnapshot`]):
//!   what players ask the room to do and what the room tells them.
//! - **Envelope** ([`Envelope`], [`Payload`], [`SystemMessage`]): the
//!   framing that travels on the socket.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes become bytes.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Session registry → Room
//! ```
//!
//! The protocol layer knows nothing about connections or rooms; it only
//! describes and (de)serializes messages.

mod codec;
mod error;
mod game;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use game::{ChatMessage, Command, PlayerView, RoomSnapshot, ServerEvent};
pub use types::{Envelope, Payload, PlayerId, Recipient, RoomId, SystemMessage};
