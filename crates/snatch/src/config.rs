//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use snatch_room::GameConfig;

/// Where the server listens, where its word list lives, and how its rooms
/// play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address for the WebSocket listener, e.g. `"0.0.0.0:8080"`.
    pub bind_addr: String,

    /// Newline-separated word list.
    pub dictionary_path: PathBuf,

    /// A connection that sends nothing for this long is dropped. Clients
    /// keep idle sockets open with heartbeats.
    pub idle_timeout: Duration,

    /// Settings handed to every room.
    pub game: GameConfig,
}

impl ServerConfig {
    pub const DEFAULT_BIND_ADDR: &'static str = "127.0.0.1:8080";
    pub const DEFAULT_DICTIONARY_PATH: &'static str = "/usr/share/dict/words";
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: Self::DEFAULT_BIND_ADDR.to_string(),
            dictionary_path: PathBuf::from(Self::DEFAULT_DICTIONARY_PATH),
            idle_timeout: Self::DEFAULT_IDLE_TIMEOUT,
            game: GameConfig::default(),
        }
    }
}
