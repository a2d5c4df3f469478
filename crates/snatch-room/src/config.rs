//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    /// How long the player whose turn it is may wait before the turn
    /// passes to the next active player.
    pub turn_timeout: Duration,

    /// How long a claim lock is held before it releases on its own.
    pub lock_timeout: Duration,

    /// Period of the snapshot broadcast. `Duration::ZERO` disables it;
    /// snapshots are then only sent after commands.
    pub snapshot_interval: Duration,

    /// Shortest word accepted without a dictionary override.
    pub min_word_length: usize,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(15),
            lock_timeout: Duration::from_secs(30),
            snapshot_interval: Duration::from_secs(2),
            min_word_length: 3,
            channel_size: 64,
        }
    }
}
