//! Per-connection player state inside a room.

use std::collections::BTreeSet;

use snatch_protocol::{PlayerId, PlayerView};

/// A player seated in a room.
///
/// Players who leave stay in the room (inactive, done) until the round
/// resets, so their words keep counting until then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub active: bool,
    pub done: bool,
    pub score: u32,
    /// Upper-case words this player owns.
    words: BTreeSet<String>,
}

impl Player {
    pub fn new(id: PlayerId, nickname: impl Into<String>) -> Self {
        Self {
            id,
            nickname: nickname.into(),
            active: true,
            done: false,
            score: 0,
            words: BTreeSet::new(),
        }
    }

    /// Case-insensitive ownership check.
    pub fn has_word(&self, word: &str) -> bool {
        self.words.contains(&word.to_ascii_uppercase())
    }

    /// Adds a word worth `points`. Returns `false` (and changes nothing)
    /// if the player already owns it.
    pub fn add_word(&mut self, word: &str, points: u32) -> bool {
        if !self.words.insert(word.to_ascii_uppercase()) {
            return false;
        }
        self.score += points;
        true
    }

    /// Removes a word worth `points`. Returns `false` if not owned.
    pub fn remove_word(&mut self, word: &str, points: u32) -> bool {
        if !self.words.remove(&word.to_ascii_uppercase()) {
            return false;
        }
        self.score = self.score.saturating_sub(points);
        true
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Total letters across all owned words.
    pub fn letter_count(&self) -> usize {
        self.words.iter().map(|w| w.chars().count()).sum()
    }

    /// Clears words, score and the done flag for a new round.
    pub fn reset_round(&mut self) {
        self.words.clear();
        self.score = 0;
        self.done = false;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            player_id: self.id,
            nickname: self.nickname.clone(),
            active: self.active,
            done: self.done,
            score: self.score,
            words: self.words.iter().cloned().collect(),
        }
    }
}
