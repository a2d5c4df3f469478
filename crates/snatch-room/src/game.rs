//! The room state machine.
//!
//! [`Room`] owns the pool, the seats, the turn tracker and the claim lock,
//! and is the only thing that mutates them. Every entry point takes the
//! acting player, applies the game rules, and pushes the resulting
//! notices onto an [`Outbox`]; nothing here fails with an error. Rule
//! violations are answered with notices or silently ignored.
//!
//! The room does no I/O and owns no tasks. Its two deadlines are plain
//! data that the room actor polls; see [`crate::room`].

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use snatch_protocol::{
    ChatMessage, Command, PlayerId, Recipient, RoomId, RoomSnapshot,
    ServerEvent,
};
use snatch_timer::Deadline;

use crate::{
    ClaimLock, Dictionary, GameConfig, LengthScoring, LetterPool, Player,
    Scoring, TurnTracker,
};

/// Events produced by one room operation, in delivery order.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// Sent privately in reply to `RULES`.
pub const RULES: &str = "\
Take turns flipping tiles into the center with /flip. \
Anyone can grab the table at any time with /pause, then claim a word made \
from center tiles with /create WORD, or steal another player's word by \
adding center tiles to it with /steal ID OLD NEW, where ID is the \
victim's player id from the scoreboard (e.g. 4 or P-4). \
Release the table with /unpause when you're done. \
Words must be real and at least 3 letters long. \
Use /return WORD to give a word back, and /done when you see nothing left. \
When everyone is done, the player with the most points wins.";

const PRIVATE_ONLY: &str = "You can't use that command in a public room!";

fn broadcast(out: &mut Outbox, text: impl Into<String>) {
    out.push((
        Recipient::All,
        ServerEvent::Message(ChatMessage::Server { text: text.into() }),
    ));
}

fn private(out: &mut Outbox, player: PlayerId, text: impl Into<String>) {
    out.push((
        Recipient::Player(player),
        ServerEvent::Message(ChatMessage::Private { text: text.into() }),
    ));
}

/// Letters of `new_word` left over once every letter of `old_word` is
/// matched one-for-one. `None` when `old_word` is not covered or nothing
/// is left over.
fn letter_difference(new_word: &str, old_word: &str) -> Option<String> {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for letter in new_word.chars() {
        *counts.entry(letter).or_default() += 1;
    }
    for letter in old_word.chars() {
        let count = counts.get_mut(&letter).filter(|n| **n > 0)?;
        *count -= 1;
    }
    let difference: String = counts
        .into_iter()
        .flat_map(|(letter, n)| std::iter::repeat_n(letter, n))
        .collect();
    (!difference.is_empty()).then_some(difference)
}

/// Seat filter for the turn tracker.
fn is_active(
    players: &HashMap<PlayerId, Player>,
) -> impl Fn(PlayerId) -> bool + '_ {
    move |id| players.get(&id).is_some_and(|p| p.active)
}

/// "A", "A and B", "A, B, and C".
fn english_list(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => (*one).to_string(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

/// One game room.
pub struct Room {
    id: RoomId,
    private: bool,
    config: GameConfig,
    players: HashMap<PlayerId, Player>,
    /// Seating order. No duplicates.
    player_order: Vec<PlayerId>,
    pool: LetterPool,
    turn: TurnTracker,
    lock: ClaimLock,
    /// Extra accepted words, lower-case. Private rooms only.
    overrides: HashSet<String>,
    dictionary: Arc<dyn Dictionary>,
    scoring: Arc<dyn Scoring>,
}

impl Room {
    /// A room with a freshly shuffled pool and length scoring.
    pub fn new(
        id: RoomId,
        private: bool,
        config: GameConfig,
        dictionary: Arc<dyn Dictionary>,
    ) -> Self {
        Self {
            id,
            private,
            turn: TurnTracker::new(config.turn_timeout),
            lock: ClaimLock::new(config.lock_timeout),
            config,
            players: HashMap::new(),
            player_order: Vec::new(),
            pool: LetterPool::shuffled(),
            overrides: HashSet::new(),
            dictionary,
            scoring: Arc::new(LengthScoring),
        }
    }

    /// Replaces the scoring policy.
    pub fn with_scoring(mut self, scoring: Arc<dyn Scoring>) -> Self {
        self.scoring = scoring;
        self
    }

    /// Replaces the current round's pool.
    pub fn with_pool(mut self, pool: LetterPool) -> Self {
        self.pool = pool;
        self
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Players in seating order.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.player_order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn player_order(&self) -> &[PlayerId] {
        &self.player_order
    }

    pub fn pool(&self) -> &LetterPool {
        &self.pool
    }

    pub fn active_count(&self) -> usize {
        self.players.values().filter(|p| p.active).count()
    }

    /// Whose turn it is to flip.
    pub fn current_player(&self) -> Option<PlayerId> {
        self.turn
            .current(&self.player_order, is_active(&self.players))
    }

    pub fn lock_holder(&self) -> Option<PlayerId> {
        self.lock.holder()
    }

    /// `true` iff somebody holds the claim lock.
    pub fn is_paused(&self) -> bool {
        self.lock.is_held()
    }

    pub fn turn_deadline(&self) -> &Deadline {
        self.turn.deadline()
    }

    pub fn lock_deadline(&self) -> &Deadline {
        self.lock.deadline()
    }

    /// Whether some player owns `word` (case-insensitive).
    pub fn is_owned(&self, word: &str) -> bool {
        self.players.values().any(|p| p.has_word(word))
    }

    fn nickname(&self, id: PlayerId) -> &str {
        self.players.get(&id).map_or("someone", |p| p.nickname.as_str())
    }

    fn is_seated_and_active(&self, id: PlayerId) -> bool {
        self.players.get(&id).is_some_and(|p| p.active)
    }

    // -- membership ---------------------------------------------------------

    /// Seats a player, or re-activates one who already has a seat.
    pub fn join(&mut self, id: PlayerId, nickname: &str) -> Outbox {
        let mut out = Outbox::new();
        match self.players.get_mut(&id) {
            Some(player) => {
                player.active = true;
                player.done = false;
                player.nickname = nickname.to_string();
            }
            None => {
                self.players.insert(id, Player::new(id, nickname));
                self.player_order.push(id);
            }
        }
        tracing::info!(
            room_id = %self.id, player_id = %id, nickname, "player joined"
        );
        broadcast(&mut out, format!("{nickname} has joined the room!"));

        let idle = !self.turn.deadline().is_armed();
        if self.active_count() > 1 && idle && self.pool.unflipped_len() > 0 {
            self.turn.arm();
        }
        out
    }

    /// Marks a player inactive and done. Their seat and words stay until
    /// the round resets.
    pub fn leave(&mut self, id: PlayerId) -> Outbox {
        let mut out = Outbox::new();
        let was_current = self.current_player() == Some(id);
        let Some(player) = self.players.get_mut(&id) else {
            tracing::warn!(
                room_id = %self.id, player_id = %id, "leave from unknown player"
            );
            return out;
        };
        if !player.active {
            return out;
        }
        player.active = false;
        player.done = true;
        let nickname = player.nickname.clone();

        if self.lock.release(id) {
            tracing::debug!(
                room_id = %self.id,
                player_id = %id,
                "claim lock released by departing holder"
            );
        }

        match self.active_count() {
            0 => self.shutdown(),
            1 => self.turn.disarm(),
            _ if was_current && self.turn.deadline().is_armed() => {
                self.turn.arm();
            }
            _ => {}
        }

        let active = self.active_count();
        tracing::info!(
            room_id = %self.id, player_id = %id, active, "player left"
        );
        broadcast(&mut out, format!("{nickname} has left the room!"));
        out
    }

    /// Cancels both deadlines. The actor calls this once before exiting.
    pub fn shutdown(&mut self) {
        self.turn.disarm();
        self.lock.clear();
    }

    // -- commands -----------------------------------------------------------

    /// Applies a game command from `sender`.
    pub fn handle_command(
        &mut self,
        sender: PlayerId,
        command: Command,
    ) -> Outbox {
        let mut out = Outbox::new();
        let name = command.name();
        if !self.is_seated_and_active(sender) {
            tracing::warn!(
                room_id = %self.id,
                player_id = %sender,
                command = name,
                "command from non-member"
            );
            return out;
        }
        tracing::debug!(
            room_id = %self.id, player_id = %sender, command = name, "command"
        );

        match command {
            Command::Flip => {
                self.flip(sender, &mut out);
            }
            Command::CreateWord { word } => {
                if self.lock.is_held_by(sender) {
                    self.create_word(sender, &word, &mut out);
                } else {
                    tracing::debug!(
                        room_id = %self.id,
                        player_id = %sender,
                        "create without claim lock ignored"
                    );
                }
            }
            Command::StealWord {
                victim,
                old_word,
                new_word,
            } => {
                if self.lock.is_held_by(sender) {
                    let (old, new) = (&old_word, &new_word);
                    self.steal_word(sender, victim, old, new, &mut out);
                } else {
                    tracing::debug!(
                        room_id = %self.id,
                        player_id = %sender,
                        "steal without claim lock ignored"
                    );
                }
            }
            Command::Return { word } => {
                self.return_word(sender, &word, &mut out);
            }
            Command::Override { word } => {
                if self.private {
                    self.override_word(sender, &word, &mut out);
                } else {
                    private(&mut out, sender, PRIVATE_ONLY);
                }
            }
            Command::Reset => {
                if self.private {
                    self.reset();
                } else {
                    private(&mut out, sender, PRIVATE_ONLY);
                }
            }
            Command::Done => self.declare_done(sender, &mut out),
            Command::PauseGame => {
                self.pause(sender);
            }
            Command::UnpauseGame => {
                self.unpause(sender);
            }
            Command::Rules => private(&mut out, sender, RULES),
            Command::Unknown => private(&mut out, sender, "Command not found!"),
        }
        out
    }

    /// A plain chat line from a player, relayed to the room.
    pub fn chat(&self, sender: PlayerId, text: &str) -> Outbox {
        let Some(player) = self.players.get(&sender).filter(|p| p.active) else {
            tracing::warn!(
                room_id = %self.id, player_id = %sender, "chat from non-member"
            );
            return Outbox::new();
        };
        vec![(
            Recipient::All,
            ServerEvent::Message(ChatMessage::Player {
                player_id: sender,
                nickname: player.nickname.clone(),
                text: text.to_string(),
            }),
        )]
    }

    /// Reveals one tile if it is `player`'s turn and tiles remain.
    pub fn flip(&mut self, player: PlayerId, out: &mut Outbox) -> bool {
        if self.current_player() != Some(player) {
            tracing::debug!(
                room_id = %self.id,
                player_id = %player,
                "flip out of turn ignored"
            );
            return false;
        }
        let Some(letter) = self.pool.flip() else {
            tracing::debug!(
                room_id = %self.id,
                player_id = %player,
                "flip on empty pool ignored"
            );
            return false;
        };
        let nickname = self.nickname(player);
        broadcast(out, format!("{nickname} flipped the letter {letter}"));
        if self.pool.unflipped_len() == 0 {
            broadcast(
                out,
                "There are no letters left to flip! If you don't see any more \
                 words to create/steal click the \"Finished\" button to end \
                 the game!",
            );
        }
        self.next_turn(out);
        true
    }

    /// Passes the turn on after a flip or a timeout.
    fn next_turn(&mut self, out: &mut Outbox) {
        self.turn.disarm();
        if self.active_count() <= 1 {
            return;
        }
        let next = self
            .turn
            .advance(&self.player_order, is_active(&self.players));
        if let Some(next) = next.filter(|_| self.pool.unflipped_len() > 0) {
            self.turn.arm();
            broadcast(out, format!("{}'s turn!", self.nickname(next)));
        }
    }

    /// Called when the turn deadline fires.
    pub fn turn_expired(&mut self) -> Outbox {
        let mut out = Outbox::new();
        self.turn.disarm();
        let Some(current) = self.current_player() else {
            return out;
        };
        tracing::debug!(
            room_id = %self.id, player_id = %current, "turn expired"
        );
        let nickname = self.nickname(current);
        broadcast(
            &mut out,
            format!("{nickname} took too long to go! Who's next?"),
        );
        self.next_turn(&mut out);
        out
    }

    /// Called when the lock deadline fires.
    pub fn lock_expired(&mut self) -> Outbox {
        if let Some(holder) = self.lock.expire() {
            tracing::debug!(
                room_id = %self.id, player_id = %holder, "claim lock expired"
            );
        }
        Outbox::new()
    }

    /// Gives the turn to whoever just claimed a word. The running turn
    /// clock restarts for them.
    fn give_turn_to(&mut self, player: PlayerId) {
        self.turn.set_to(&self.player_order, player);
        if self.active_count() > 1 && self.pool.unflipped_len() > 0 {
            self.turn.arm();
        }
    }

    pub fn pause(&mut self, player: PlayerId) -> bool {
        let acquired = self.lock.acquire(player);
        if !acquired {
            tracing::debug!(
                room_id = %self.id,
                player_id = %player,
                holder = ?self.lock.holder(),
                "claim lock busy"
            );
        }
        acquired
    }

    pub fn unpause(&mut self, player: PlayerId) -> bool {
        self.lock.release(player)
    }

    /// Real, long enough, or overridden. Expects an upper-case word.
    fn is_valid_word(&self, word: &str) -> bool {
        let lower = word.to_lowercase();
        let overridden = self.overrides.contains(&lower);
        if word.chars().count() < self.config.min_word_length && !overridden {
            return false;
        }
        overridden || self.dictionary.is_word(&lower)
    }

    /// Pool-only claim: removes `letters` from the center if they are all
    /// there. No word validation.
    pub fn take_from_center(&mut self, letters: &str) -> bool {
        match self.pool.match_against_center(letters) {
            Some(indices) => {
                self.pool.take_indices(&indices);
                true
            }
            None => false,
        }
    }

    /// Claims `word` from the center tiles for `player`.
    pub fn create_word(
        &mut self,
        player: PlayerId,
        word: &str,
        out: &mut Outbox,
    ) -> bool {
        let word = word.trim().to_uppercase();
        let nickname = self.nickname(player).to_string();

        if !self.is_valid_word(&word) {
            private(
                out,
                player,
                "Your word needs to be real and at least 3 characters long!",
            );
            broadcast(
                out,
                format!("{nickname} tried to make the INVALID word {word}"),
            );
            return false;
        }
        if self.is_owned(&word) {
            let text = format!("Somebody already owns the word {word}!");
            private(out, player, text);
            return false;
        }
        if !self.take_from_center(&word) {
            broadcast(out, format!("{nickname} tried to make the word {word}"));
            return false;
        }

        let points = self.scoring.score(&word);
        if let Some(p) = self.players.get_mut(&player) {
            p.add_word(&word, points);
        }
        tracing::info!(
            room_id = %self.id, player_id = %player, %word, "word created"
        );
        broadcast(out, format!("{nickname} made the word: {word}"));
        self.give_turn_to(player);
        true
    }

    /// Extends `victim`'s `old_word` with center tiles into `new_word`.
    pub fn steal_word(
        &mut self,
        player: PlayerId,
        victim: PlayerId,
        old_word: &str,
        new_word: &str,
        out: &mut Outbox,
    ) -> bool {
        let old_word = old_word.trim().to_uppercase();
        let new_word = new_word.trim().to_uppercase();
        let nickname = self.nickname(player).to_string();

        let victim_owns = self
            .players
            .get(&victim)
            .is_some_and(|v| v.has_word(&old_word));
        if !victim_owns {
            private(
                out,
                player,
                "Seems like someone must have taken that word before you!",
            );
            return false;
        }

        let attempt =
            format!("{nickname} attempted to steal the word: {old_word}");
        let claimable =
            self.is_valid_word(&new_word) && !self.is_owned(&new_word);
        let difference = letter_difference(&new_word, &old_word);
        let Some(difference) = difference.filter(|_| claimable) else {
            broadcast(
                out,
                format!("{attempt} to create the invalid word: {new_word}"),
            );
            return false;
        };

        if !self.take_from_center(&difference) {
            broadcast(
                out,
                format!("{attempt} to create the INVALID word: {new_word}"),
            );
            return false;
        }

        let old_points = self.scoring.score(&old_word);
        let new_points = self.scoring.score(&new_word);
        if let Some(v) = self.players.get_mut(&victim) {
            v.remove_word(&old_word, old_points);
        }
        if let Some(p) = self.players.get_mut(&player) {
            p.add_word(&new_word, new_points);
        }
        tracing::info!(
            room_id = %self.id,
            player_id = %player,
            %victim,
            %old_word,
            %new_word,
            "word stolen"
        );
        broadcast(
            out,
            format!(
                "{nickname} stole the word: {old_word} to create: {new_word}!!!"
            ),
        );
        self.give_turn_to(player);
        true
    }

    /// Gives one of `player`'s words back to the center.
    pub fn return_word(
        &mut self,
        player: PlayerId,
        word: &str,
        out: &mut Outbox,
    ) -> bool {
        let word = word.trim().to_uppercase();
        let points = self.scoring.score(&word);
        let Some(p) = self.players.get_mut(&player) else {
            return false;
        };
        if !p.remove_word(&word, points) {
            private(
                out,
                player,
                format!(
                    "Failed to put back word {word}! \
                     Are you sure that's not someone elses?"
                ),
            );
            return false;
        }
        let nickname = p.nickname.clone();
        self.pool.return_letters(word.chars());
        broadcast(out, format!("{nickname} put {word} back into the mix!"));
        true
    }

    /// Adds `word` to this room's accepted words.
    pub fn override_word(
        &mut self,
        player: PlayerId,
        word: &str,
        out: &mut Outbox,
    ) -> bool {
        let word = word.trim();
        if word.is_empty() || !word.chars().all(char::is_alphabetic) {
            tracing::debug!(
                room_id = %self.id,
                player_id = %player,
                word,
                "override rejected"
            );
            return false;
        }
        self.overrides.insert(word.to_lowercase());
        let nickname = self.nickname(player);
        broadcast(
            out,
            format!("{nickname} has added the word: {word} to the dictionary!"),
        );
        true
    }

    // -- round lifecycle ----------------------------------------------------

    /// Marks `player` done and ends the round if everyone is.
    pub fn declare_done(&mut self, player: PlayerId, out: &mut Outbox) {
        let Some(p) = self.players.get_mut(&player) else {
            return;
        };
        p.done = true;
        let nickname = p.nickname.clone();
        let done = self.players().filter(|p| p.done).count();
        let seated = self.player_order.len();
        broadcast(
            out,
            format!("{nickname} is done! {done}/{seated} players done."),
        );
        self.end_round(out);
    }

    /// Announces the winners and resets, if every seated player is done.
    /// Returns the winners, or `None` when the round goes on.
    pub fn end_round(&mut self, out: &mut Outbox) -> Option<Vec<PlayerId>> {
        if self.player_order.is_empty() || self.players().any(|p| !p.done) {
            return None;
        }
        let top = self.players().map(|p| p.score).max()?;
        let winners: Vec<&Player> =
            self.players().filter(|p| p.score == top).collect();
        let names: Vec<&str> =
            winners.iter().map(|p| p.nickname.as_str()).collect();
        let message = match names.as_slice() {
            [one] => format!("{one} has won with {top} points!"),
            many => format!(
                "{} have tied for first with {top} points!",
                english_list(many)
            ),
        };
        let winners: Vec<PlayerId> = winners.iter().map(|p| p.id).collect();

        tracing::info!(room_id = %self.id, ?winners, top, "round ended");
        broadcast(out, message);
        self.reset();
        Some(winners)
    }

    /// Starts a new round: new pool, blank players, inactive seats
    /// dropped, turn clock stopped.
    pub fn reset(&mut self) {
        self.pool = LetterPool::shuffled();
        for player in self.players.values_mut() {
            player.reset_round();
        }
        let players = &mut self.players;
        self.player_order.retain(|id| {
            let keep = players.get(id).is_some_and(|p| p.active);
            if !keep {
                players.remove(id);
            }
            keep
        });
        self.turn.disarm();
        let players = self.player_order.len();
        tracing::info!(room_id = %self.id, players, "round reset");
    }

    // -- snapshot -----------------------------------------------------------

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_name: if self.private {
                "Private Game".to_string()
            } else {
                "Public Game".to_string()
            },
            room_id: self.id.clone(),
            unflipped_count: self.pool.unflipped_len(),
            flipped: self.pool.flipped().to_vec(),
            players: self.players().map(Player::view).collect(),
            current_player: self.current_player(),
            paused_player: self.lock.holder(),
            paused: self.lock.is_held(),
            private: self.private,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WordList;

    const ANN: PlayerId = PlayerId(1);
    const BOB: PlayerId = PlayerId(2);
    const CAL: PlayerId = PlayerId(3);

    fn dictionary() -> Arc<dyn Dictionary> {
        let words = ["cat", "cats", "act", "scat", "add", "tab", "bat"];
        Arc::new(WordList::from_words(words))
    }

    fn room_with(private: bool, unflipped: &str, flipped: &str) -> Room {
        let pool = LetterPool::from_tiles(
            unflipped.chars().collect(),
            flipped.chars().collect(),
        );
        let config = GameConfig::default();
        Room::new(RoomId::from("table"), private, config, dictionary())
            .with_pool(pool)
    }

    fn create(word: &str) -> Command {
        Command::CreateWord { word: word.into() }
    }

    fn two_player_room(unflipped: &str, flipped: &str) -> Room {
        let mut room = room_with(false, unflipped, flipped);
        room.join(ANN, "ann");
        room.join(BOB, "bob");
        room
    }

    fn texts(out: &Outbox) -> Vec<&str> {
        out.iter()
            .map(|(_, event)| match event {
                ServerEvent::Message(msg) => msg.text(),
                ServerEvent::Snapshot(_) => "<snapshot>",
            })
            .collect()
    }

    fn words(room: &Room, id: PlayerId) -> Vec<String> {
        room.player(id)
            .map(|p| p.words().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Hidden + center + owned letters.
    fn tile_count(room: &Room) -> usize {
        let owned: usize = room.players().map(Player::letter_count).sum();
        room.pool().total_tiles() + owned
    }

    #[test]
    fn test_letter_difference() {
        assert_eq!(letter_difference("CATS", "CAT"), Some("S".into()));
        assert_eq!(letter_difference("SCATTER", "CAT"), Some("ERST".into()));
        assert_eq!(letter_difference("CAT", "CAT"), None);
        assert_eq!(letter_difference("CATS", "DOG"), None);
        assert_eq!(letter_difference("CAT", "CATT"), None);
    }

    #[test]
    fn test_english_list() {
        assert_eq!(english_list(&["a"]), "a");
        assert_eq!(english_list(&["a", "b"]), "a and b");
        assert_eq!(english_list(&["a", "b", "c"]), "a, b, and c");
    }

    // -- claim scenario -----------------------------------------------------

    #[test]
    fn test_lock_holder_creates_word() {
        let mut room = two_player_room("", "CATS");
        room.turn.set_to(&[ANN, BOB], BOB);

        assert!(room.pause(ANN));
        let out = room.handle_command(ANN, create("cat"));

        assert_eq!(room.pool().flipped(), &['S']);
        assert_eq!(words(&room, ANN), vec!["CAT"]);
        assert_eq!(room.current_player(), Some(ANN));
        assert_eq!(room.player(ANN).unwrap().score, 3);
        assert!(texts(&out).contains(&"ann made the word: CAT"));
    }

    #[test]
    fn test_non_holder_create_is_ignored() {
        let mut room = two_player_room("", "CATS");
        room.pause(ANN);

        let out = room.handle_command(BOB, create("cat"));

        assert!(out.is_empty());
        assert_eq!(room.pool().flipped().len(), 4);
        assert!(words(&room, BOB).is_empty());
    }

    #[test]
    fn test_create_without_any_lock_is_ignored() {
        let mut room = two_player_room("", "CATS");
        room.handle_command(ANN, create("cat"));
        assert!(words(&room, ANN).is_empty());
    }

    #[test]
    fn test_create_invalid_word_notifies_privately_and_publicly() {
        let mut room = two_player_room("", "CTAX");
        room.pause(ANN);

        let out = room.handle_command(ANN, create("xat"));

        assert_eq!(
            out[0],
            (
                Recipient::Player(ANN),
                ServerEvent::Message(ChatMessage::Private {
                    text: "Your word needs to be real and at least 3 characters long!".into()
                })
            )
        );
        assert_eq!(texts(&out)[1], "ann tried to make the INVALID word XAT");
        assert_eq!(room.pool().flipped().len(), 4);
    }

    #[test]
    fn test_create_short_word_rejected_unless_overridden() {
        let mut room = room_with(true, "", "QI");
        room.join(ANN, "ann");
        room.pause(ANN);

        assert!(!room.create_word(ANN, "qi", &mut Outbox::new()));

        room.handle_command(ANN, Command::Override { word: "qi".into() });
        assert!(room.create_word(ANN, "qi", &mut Outbox::new()));
        assert_eq!(words(&room, ANN), vec!["QI"]);
    }

    #[test]
    fn test_create_with_missing_tiles_broadcasts_attempt() {
        let mut room = two_player_room("", "CA");
        room.pause(ANN);
        let out = room.handle_command(ANN, create("cat"));
        assert_eq!(texts(&out), vec!["ann tried to make the word CAT"]);
        assert_eq!(room.pool().flipped(), &['C', 'A']);
    }

    #[test]
    fn test_create_already_owned_word_is_rejected() {
        let mut room = two_player_room("", "CATCAT");
        room.pause(ANN);
        assert!(room.create_word(ANN, "cat", &mut Outbox::new()));
        room.unpause(ANN);

        room.pause(BOB);
        assert!(!room.create_word(BOB, "cat", &mut Outbox::new()));
        assert_eq!(room.pool().flipped().len(), 3);
        assert!(words(&room, BOB).is_empty());
    }

    // -- steal scenario -----------------------------------------------------

    #[test]
    fn test_steal_extends_victims_word() {
        let mut room = two_player_room("", "CATS");
        room.pause(ANN);
        room.handle_command(ANN, Command::CreateWord { word: "CAT".into() });
        room.handle_command(ANN, Command::UnpauseGame);

        assert!(room.pause(BOB));
        let out = room.handle_command(
            BOB,
            Command::StealWord {
                victim: ANN,
                old_word: "cat".into(),
                new_word: "cats".into(),
            },
        );

        assert!(room.pool().flipped().is_empty());
        assert!(words(&room, ANN).is_empty());
        assert_eq!(words(&room, BOB), vec!["CATS"]);
        assert_eq!(room.player(ANN).unwrap().score, 0);
        assert_eq!(room.player(BOB).unwrap().score, 4);
        assert_eq!(room.current_player(), Some(BOB));
        assert!(texts(&out).contains(&"bob stole the word: CAT to create: CATS!!!"));
    }

    #[test]
    fn test_steal_same_word_is_rejected() {
        let mut room = two_player_room("", "CAT");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());
        room.unpause(ANN);
        room.pause(BOB);

        let mut out = Outbox::new();
        assert!(!room.steal_word(BOB, ANN, "cat", "CAT", &mut out));
        assert_eq!(
            texts(&out),
            vec!["bob attempted to steal the word: CAT to create the invalid word: CAT"]
        );
        assert_eq!(words(&room, ANN), vec!["CAT"]);
    }

    #[test]
    fn test_steal_rearrangement_without_new_letters_is_rejected() {
        let mut room = two_player_room("", "CAT");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());
        room.unpause(ANN);
        room.pause(BOB);

        assert!(!room.steal_word(BOB, ANN, "CAT", "ACT", &mut Outbox::new()));
        assert_eq!(words(&room, ANN), vec!["CAT"]);
    }

    #[test]
    fn test_steal_word_not_owned_notifies_privately() {
        let mut room = two_player_room("", "S");
        room.pause(BOB);
        let mut out = Outbox::new();
        assert!(!room.steal_word(BOB, ANN, "CAT", "CATS", &mut out));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, Recipient::Player(BOB));
    }

    #[test]
    fn test_steal_without_center_tiles_changes_nothing() {
        let mut room = two_player_room("", "CAT");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());
        room.unpause(ANN);
        room.pause(BOB);

        let mut out = Outbox::new();
        assert!(!room.steal_word(BOB, ANN, "CAT", "CATS", &mut out));
        assert_eq!(
            texts(&out),
            vec!["bob attempted to steal the word: CAT to create the INVALID word: CATS"]
        );
        assert_eq!(words(&room, ANN), vec!["CAT"]);
        assert!(words(&room, BOB).is_empty());
    }

    #[test]
    fn test_steal_into_owned_word_is_rejected() {
        let mut room = two_player_room("", "CATACTSS");
        room.pause(ANN);
        assert!(room.create_word(ANN, "cat", &mut Outbox::new()));
        assert!(room.create_word(ANN, "act", &mut Outbox::new()));
        room.unpause(ANN);
        room.pause(BOB);
        assert!(room.steal_word(BOB, ANN, "ACT", "CATS", &mut Outbox::new()));
        assert_eq!(room.pool().flipped(), &['S']);

        let mut out = Outbox::new();
        assert!(!room.steal_word(BOB, ANN, "CAT", "CATS", &mut out));

        assert_eq!(
            texts(&out),
            vec!["bob attempted to steal the word: CAT to create the invalid word: CATS"]
        );
        assert_eq!(words(&room, ANN), vec!["CAT"]);
        assert_eq!(words(&room, BOB), vec!["CATS"]);
        assert_eq!(room.pool().flipped(), &['S']);
        assert_eq!(tile_count(&room), 8);
    }

    #[test]
    fn test_steal_requires_lock() {
        let mut room = two_player_room("", "CATS");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());

        let out = room.handle_command(
            BOB,
            Command::StealWord {
                victim: ANN,
                old_word: "CAT".into(),
                new_word: "CATS".into(),
            },
        );
        assert!(out.is_empty());
        assert_eq!(words(&room, ANN), vec!["CAT"]);
    }

    // -- return -------------------------------------------------------------

    #[test]
    fn test_return_word_puts_letters_back_in_center() {
        let mut room = two_player_room("", "CAT");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());

        let put_back = Command::Return { word: "cat".into() };
        let out = room.handle_command(ANN, put_back);

        assert_eq!(room.pool().flipped(), &['C', 'A', 'T']);
        assert!(words(&room, ANN).is_empty());
        assert_eq!(room.player(ANN).unwrap().score, 0);
        assert_eq!(texts(&out), vec!["ann put CAT back into the mix!"]);
    }

    #[test]
    fn test_return_someone_elses_word_fails() {
        let mut room = two_player_room("", "CAT");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());

        let put_back = Command::Return { word: "cat".into() };
        let out = room.handle_command(BOB, put_back);
        assert_eq!(
            texts(&out),
            vec!["Failed to put back word CAT! Are you sure that's not someone elses?"]
        );
        assert_eq!(words(&room, ANN), vec!["CAT"]);
    }

    // -- tile conservation --------------------------------------------------

    #[test]
    fn test_tiles_are_conserved_across_operations() {
        let mut room = two_player_room("STACB", "");
        let total = tile_count(&room);

        for _ in 0..5 {
            let current = room.current_player().unwrap();
            room.handle_command(current, Command::Flip);
            assert_eq!(tile_count(&room), total);
        }
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());
        assert_eq!(tile_count(&room), total);
        room.unpause(ANN);
        room.pause(BOB);
        room.steal_word(BOB, ANN, "cat", "cats", &mut Outbox::new());
        assert_eq!(tile_count(&room), total);
        room.return_word(BOB, "cats", &mut Outbox::new());
        assert_eq!(tile_count(&room), total);
        room.create_word(BOB, "tab", &mut Outbox::new());
        assert_eq!(tile_count(&room), total);
    }

    // -- turns --------------------------------------------------------------

    #[test]
    fn test_flip_out_of_turn_is_ignored() {
        let mut room = two_player_room("XYZ", "");
        let out = room.handle_command(BOB, Command::Flip);
        assert!(out.is_empty());
        assert_eq!(room.pool().unflipped_len(), 3);
    }

    #[test]
    fn test_flip_reveals_and_passes_turn() {
        let mut room = two_player_room("XYZ", "");
        let out = room.handle_command(ANN, Command::Flip);

        assert_eq!(room.pool().flipped(), &['Z']);
        assert_eq!(room.current_player(), Some(BOB));
        assert!(room.turn_deadline().is_armed());
        assert_eq!(texts(&out), vec!["ann flipped the letter Z", "bob's turn!"]);
    }

    #[test]
    fn test_last_flip_announces_empty_pool_and_stops_clock() {
        let mut room = two_player_room("Z", "");
        let out = room.handle_command(ANN, Command::Flip);

        assert_eq!(texts(&out).len(), 2);
        assert!(texts(&out)[1].starts_with("There are no letters left to flip!"));
        assert!(!room.turn_deadline().is_armed());
        assert!(room.handle_command(BOB, Command::Flip).is_empty());
    }

    #[test]
    fn test_single_player_flips_freely() {
        let mut room = room_with(false, "XYZ", "");
        room.join(ANN, "ann");
        room.handle_command(ANN, Command::Flip);
        room.handle_command(ANN, Command::Flip);
        assert_eq!(room.pool().flipped(), &['Z', 'Y']);
        assert!(!room.turn_deadline().is_armed());
    }

    #[test]
    fn test_second_player_starts_turn_clock() {
        let mut room = room_with(false, "XYZ", "");
        room.join(ANN, "ann");
        assert!(!room.turn_deadline().is_armed());
        room.join(BOB, "bob");
        assert!(room.turn_deadline().is_armed());
    }

    #[test]
    fn test_turn_expiry_advances_once() {
        let mut room = two_player_room("XYZ", "");
        assert_eq!(room.current_player(), Some(ANN));

        let out = room.turn_expired();

        assert_eq!(room.current_player(), Some(BOB));
        assert_eq!(
            texts(&out),
            vec!["ann took too long to go! Who's next?", "bob's turn!"]
        );
    }

    #[test]
    fn test_turn_skips_departed_player() {
        let mut room = room_with(false, "VWXYZ", "");
        room.join(ANN, "ann");
        room.join(BOB, "bob");
        room.join(CAL, "cal");
        room.leave(BOB);

        room.handle_command(ANN, Command::Flip);
        assert_eq!(room.current_player(), Some(CAL));
    }

    #[test]
    fn test_departed_current_player_hands_turn_on() {
        let mut room = room_with(false, "VWXYZ", "");
        room.join(ANN, "ann");
        room.join(BOB, "bob");
        room.join(CAL, "cal");
        room.leave(ANN);
        assert_eq!(room.current_player(), Some(BOB));
    }

    // -- lock ---------------------------------------------------------------

    #[test]
    fn test_lock_expiry_lets_another_player_pause() {
        let mut room = two_player_room("", "");
        room.handle_command(ANN, Command::PauseGame);
        assert!(!room.pause(BOB));

        room.lock_expired();

        assert!(!room.is_paused());
        room.handle_command(BOB, Command::PauseGame);
        assert_eq!(room.lock_holder(), Some(BOB));
    }

    #[test]
    fn test_departing_holder_releases_lock() {
        let mut room = two_player_room("", "");
        room.pause(ANN);
        room.leave(ANN);
        assert!(!room.is_paused());
        assert!(!room.lock_deadline().is_armed());
    }

    // -- private-only commands ------------------------------------------------

    #[test]
    fn test_private_only_commands_refused_in_public_room() {
        let mut room = two_player_room("", "");
        let zzz = Command::Override { word: "zzz".into() };
        let out = room.handle_command(ANN, zzz);
        assert_eq!(texts(&out), vec![PRIVATE_ONLY]);
        let out = room.handle_command(ANN, Command::Reset);
        assert_eq!(texts(&out), vec![PRIVATE_ONLY]);
    }

    #[test]
    fn test_override_announced() {
        let mut room = room_with(true, "", "");
        room.join(ANN, "ann");
        let zzz = Command::Override { word: "zzz".into() };
        let out = room.handle_command(ANN, zzz);
        assert_eq!(texts(&out), vec!["ann has added the word: zzz to the dictionary!"]);
    }

    #[test]
    fn test_unknown_command_and_rules_are_private() {
        let mut room = two_player_room("", "");
        let out = room.handle_command(ANN, Command::Unknown);
        assert_eq!(texts(&out), vec!["Command not found!"]);
        assert_eq!(out[0].0, Recipient::Player(ANN));

        let out = room.handle_command(ANN, Command::Rules);
        assert_eq!(texts(&out), vec![RULES]);
        assert_eq!(out[0].0, Recipient::Player(ANN));
    }

    // -- round end ----------------------------------------------------------

    #[test]
    fn test_round_does_not_end_until_everyone_is_done() {
        let mut room = two_player_room("", "CAT");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());

        let out = room.handle_command(ANN, Command::Done);

        assert_eq!(texts(&out), vec!["ann is done! 1/2 players done."]);
        assert_eq!(words(&room, ANN), vec!["CAT"]);
    }

    #[test]
    fn test_round_end_single_winner_and_reset() {
        let mut room = two_player_room("", "CAT");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());
        room.handle_command(ANN, Command::Done);

        let out = room.handle_command(BOB, Command::Done);

        assert_eq!(
            texts(&out),
            vec!["bob is done! 2/2 players done.", "ann has won with 3 points!"]
        );
        assert!(words(&room, ANN).is_empty());
        assert_eq!(room.player(ANN).unwrap().score, 0);
        assert!(!room.player(ANN).unwrap().done);
        assert_eq!(room.pool().unflipped_len(), 144);
    }

    #[test]
    fn test_round_end_names_every_tied_winner() {
        let mut room = room_with(false, "", "CATBAT");
        room.join(ANN, "ann");
        room.join(BOB, "bob");
        room.join(CAL, "cal");
        room.pause(ANN);
        room.create_word(ANN, "cat", &mut Outbox::new());
        room.unpause(ANN);
        room.pause(BOB);
        room.create_word(BOB, "bat", &mut Outbox::new());

        let mut out = Outbox::new();
        for id in [ANN, BOB, CAL] {
            room.players.get_mut(&id).unwrap().done = true;
        }
        let winners = room.end_round(&mut out);

        assert_eq!(winners, Some(vec![ANN, BOB]));
        assert_eq!(texts(&out), vec!["ann and bob have tied for first with 3 points!"]);
    }

    #[test]
    fn test_three_way_tie_uses_oxford_comma() {
        let mut room = room_with(false, "", "");
        room.join(ANN, "ann");
        room.join(BOB, "bob");
        room.join(CAL, "cal");
        for id in [ANN, BOB, CAL] {
            room.players.get_mut(&id).unwrap().done = true;
        }
        let mut out = Outbox::new();
        room.end_round(&mut out);
        assert_eq!(texts(&out), vec!["ann, bob, and cal have tied for first with 0 points!"]);
    }

    #[test]
    fn test_reset_drops_inactive_players() {
        let mut room = room_with(true, "", "");
        room.join(ANN, "ann");
        room.join(BOB, "bob");
        room.leave(BOB);

        room.handle_command(ANN, Command::Reset);

        assert_eq!(room.player_order(), &[ANN]);
        assert!(room.player(BOB).is_none());
    }

    #[test]
    fn test_departed_player_counts_as_done() {
        let mut room = two_player_room("", "");
        room.leave(BOB);
        let out = room.handle_command(ANN, Command::Done);
        assert_eq!(texts(&out)[0], "ann is done! 2/2 players done.");
        assert_eq!(room.player_order(), &[ANN]);
    }

    // -- membership ---------------------------------------------------------

    #[test]
    fn test_rejoin_reactivates_without_duplicate_seat() {
        let mut room = two_player_room("", "");
        room.leave(BOB);
        room.join(BOB, "bobby");

        assert_eq!(room.player_order(), &[ANN, BOB]);
        let bob = room.player(BOB).unwrap();
        assert!(bob.active);
        assert_eq!(bob.nickname, "bobby");
    }

    #[test]
    fn test_leave_last_player_disarms_everything() {
        let mut room = two_player_room("XYZ", "");
        room.pause(ANN);
        room.leave(ANN);
        room.leave(BOB);
        assert_eq!(room.active_count(), 0);
        assert!(!room.turn_deadline().is_armed());
        assert!(!room.lock_deadline().is_armed());
    }

    #[test]
    fn test_commands_from_departed_player_are_ignored() {
        let mut room = two_player_room("XYZ", "");
        room.leave(ANN);
        assert!(room.handle_command(ANN, Command::Rules).is_empty());
        assert!(room.chat(ANN, "hi").is_empty());
    }

    #[test]
    fn test_snapshot_contents() {
        let mut room = room_with(true, "XY", "CA");
        room.join(ANN, "ann");
        room.pause(ANN);

        let snap = room.snapshot();

        assert_eq!(snap.room_name, "Private Game");
        assert_eq!(snap.unflipped_count, 2);
        assert_eq!(snap.flipped, vec!['C', 'A']);
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.current_player, Some(ANN));
        assert_eq!(snap.paused_player, Some(ANN));
        assert!(snap.paused);
        assert!(snap.private);
    }
}
