//! Room actor: one Tokio task per room that owns a [`Room`].
//!
//! All access to a room goes through its [`RoomHandle`]. The actor
//! processes one command at a time, so the game rules never see
//! concurrent mutation. Besides commands, its loop waits on the room's
//! turn and lock deadlines and on the snapshot ticker.

use std::collections::HashMap;

use snatch_protocol::{
    Command, PlayerId, Recipient, RoomId, RoomSnapshot, ServerEvent,
};
use snatch_timer::{Ticker, TickerConfig};
use tokio::sync::{mpsc, oneshot};

use crate::{Outbox, Room, RoomError};

/// Channel for delivering room output to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Requests a handle can make of its actor.
pub(crate) enum RoomCommand {
    /// Seat (or re-seat) a player.
    Join {
        player_id: PlayerId,
        nickname: String,
        sender: PlayerSender,
        reply: oneshot::Sender<()>,
    },

    /// Mark a player as gone. Replies with the number of active players
    /// left.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// A game command.
    Command { player_id: PlayerId, command: Command },

    /// A chat line. Lines starting with `/` are parsed as commands.
    Chat { player_id: PlayerId, text: String },

    /// Room metadata.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// The full visible room state.
    GetSnapshot { reply: oneshot::Sender<RoomSnapshot> },

    /// Cancel the timers and stop.
    Shutdown,
}

/// Room metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub private: bool,
    /// Seated players, including ones who left this round.
    pub player_count: usize,
    pub active_players: usize,
    pub paused: bool,
}

/// Handle to a running room actor.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the room's identity. The
/// session registry holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    private: bool,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn is_private(&self) -> bool {
        self.private
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }

    async fn send(&self, command: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(command).await.map_err(|_| self.unavailable())
    }

    /// Seats a player whose output goes to `sender`. Joining again
    /// re-activates the seat and replaces the sender.
    pub async fn join(
        &self,
        player_id: PlayerId,
        nickname: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            nickname: nickname.into(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Marks a player as gone and returns how many active players remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Sends a game command (fire-and-forget).
    pub async fn send_command(
        &self,
        player_id: PlayerId,
        command: Command,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Command { player_id, command }).await
    }

    /// Sends a chat line (fire-and-forget).
    pub async fn send_chat(
        &self,
        player_id: PlayerId,
        text: impl Into<String>,
    ) -> Result<(), RoomError> {
        self.send(RoomCommand::Chat {
            player_id,
            text: text.into(),
        })
        .await
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetSnapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to cancel its timers and stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }
}

/// The actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Outbound channels of the players currently connected.
    senders: HashMap<PlayerId, PlayerSender>,
    ticker: Ticker,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        let room_id = self.room.id().clone();
        let private = self.room.is_private();
        tracing::info!(%room_id, private, "room actor started");

        loop {
            let turn_expired = self.room.turn_deadline().expired();
            let lock_expired = self.room.lock_deadline().expired();

            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                () = turn_expired => {
                    let out = self.room.turn_expired();
                    self.dispatch(out);
                    self.broadcast_snapshot();
                }
                () = lock_expired => {
                    let out = self.room.lock_expired();
                    self.dispatch(out);
                    self.broadcast_snapshot();
                }
                tick = self.ticker.wait_for_tick() => {
                    if self.room.active_count() > 0 {
                        let tick = tick.tick;
                        tracing::trace!(%room_id, tick, "snapshot tick");
                        self.broadcast_snapshot();
                    }
                }
            }
        }

        self.room.shutdown();
        tracing::info!(%room_id, "room actor stopped");
    }

    /// Handles one command. Returns `false` when the actor should stop.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                player_id,
                nickname,
                sender,
                reply,
            } => {
                self.senders.insert(player_id, sender);
                let out = self.room.join(player_id, &nickname);
                self.dispatch(out);
                self.broadcast_snapshot();
                let _ = reply.send(());
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = if self.room.player(player_id).is_some() {
                    self.senders.remove(&player_id);
                    let out = self.room.leave(player_id);
                    self.dispatch(out);
                    self.broadcast_snapshot();
                    Ok(self.room.active_count())
                } else {
                    Err(RoomError::NotInRoom(player_id, self.room.id().clone()))
                };
                let _ = reply.send(result);
            }
            RoomCommand::Command { player_id, command } => {
                let out = self.room.handle_command(player_id, command);
                self.dispatch(out);
                self.broadcast_snapshot();
            }
            RoomCommand::Chat { player_id, text } => {
                match Command::parse_slash(&text) {
                    Some(command) => {
                        let out = self.room.handle_command(player_id, command);
                        self.dispatch(out);
                        self.broadcast_snapshot();
                    }
                    None => {
                        let out = self.room.chat(player_id, &text);
                        self.dispatch(out);
                    }
                }
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::GetSnapshot { reply } => {
                let _ = reply.send(self.room.snapshot());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room_id = %self.room.id(), "room shutting down");
                return false;
            }
        }
        true
    }

    /// Delivers room output to its recipients.
    fn dispatch(&self, out: Outbox) {
        for (recipient, event) in out {
            match recipient {
                Recipient::All => {
                    for player_id in self.senders.keys() {
                        self.send_to(*player_id, event.clone());
                    }
                }
                Recipient::Player(player_id) => self.send_to(player_id, event),
            }
        }
    }

    fn broadcast_snapshot(&self) {
        if self.senders.is_empty() {
            return;
        }
        let snapshot = ServerEvent::Snapshot(self.room.snapshot());
        self.dispatch(vec![(Recipient::All, snapshot)]);
    }

    /// Sends to one player. Silently drops if their connection is gone.
    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room.id().clone(),
            private: self.room.is_private(),
            player_count: self.room.player_order().len(),
            active_players: self.room.active_count(),
            paused: self.room.is_paused(),
        }
    }
}

/// Spawns an actor for `room` and returns a handle to it.
///
/// The command channel is bounded by the room's `channel_size`; callers
/// wait when it is full.
pub fn spawn_room(room: Room) -> RoomHandle {
    let config = room.config();
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let ticker = Ticker::new(TickerConfig {
        period: config.snapshot_interval,
        ..TickerConfig::default()
    });

    let handle = RoomHandle {
        room_id: room.id().clone(),
        private: room.is_private(),
        sender: tx,
    };

    let actor = RoomActor {
        room,
        senders: HashMap::new(),
        ticker,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    handle
}
