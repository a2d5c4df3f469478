//! Per-connection handler: room membership and message routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Assign a `PlayerId` from the connection id
//!   2. Loop: receive envelopes → dispatch system, action or chat
//!   3. On each successful join, write `RoomJoined`, then spawn a forwarder
//!      that writes that room's events to the socket
//!   4. On exit, the guard removes the player from its room

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use snatch_protocol::{
    Codec, Command, Envelope, Payload, PlayerId, ProtocolError, ServerEvent,
    SystemMessage,
};
use snatch_session::SessionError;
use snatch_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::SnatchError;
use crate::server::ServerState;

/// The write side of one connection, shared by the handler loop and the
/// event forwarder.
struct Outgoing<C: Codec> {
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
    seq: AtomicU64,
    start: Instant,
}

impl<C: Codec> Outgoing<C> {
    async fn send(&self, payload: Payload) -> Result<(), SnatchError> {
        let envelope = Envelope {
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            payload,
        };
        let bytes = self.state.codec.encode(&envelope)?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
        self.conn.send(&text).await?;
        Ok(())
    }

    async fn send_system(&self, msg: SystemMessage) -> Result<(), SnatchError> {
        self.send(Payload::System(msg)).await
    }

    /// Reports `error` to the client as an `Error` frame.
    async fn send_error(&self, error: &SnatchError) -> Result<(), SnatchError> {
        self.send_system(SystemMessage::Error {
            code: error.code(),
            message: error.to_string(),
        })
        .await
    }

    /// Reports the error of a failed request, if any.
    async fn report<T, E: Into<SnatchError>>(
        &self,
        result: Result<T, E>,
    ) -> Result<(), SnatchError> {
        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let e = e.into();
                tracing::debug!(
                    conn_id = %self.conn.id(), error = %e, "request failed"
                );
                self.send_error(&e).await
            }
        }
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Removes the player from its room when the handler exits.
///
/// This runs even if the handler panics. Since `Drop` is synchronous, the
/// registry call happens in a fire-and-forget task.
struct ConnectionGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
    /// One per successful join. A forwarder ends on its own once the room
    /// drops the matching sender.
    forwarders: Vec<JoinHandle<()>>,
}

impl<C: Codec> ConnectionGuard<C> {
    fn track(&mut self, forwarder: JoinHandle<()>) {
        self.forwarders.retain(|f| !f.is_finished());
        self.forwarders.push(forwarder);
    }
}

impl<C: Codec> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        for forwarder in &self.forwarders {
            forwarder.abort();
        }
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut registry = state.registry.lock().await;
            if let Err(e) = registry.remove_player(player_id).await {
                tracing::warn!(
                    %player_id, error = %e, "cleanup after disconnect failed"
                );
            }
        });
    }
}

enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SnatchError> {
    let conn_id = conn.id();
    let player_id = PlayerId(conn_id.into_inner());
    tracing::debug!(%conn_id, %player_id, "handling new connection");

    let out = Arc::new(Outgoing {
        conn,
        state: Arc::clone(&state),
        seq: AtomicU64::new(1),
        start: Instant::now(),
    });

    let mut guard = ConnectionGuard {
        player_id,
        state: Arc::clone(&state),
        forwarders: Vec::new(),
    };

    loop {
        let received =
            tokio::time::timeout(state.idle_timeout, out.conn.recv()).await;
        let text = match received {
            Ok(Ok(Some(text))) => text,
            Ok(Ok(None)) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%player_id, "connection timed out");
                break;
            }
        };

        let envelope: Envelope = match state.codec.decode(text.as_bytes()) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::debug!(
                    %player_id, error = %e, "failed to decode envelope"
                );
                out.send_error(&e.into()).await?;
                continue;
            }
        };

        let flow = match envelope.payload {
            Payload::System(msg) => {
                handle_system_message(&out, &mut guard, msg).await?
            }
            Payload::Action(command) => {
                tracing::debug!(%player_id, command = command.name(), "action");
                let routed = Routed::Command(command);
                out.report(route(&state, player_id, routed).await).await?;
                Flow::Continue
            }
            Payload::Chat { text } => {
                let routed = Routed::Chat(text);
                out.report(route(&state, player_id, routed).await).await?;
                Flow::Continue
            }
            Payload::Event(_) => {
                let e = ProtocolError::InvalidMessage(
                    "events are sent by the server only".into(),
                );
                out.send_error(&e.into()).await?;
                Flow::Continue
            }
        };

        if let Flow::Close = flow {
            break;
        }
    }

    // guard drops here → player leaves its room.
    Ok(())
}

enum Routed {
    Command(Command),
    Chat(String),
}

/// Sends a command or chat line to the player's room.
///
/// Only the handle lookup happens under the registry lock; the send waits
/// on the room's queue with the lock released.
async fn route<C: Codec>(
    state: &ServerState<C>,
    player_id: PlayerId,
    routed: Routed,
) -> Result<(), SnatchError> {
    let handle = state.registry.lock().await.room_handle_for(player_id)?;
    let sent = match routed {
        Routed::Command(command) => {
            handle.send_command(player_id, command).await
        }
        Routed::Chat(text) => handle.send_chat(player_id, text).await,
    };
    Ok(sent.map_err(SessionError::from)?)
}

/// Writes every room event addressed to this connection to the socket.
fn spawn_forwarder<C: Codec>(
    out: Arc<Outgoing<C>>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Err(e) = out.send(Payload::Event(event)).await {
                let conn_id = out.conn.id();
                tracing::debug!(
                    %conn_id, error = %e, "event forwarding stopped"
                );
                break;
            }
        }
    })
}

async fn handle_system_message<C: Codec>(
    out: &Arc<Outgoing<C>>,
    guard: &mut ConnectionGuard<C>,
    msg: SystemMessage,
) -> Result<Flow, SnatchError> {
    let state = &out.state;
    let player_id = guard.player_id;
    match msg {
        SystemMessage::JoinRoom { nickname, room } => {
            let nickname = nickname.trim();
            if nickname.is_empty() {
                let e = ProtocolError::InvalidMessage(
                    "nickname must not be empty".into(),
                );
                out.send_error(&e.into()).await?;
                return Ok(Flow::Continue);
            }

            // The room starts pushing events as soon as the join lands.
            // They queue in `events_rx` until `RoomJoined` is on the wire.
            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let result = state
                .registry
                .lock()
                .await
                .join_room(player_id, nickname, room, events_tx)
                .await;
            match result {
                Ok((room_id, private)) => {
                    out.send_system(SystemMessage::RoomJoined {
                        room_id,
                        player_id,
                        private,
                    })
                    .await?;
                    guard.track(spawn_forwarder(Arc::clone(out), events_rx));
                }
                Err(e) => out.send_error(&e.into()).await?,
            }
        }

        SystemMessage::LeaveRoom => {
            let result =
                state.registry.lock().await.leave_room(player_id).await;
            out.report(result).await?;
        }

        SystemMessage::Heartbeat { client_time } => {
            out.send_system(SystemMessage::HeartbeatAck {
                client_time,
                server_time: out.elapsed_ms(),
            })
            .await?;
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(%player_id, %reason, "client disconnected");
            return Ok(Flow::Close);
        }

        SystemMessage::RoomJoined { .. }
        | SystemMessage::HeartbeatAck { .. }
        | SystemMessage::Error { .. } => {
            tracing::debug!(%player_id, "ignoring server-only system message");
        }
    }

    Ok(Flow::Continue)
}
