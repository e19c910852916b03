//! Room actor: an isolated Tokio task that owns one room's state.
//!
//! Every mutation of a room, whether it comes from a player, an admin call
//! or the turn timer, arrives as a [`RoomCommand`] on the room's queue and
//! is applied in order. After each command the actor broadcasts a fresh
//! projection to every member whose view may have changed and reports
//! telemetry.

use std::collections::HashMap;
use std::sync::Arc;

use doodle_clue::{ClueCorpus, ClueSource};
use doodle_protocol::{GuessResult, Player, PlayerId, RoomId, RoomView};
use doodle_timer::RoomTimer;
use doodle_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::projection::project;
use crate::state::{RoomState, Transition, TurnTimer};
use crate::telemetry::{RoomStatusReport, Telemetry, TelemetryEvent, TimeoutReport};
use crate::{RoomConfig, RoomError, RoomStats};

/// An outbound message from the room actor to a connection handler.
#[derive(Debug, Clone)]
pub enum RoomOutbound {
    /// This connection's current projection.
    State(RoomView),
    /// The drawing buffer, relayed byte for byte.
    Drawing(Arc<[u8]>),
}

/// Channel sender for delivering outbound messages to one connection.
pub type PlayerSender = mpsc::UnboundedSender<RoomOutbound>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    Connect {
        connection: ConnectionId,
        player: Player,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Drop whoever is bound to `connection`. Replies with the player that
    /// was removed, if any.
    Disconnect {
        connection: ConnectionId,
        reply: oneshot::Sender<Option<PlayerId>>,
    },

    RemovePlayer {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Guess {
        player_id: PlayerId,
        message: String,
        reply: oneshot::Sender<Result<GuessResult, RoomError>>,
    },

    Draw {
        player_id: PlayerId,
        data: Vec<u8>,
    },

    Start {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    Restart {
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    End {
        reply: oneshot::Sender<()>,
    },

    Stats {
        reply: oneshot::Sender<RoomStats>,
    },

    /// Posted by the turn timer.
    Timeout {
        generation: u64,
    },

    Shutdown,
}

impl TurnTimer for RoomTimer<RoomCommand> {
    fn rearm(&mut self, generation: u64) -> u64 {
        self.arm(RoomCommand::Timeout { generation }).unix_ms
    }

    fn cancel(&mut self) {
        RoomTimer::cancel(self);
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Handle to a running room actor.
///
/// Cheap to clone. The registry holds one per room and connection handlers
/// keep a copy for the lifetime of their socket.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Binds `player` to `connection` in this room. On success every member
    /// receives a new projection and `sender` also receives the current
    /// drawing buffer.
    pub async fn connect(
        &self,
        connection: ConnectionId,
        player: Player,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Connect {
            connection,
            player,
            sender,
            reply,
        })
        .await?
    }

    /// Removes the player bound to `connection`. `Ok(None)` if nobody is
    /// bound to it any more.
    pub async fn disconnect(&self, connection: ConnectionId) -> Result<Option<PlayerId>, RoomError> {
        self.request(|reply| RoomCommand::Disconnect { connection, reply })
            .await
    }

    /// Removes a player by id. Their connection's outbound channel is
    /// closed.
    pub async fn remove_player(&self, player_id: PlayerId) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::RemovePlayer { player_id, reply })
            .await?
    }

    pub async fn guess(
        &self,
        player_id: PlayerId,
        message: impl Into<String>,
    ) -> Result<GuessResult, RoomError> {
        let message = message.into();
        self.request(|reply| RoomCommand::Guess {
            player_id,
            message,
            reply,
        })
        .await?
    }

    /// Submits a drawing update (fire-and-forget). Ignored unless
    /// `player_id` holds the turn.
    pub async fn draw(&self, player_id: PlayerId, data: Vec<u8>) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Draw { player_id, data })
            .await
            .map_err(|_| self.unavailable())
    }

    pub async fn start(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Start { reply }).await?
    }

    pub async fn restart(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Restart { reply }).await?
    }

    pub async fn end(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::End { reply }).await
    }

    pub async fn stats(&self) -> Result<RoomStats, RoomError> {
        self.request(|reply| RoomCommand::Stats { reply }).await
    }

    /// Tells the room to stop. Pending timers are cancelled and every
    /// connection's outbound channel is closed.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }

    async fn request<R>(
        &self,
        command: impl FnOnce(oneshot::Sender<R>) -> RoomCommand,
    ) -> Result<R, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| self.unavailable())?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Roster ids and turn holder, compared before and after each command to
/// decide whether a status report is due.
type StatusKey = (Vec<PlayerId>, Option<PlayerId>);

struct RoomActor<T: Telemetry> {
    state: RoomState<RoomTimer<RoomCommand>>,
    senders: HashMap<ConnectionId, PlayerSender>,
    telemetry: Arc<T>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl<T: Telemetry> RoomActor<T> {
    async fn run(mut self) {
        tracing::info!(room_id = %self.state.room_id(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            if matches!(cmd, RoomCommand::Shutdown) {
                tracing::info!(room_id = %self.state.room_id(), "room shutting down");
                break;
            }
            let before = self.status_key();
            self.handle(cmd);
            self.report_status_if_changed(before);

            debug_assert_eq!(
                self.state.check_invariants(),
                Ok(()),
                "room {} broke an invariant",
                self.state.room_id()
            );
        }

        tracing::info!(room_id = %self.state.room_id(), "room actor stopped");
    }

    fn handle(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Connect {
                connection,
                player,
                sender,
                reply,
            } => {
                let result = self.handle_connect(connection, player, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Disconnect { connection, reply } => {
                let removed = self.handle_disconnect(connection);
                let _ = reply.send(removed);
            }
            RoomCommand::RemovePlayer { player_id, reply } => {
                let result = self.handle_remove(&player_id);
                let _ = reply.send(result);
            }
            RoomCommand::Guess {
                player_id,
                message,
                reply,
            } => {
                let result = self.handle_guess(player_id, &message);
                let _ = reply.send(result);
            }
            RoomCommand::Draw { player_id, data } => {
                self.handle_draw(&player_id, data);
            }
            RoomCommand::Start { reply } => {
                let result = self.state.start().map(|t| self.after_transition(t, "admin start"));
                let _ = reply.send(result);
            }
            RoomCommand::Restart { reply } => {
                let result = self
                    .state
                    .restart()
                    .map(|t| self.after_transition(t, "admin restart"));
                let _ = reply.send(result);
            }
            RoomCommand::End { reply } => {
                let transition = self.state.end();
                self.after_transition(transition, "admin end");
                if transition == Transition::Unchanged {
                    self.broadcast();
                }
                let _ = reply.send(());
            }
            RoomCommand::Stats { reply } => {
                let _ = reply.send(self.state.stats());
            }
            RoomCommand::Timeout { generation } => {
                self.handle_timeout(generation);
            }
            RoomCommand::Shutdown => {}
        }
    }

    fn handle_connect(
        &mut self,
        connection: ConnectionId,
        player: Player,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let player_id = player.id.clone();
        let transition = self.state.join(connection, player)?;
        self.senders.insert(connection, sender);
        tracing::info!(
            room_id = %self.state.room_id(),
            %player_id,
            %connection,
            players = self.state.roster().len(),
            "player joined"
        );

        self.after_transition(transition, "roster reached threshold");
        if transition == Transition::Unchanged {
            self.broadcast();
        }

        let drawing = RoomOutbound::Drawing(Arc::from(self.state.drawing()));
        if !self.send(connection, drawing) && self.reap(vec![connection]) {
            self.broadcast();
        }
        Ok(())
    }

    fn handle_disconnect(&mut self, connection: ConnectionId) -> Option<PlayerId> {
        self.senders.remove(&connection);
        let Some((member, transition)) = self.state.leave(connection) else {
            tracing::debug!(
                room_id = %self.state.room_id(),
                %connection,
                "disconnect for a connection with no player bound"
            );
            return None;
        };
        tracing::info!(
            room_id = %self.state.room_id(),
            player_id = %member.player.id,
            %connection,
            players = self.state.roster().len(),
            "player left"
        );
        self.after_transition(transition, "player left");
        if transition == Transition::Unchanged {
            self.broadcast();
        }
        Some(member.player.id)
    }

    fn handle_remove(&mut self, player_id: &PlayerId) -> Result<(), RoomError> {
        let (member, transition) = self.state.remove_player(player_id)?;
        self.senders.remove(&member.connection);
        tracing::info!(
            room_id = %self.state.room_id(),
            %player_id,
            "player removed"
        );
        self.after_transition(transition, "player removed");
        if transition == Transition::Unchanged {
            self.broadcast();
        }
        Ok(())
    }

    fn handle_guess(&mut self, player_id: PlayerId, message: &str) -> Result<GuessResult, RoomError> {
        let result = self.state.guess(player_id.clone(), message)?;
        tracing::debug!(
            room_id = %self.state.room_id(),
            %player_id,
            status = ?result.status,
            "guess scored"
        );
        if result.winner.is_some() {
            self.after_transition(Transition::Restarted, "clue guessed");
        }
        Ok(result)
    }

    fn handle_draw(&mut self, player_id: &PlayerId, data: Vec<u8>) {
        let len = data.len();
        if !self.state.update_drawing(player_id, data) {
            tracing::debug!(
                room_id = %self.state.room_id(),
                %player_id,
                "drawing from a player who is not drawing, ignoring"
            );
            return;
        }
        tracing::trace!(room_id = %self.state.room_id(), bytes = len, "drawing updated");

        let data: Arc<[u8]> = Arc::from(self.state.drawing());
        let dead: Vec<ConnectionId> = self
            .state
            .roster()
            .iter()
            .filter(|m| !self.send(m.connection, RoomOutbound::Drawing(Arc::clone(&data))))
            .map(|m| m.connection)
            .collect();
        if self.reap(dead) {
            self.broadcast();
        }
    }

    fn handle_timeout(&mut self, generation: u64) {
        let Some((expired, transition)) = self.state.timeout(generation) else {
            tracing::debug!(
                room_id = %self.state.room_id(),
                generation,
                current = self.state.generation(),
                "stale timer fire ignored"
            );
            return;
        };
        tracing::info!(
            room_id = %self.state.room_id(),
            clue = %expired.word,
            "turn timed out"
        );
        self.export(TelemetryEvent::Timeout(TimeoutReport {
            room_id: self.state.room_id().clone(),
            clue: expired.word,
        }));
        self.after_transition(transition, "turn timed out");
    }

    /// Logs a transition and broadcasts if it changed anything.
    fn after_transition(&mut self, transition: Transition, cause: &'static str) {
        match transition {
            Transition::Unchanged => return,
            Transition::Started => tracing::info!(
                room_id = %self.state.room_id(),
                turn_holder = ?self.state.turn_holder(),
                cause,
                "game started"
            ),
            Transition::Restarted => tracing::info!(
                room_id = %self.state.room_id(),
                turn_holder = ?self.state.turn_holder(),
                generation = self.state.generation(),
                cause,
                "new turn"
            ),
            Transition::Ended => tracing::info!(
                room_id = %self.state.room_id(),
                cause,
                "game ended"
            ),
        }
        self.broadcast();
    }

    /// Sends every member its projection. Members whose channel is closed
    /// are removed and the survivors are sent the updated roster.
    fn broadcast(&mut self) {
        loop {
            let dead: Vec<ConnectionId> = self
                .state
                .roster()
                .iter()
                .filter(|m| {
                    let view = project(&self.state, &m.player.id);
                    !self.send(m.connection, RoomOutbound::State(view))
                })
                .map(|m| m.connection)
                .collect();
            if !self.reap(dead) {
                break;
            }
        }
    }

    /// Removes members whose send failed. Returns `true` if any were still
    /// in the roster.
    fn reap(&mut self, dead: Vec<ConnectionId>) -> bool {
        let mut removed = false;
        for connection in dead {
            self.senders.remove(&connection);
            if let Some((member, transition)) = self.state.leave(connection) {
                tracing::info!(
                    room_id = %self.state.room_id(),
                    player_id = %member.player.id,
                    %connection,
                    ?transition,
                    "send failed, dropping player"
                );
                removed = true;
            }
        }
        removed
    }

    fn send(&self, connection: ConnectionId, msg: RoomOutbound) -> bool {
        self.senders
            .get(&connection)
            .is_some_and(|sender| sender.send(msg).is_ok())
    }

    fn status_key(&self) -> StatusKey {
        (self.state.player_ids(), self.state.turn_holder().cloned())
    }

    fn report_status_if_changed(&self, before: StatusKey) {
        let (active_players, current_drawer) = self.status_key();
        if (&active_players, &current_drawer) == (&before.0, &before.1) {
            return;
        }
        self.export(TelemetryEvent::RoomStatus(RoomStatusReport {
            room_id: self.state.room_id().clone(),
            active_players,
            current_drawer,
        }));
    }

    /// Hands `event` to the telemetry sink on its own task.
    fn export(&self, event: TelemetryEvent) {
        let telemetry = Arc::clone(&self.telemetry);
        tokio::spawn(async move {
            let room_id = event.room_id().clone();
            let kind = event.kind();
            if let Err(err) = telemetry.report(event).await {
                tracing::warn!(%room_id, kind, error = %err, "telemetry report failed");
            }
        });
    }
}

/// Spawns a room actor and returns a handle to it.
///
/// `config.channel_size` bounds the command queue; senders wait when it is
/// full.
pub(crate) fn spawn_room<T: Telemetry>(
    room_id: RoomId,
    config: &RoomConfig,
    corpus: Arc<ClueCorpus>,
    telemetry: Arc<T>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let timer = RoomTimer::new(config.timer_config(), &tx);
    let state = RoomState::new(room_id.clone(), config, ClueSource::new(corpus), timer);

    let actor = RoomActor {
        state,
        senders: HashMap::new(),
        telemetry,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
