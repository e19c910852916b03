//! The room state machine.
//!
//! [`RoomState`] holds everything a room knows and applies every
//! transition synchronously. It does no I/O: the actor in `room.rs` feeds
//! it commands, broadcasts projections afterwards, and reports telemetry.
//! The turn timer is reached through the [`TurnTimer`] seam so transitions
//! can be tested without a runtime.

use doodle_clue::{ClueSource, GuessScorer, Score};
use doodle_protocol::{Clue, GuessResult, Player, PlayerId, RoomId};
use doodle_transport::ConnectionId;
use serde::Serialize;

use crate::{RoomConfig, RoomError, RoomPhase};

/// Arms and cancels the single-shot turn deadline.
pub(crate) trait TurnTimer {
    /// Cancels any pending deadline and schedules a new one for
    /// `generation`. Returns the deadline as Unix milliseconds.
    fn rearm(&mut self, generation: u64) -> u64;

    fn cancel(&mut self);
}

/// A roster entry: one player bound to one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Member {
    pub(crate) connection: ConnectionId,
    pub(crate) player: Player,
}

/// What a command did to the game, for logging and broadcasting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    /// The phase and the turn are as they were.
    Unchanged,
    /// Waiting → Active.
    Started,
    /// Active → Active with a new turn holder and clue.
    Restarted,
    /// Active → Waiting.
    Ended,
}

/// Admin-facing snapshot of a room. Includes the clue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    pub room_id: RoomId,
    pub is_active: bool,
    pub turn_holder: Option<PlayerId>,
    pub connected_player_count: usize,
    pub player_ids: Vec<PlayerId>,
    pub clue: Option<Clue>,
    /// Incremented every time a turn begins.
    pub generation: u64,
}

pub(crate) struct RoomState<T> {
    room_id: RoomId,
    min_players: usize,
    roster: Vec<Member>,
    turn_holder: Option<PlayerId>,
    clue: Option<Clue>,
    drawing: Vec<u8>,
    deadline: Option<u64>,
    generation: u64,
    clues: ClueSource,
    scorer: GuessScorer,
    timer: T,
}

impl<T> RoomState<T> {
    pub(crate) fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub(crate) fn phase(&self) -> RoomPhase {
        if self.turn_holder.is_some() {
            RoomPhase::Active
        } else {
            RoomPhase::Waiting
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.phase().is_active()
    }

    /// Members in join order.
    pub(crate) fn roster(&self) -> &[Member] {
        &self.roster
    }

    pub(crate) fn player_ids(&self) -> Vec<PlayerId> {
        self.roster.iter().map(|m| m.player.id.clone()).collect()
    }

    pub(crate) fn member(&self, player_id: &PlayerId) -> Option<&Member> {
        self.roster.iter().find(|m| &m.player.id == player_id)
    }

    pub(crate) fn turn_holder(&self) -> Option<&PlayerId> {
        self.turn_holder.as_ref()
    }

    pub(crate) fn clue(&self) -> Option<&Clue> {
        self.clue.as_ref()
    }

    pub(crate) fn drawing(&self) -> &[u8] {
        &self.drawing
    }

    pub(crate) fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn stats(&self) -> RoomStats {
        RoomStats {
            room_id: self.room_id.clone(),
            is_active: self.is_active(),
            turn_holder: self.turn_holder.clone(),
            connected_player_count: self.roster.len(),
            player_ids: self.player_ids(),
            clue: self.clue.clone(),
            generation: self.generation,
        }
    }

    /// Checks the structural invariants. Returns the first violation.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        for (i, member) in self.roster.iter().enumerate() {
            if self.roster[..i].iter().any(|m| m.player.id == member.player.id) {
                return Err(format!("player {} is in the roster twice", member.player.id));
            }
        }
        match &self.turn_holder {
            Some(holder) => {
                if self.member(holder).is_none() {
                    return Err(format!("turn holder {holder} is not in the roster"));
                }
                if self.roster.len() < RoomConfig::MIN_ACTIVE_ROSTER {
                    return Err(format!("active with {} player(s)", self.roster.len()));
                }
                if self.clue.is_none() || self.deadline.is_none() {
                    return Err("active without a clue or deadline".into());
                }
            }
            None => {
                if self.clue.is_some() || self.deadline.is_some() {
                    return Err("waiting with a clue or deadline".into());
                }
                if !self.drawing.is_empty() {
                    return Err("waiting with a non-empty drawing".into());
                }
            }
        }
        Ok(())
    }
}

impl<T: TurnTimer> RoomState<T> {
    pub(crate) fn new(room_id: RoomId, config: &RoomConfig, clues: ClueSource, timer: T) -> Self {
        Self {
            room_id,
            min_players: config.min_players.max(RoomConfig::MIN_ACTIVE_ROSTER),
            roster: Vec::new(),
            turn_holder: None,
            clue: None,
            drawing: Vec::new(),
            deadline: None,
            generation: 0,
            clues,
            scorer: GuessScorer::new(config.close_threshold),
            timer,
        }
    }

    /// Appends a player. Starts the game if the roster reaches the
    /// activation threshold.
    pub(crate) fn join(
        &mut self,
        connection: ConnectionId,
        player: Player,
    ) -> Result<Transition, RoomError> {
        if self.member(&player.id).is_some() {
            return Err(RoomError::PlayerIdAlreadyInUse(player.id, self.room_id.clone()));
        }
        self.roster.push(Member { connection, player });

        if !self.is_active() && self.roster.len() >= self.min_players {
            self.advance();
            return Ok(Transition::Started);
        }
        Ok(Transition::Unchanged)
    }

    /// Removes whoever is bound to `connection`. `None` if nobody is, which
    /// happens when a player has already reconnected on a newer socket.
    pub(crate) fn leave(&mut self, connection: ConnectionId) -> Option<(Member, Transition)> {
        let index = self.roster.iter().position(|m| m.connection == connection)?;
        Some(self.remove_at(index))
    }

    /// Removes a player by id, whatever connection it is on.
    pub(crate) fn remove_player(
        &mut self,
        player_id: &PlayerId,
    ) -> Result<(Member, Transition), RoomError> {
        let index = self
            .roster
            .iter()
            .position(|m| &m.player.id == player_id)
            .ok_or_else(|| RoomError::NoPlayerWithThisId(player_id.clone(), self.room_id.clone()))?;
        Ok(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> (Member, Transition) {
        let member = self.roster.remove(index);
        if !self.is_active() {
            return (member, Transition::Unchanged);
        }
        if self.roster.len() < RoomConfig::MIN_ACTIVE_ROSTER {
            self.finish();
            return (member, Transition::Ended);
        }
        if self.turn_holder.as_ref() != Some(&member.player.id) {
            return (member, Transition::Unchanged);
        }

        // The turn passes to whoever followed the departed holder.
        let next = self
            .roster
            .get(index % self.roster.len())
            .map(|m| m.player.id.clone());
        match next {
            Some(next) => self.begin_turn(next),
            None => self.finish(),
        }
        (member, Transition::Restarted)
    }

    /// Starts a waiting room. A no-op if the room is already active.
    pub(crate) fn start(&mut self) -> Result<Transition, RoomError> {
        if self.is_active() {
            return Ok(Transition::Unchanged);
        }
        self.require_players()?;
        self.advance();
        Ok(Transition::Started)
    }

    /// Begins a fresh turn with the next holder, starting the room if it was
    /// waiting.
    pub(crate) fn restart(&mut self) -> Result<Transition, RoomError> {
        self.require_players()?;
        let was_active = self.is_active();
        self.advance();
        Ok(if was_active {
            Transition::Restarted
        } else {
            Transition::Started
        })
    }

    /// Returns the room to waiting. The roster is kept.
    pub(crate) fn end(&mut self) -> Transition {
        if !self.is_active() {
            return Transition::Unchanged;
        }
        self.finish();
        Transition::Ended
    }

    /// Applies a timer fire. Returns the clue that expired, or `None` if the
    /// fire belongs to an earlier turn.
    pub(crate) fn timeout(&mut self, generation: u64) -> Option<(Clue, Transition)> {
        if generation != self.generation {
            return None;
        }
        let expired = self.clue.clone()?;
        if self.roster.len() < RoomConfig::MIN_ACTIVE_ROSTER {
            self.finish();
            return Some((expired, Transition::Ended));
        }
        self.advance();
        Some((expired, Transition::Restarted))
    }

    /// Scores a guess. A correct guess immediately begins the next turn.
    ///
    /// Only roster members may guess. The drawer already sees the word, so
    /// their guesses always miss.
    pub(crate) fn guess(
        &mut self,
        player_id: PlayerId,
        message: &str,
    ) -> Result<GuessResult, RoomError> {
        let (Some(drawer), Some(clue)) = (self.turn_holder.clone(), self.clue.clone()) else {
            return Err(RoomError::GameNotStarted(self.room_id.clone()));
        };
        if self.member(&player_id).is_none() {
            return Err(RoomError::NoPlayerWithThisId(player_id, self.room_id.clone()));
        }
        if player_id == drawer {
            return Ok(GuessResult::miss());
        }
        match self.scorer.score(message, &clue.word) {
            Score::Exact => {
                self.advance();
                Ok(GuessResult::win(clue, player_id, drawer))
            }
            Score::Close(_) => Ok(GuessResult::is_close()),
            Score::Miss(_) => Ok(GuessResult::miss()),
        }
    }

    /// Replaces the drawing buffer. Only the turn holder may draw; returns
    /// `false` and changes nothing for anyone else.
    pub(crate) fn update_drawing(&mut self, player_id: &PlayerId, data: Vec<u8>) -> bool {
        if self.turn_holder.as_ref() != Some(player_id) {
            return false;
        }
        self.drawing = data;
        true
    }

    fn require_players(&self) -> Result<(), RoomError> {
        if self.roster.len() < RoomConfig::MIN_ACTIVE_ROSTER {
            return Err(RoomError::NotEnoughPlayers {
                room_id: self.room_id.clone(),
                players: self.roster.len(),
            });
        }
        Ok(())
    }

    /// The member after the current holder in join order, wrapping. The
    /// first member if nobody holds the turn.
    fn successor(&self) -> Option<PlayerId> {
        let next = self
            .turn_holder
            .as_ref()
            .and_then(|holder| self.roster.iter().position(|m| &m.player.id == holder))
            .map_or(0, |i| (i + 1) % self.roster.len());
        self.roster.get(next).map(|m| m.player.id.clone())
    }

    fn advance(&mut self) {
        match self.successor() {
            Some(next) => self.begin_turn(next),
            None => self.finish(),
        }
    }

    fn begin_turn(&mut self, holder: PlayerId) {
        self.generation += 1;
        self.clue = Some(self.clues.next_clue());
        self.drawing.clear();
        self.deadline = Some(self.timer.rearm(self.generation));
        self.turn_holder = Some(holder);
    }

    fn finish(&mut self) {
        self.timer.cancel();
        self.turn_holder = None;
        self.clue = None;
        self.drawing.clear();
        self.deadline = None;
    }
}
