//! Per-viewer projections of a room.
//!
//! A room never sends one shared snapshot. For every connection it builds
//! either a [`DrawerView`] (turn holder only) or a [`GuesserView`]
//! (everyone else). The two are separate types so that "the word never
//! reaches a guesser" is a property of the schema: `GuesserView` has no
//! field that can carry it.

use serde::{Deserialize, Serialize};

use crate::{Clue, PlayerId, RoomId};

/// One roster member as shown to clients, in join order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub nick: String,
}

/// What a guesser learns about the current drawer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerLabel {
    pub nick: String,
    /// Category name only; the word itself is withheld.
    pub category: String,
}

/// The turn holder's view. Only exists while the room is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawerView {
    pub room_id: RoomId,
    pub turn_holder: PlayerId,
    pub clue: Clue,
    /// Unix time in milliseconds at which the turn is forced to advance.
    pub deadline: u64,
    pub players: Vec<RosterEntry>,
    #[serde(with = "crate::drawing")]
    pub drawing: Vec<u8>,
}

/// Everyone else's view, active or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuesserView {
    pub room_id: RoomId,
    pub is_active: bool,
    pub turn_holder: Option<PlayerId>,
    pub drawer: Option<DrawerLabel>,
    pub deadline: Option<u64>,
    pub players: Vec<RosterEntry>,
    #[serde(with = "crate::drawing")]
    pub drawing: Vec<u8>,
}

/// A projection tagged by role: `{"role": "drawer", ...}` or
/// `{"role": "guesser", ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoomView {
    Drawer(DrawerView),
    Guesser(GuesserView),
}

impl RoomView {
    pub fn is_active(&self) -> bool {
        match self {
            Self::Drawer(_) => true,
            Self::Guesser(v) => v.is_active,
        }
    }

    pub fn turn_holder(&self) -> Option<&PlayerId> {
        match self {
            Self::Drawer(v) => Some(&v.turn_holder),
            Self::Guesser(v) => v.turn_holder.as_ref(),
        }
    }

    pub fn deadline(&self) -> Option<u64> {
        match self {
            Self::Drawer(v) => Some(v.deadline),
            Self::Guesser(v) => v.deadline,
        }
    }

    pub fn drawing(&self) -> &[u8] {
        match self {
            Self::Drawer(v) => &v.drawing,
            Self::Guesser(v) => &v.drawing,
        }
    }

    pub fn players(&self) -> &[RosterEntry] {
        match self {
            Self::Drawer(v) => &v.players,
            Self::Guesser(v) => &v.players,
        }
    }

    /// The clue, if this is the drawer's view.
    pub fn clue(&self) -> Option<&Clue> {
        match self {
            Self::Drawer(v) => Some(&v.clue),
            Self::Guesser(_) => None,
        }
    }
}
