//! Identity and game types shared by every layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's identifier, as supplied by the (already validated) client.
///
/// Newtype over `String` so a `PlayerId` can never be passed where a
/// `RoomId` is expected. `#[serde(transparent)]` keeps it a plain JSON
/// string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Creates a player id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A room's identifier. Chosen by whoever creates the room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Creates a room id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrows the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game types
// ---------------------------------------------------------------------------

/// The secret the drawer depicts: a word and the category it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Clue {
    pub category: String,
    pub word: String,
}

impl Clue {
    pub fn new(category: impl Into<String>, word: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            word: word.into(),
        }
    }
}

/// A player bound to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    /// Display name. Defaults to the id when the client sends none.
    pub nick: String,
}

impl Player {
    pub fn new(id: PlayerId, nick: Option<String>) -> Self {
        let nick = match nick {
            Some(nick) if !nick.trim().is_empty() => nick,
            _ => id.0.clone(),
        };
        Self { id, nick }
    }
}
