//! Wire protocol for Doodle.
//!
//! This crate defines what travels between a player's client and the
//! server:
//!
//! - **Identity and game types** ([`PlayerId`], [`RoomId`], [`Clue`]).
//! - **Views** ([`RoomView`], [`DrawerView`], [`GuesserView`]) - the
//!   per-viewer projection of a room. The drawer's view carries the clue;
//!   the guesser's view has no field that could hold the word.
//! - **Messages** ([`ClientMessage`], [`ServerMessage`], [`GuessResult`]).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) - text-frame encoding.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (messages) → Room (state machine)
//! ```
//!
//! Drawing buffers travel as raw binary frames. The only place they are
//! put into text is the `drawing` field of a view, which uses standard
//! base64 so that every byte value survives.

mod codec;
pub mod drawing;
mod error;
mod message;
mod types;
mod view;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{
    ClientMessage, ErrorCode, GuessResult, GuessStatus, PlayerGuess,
    ServerMessage, PROTOCOL_VERSION,
};
pub use types::{Clue, Player, PlayerId, RoomId};
pub use view::{DrawerLabel, DrawerView, GuesserView, RosterEntry, RoomView};
