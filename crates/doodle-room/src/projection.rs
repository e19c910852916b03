//! Per-viewer projection of room state.

use doodle_protocol::{DrawerLabel, DrawerView, GuesserView, PlayerId, RoomView, RosterEntry};

use crate::state::RoomState;

/// Builds what `viewer` is allowed to see.
///
/// The turn holder gets a [`DrawerView`] with the clue. Everyone else,
/// including ids that are not in the roster, gets a [`GuesserView`] that
/// names the drawer and the clue's category but not the word.
pub(crate) fn project<T>(state: &RoomState<T>, viewer: &PlayerId) -> RoomView {
    let players: Vec<RosterEntry> = state
        .roster()
        .iter()
        .map(|m| RosterEntry {
            id: m.player.id.clone(),
            nick: m.player.nick.clone(),
        })
        .collect();
    let room_id = state.room_id().clone();
    let drawing = state.drawing().to_vec();

    if let (Some(holder), Some(clue), Some(deadline)) =
        (state.turn_holder(), state.clue(), state.deadline())
    {
        if holder == viewer {
            return RoomView::Drawer(DrawerView {
                room_id,
                turn_holder: holder.clone(),
                clue: clue.clone(),
                deadline,
                players,
                drawing,
            });
        }
    }

    let drawer = state.turn_holder().map(|holder| DrawerLabel {
        nick: state
            .member(holder)
            .map_or_else(|| holder.to_string(), |m| m.player.nick.clone()),
        category: state
            .clue()
            .map(|c| c.category.clone())
            .unwrap_or_default(),
    });

    RoomView::Guesser(GuesserView {
        room_id,
        is_active: state.is_active(),
        turn_holder: state.turn_holder().cloned(),
        drawer,
        deadline: state.deadline(),
        players,
        drawing,
    })
}
