//! Integration tests for rooms and the registry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use doodle_clue::ClueCorpus;
use doodle_protocol::{GuessStatus, Player, PlayerGuess, PlayerId, RoomId, RoomView};
use doodle_room::{
    PlayerSender, RoomConfig, RoomError, RoomOutbound, RoomRegistry, Telemetry, TelemetryError,
    TelemetryEvent,
};
use doodle_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

/// Every clue is "cat", so tests know the answer.
fn corpus() -> Arc<ClueCorpus> {
    Arc::new(ClueCorpus::new([("animals", vec!["cat"])]).unwrap())
}

fn registry() -> RoomRegistry {
    RoomRegistry::new(RoomConfig::default(), corpus())
}

fn rid(id: &str) -> RoomId {
    RoomId::new(id)
}

fn pid(id: &str) -> PlayerId {
    PlayerId::new(id)
}

fn player(id: &str) -> Player {
    Player::new(pid(id), None)
}

fn conn(id: u64) -> ConnectionId {
    ConnectionId::new(id)
}

fn channel() -> (PlayerSender, mpsc::UnboundedReceiver<RoomOutbound>) {
    mpsc::unbounded_channel()
}

/// Everything already queued for a connection.
fn drain(rx: &mut mpsc::UnboundedReceiver<RoomOutbound>) -> Vec<RoomOutbound> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

/// The most recent projection queued for a connection.
fn latest_view(rx: &mut mpsc::UnboundedReceiver<RoomOutbound>) -> Option<RoomView> {
    drain(rx).into_iter().rev().find_map(|msg| match msg {
        RoomOutbound::State(view) => Some(view),
        RoomOutbound::Drawing(_) => None,
    })
}

fn drawings(rx: &mut mpsc::UnboundedReceiver<RoomOutbound>) -> Vec<Vec<u8>> {
    drain(rx)
        .into_iter()
        .filter_map(|msg| match msg {
            RoomOutbound::Drawing(data) => Some(data.to_vec()),
            RoomOutbound::State(_) => None,
        })
        .collect()
}

/// Lets spawned tasks run.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl Recorder {
    fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Telemetry for Recorder {
    async fn report(&self, event: TelemetryEvent) -> Result<(), TelemetryError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

struct Failing;

impl Telemetry for Failing {
    async fn report(&self, _event: TelemetryEvent) -> Result<(), TelemetryError> {
        Err(TelemetryError::Status(500))
    }
}

// =========================================================================
// Registry basics
// =========================================================================

#[tokio::test]
async fn test_create_and_lookup_room() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    assert_eq!(reg.room_count(), 1);
    assert!(reg.get_room(&rid("2")).is_ok());
    assert!(matches!(
        reg.get_room(&rid("3")),
        Err(RoomError::NoRoomWithThisId(_))
    ));
}

#[tokio::test]
async fn test_duplicate_room_id_rejected() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let err = reg.create_room(rid("2")).err().unwrap();
    assert_eq!(err, RoomError::RoomIdAlreadyInUse(rid("2")));
    assert_eq!(reg.room_count(), 1);
}

#[tokio::test]
async fn test_get_or_create_is_idempotent() {
    let mut reg = registry();
    reg.get_or_create_room(rid("2"));
    reg.get_or_create_room(rid("2"));
    reg.get_or_create_room(rid("1"));
    let stats = reg.overall_stats();
    assert_eq!(stats.room_count, 2);
    assert_eq!(stats.room_ids, vec![rid("1"), rid("2")]);
}

#[tokio::test]
async fn test_connect_to_unknown_room() {
    let mut reg = registry();
    let (tx, _rx) = channel();
    let err = reg
        .connect(&rid("9"), player("a"), conn(1), tx)
        .await
        .err()
        .unwrap();
    assert_eq!(err, RoomError::NoRoomWithThisId(rid("9")));
}

#[tokio::test]
async fn test_auto_create_on_connect() {
    let mut reg = registry().with_auto_create(true);
    let (tx, _rx) = channel();
    reg.connect(&rid("9"), player("a"), conn(1), tx).await.unwrap();
    assert_eq!(reg.room_ids(), vec![rid("9")]);
}

#[tokio::test]
async fn test_room_for_join_honours_auto_create() {
    let mut reg = registry();
    let err = reg.room_for_join(&rid("9")).err().unwrap();
    assert_eq!(err, RoomError::NoRoomWithThisId(rid("9")));
    assert_eq!(reg.room_count(), 0);

    let mut reg = registry().with_auto_create(true);
    let handle = reg.room_for_join(&rid("9")).unwrap();
    assert_eq!(handle.room_id(), &rid("9"));
    assert_eq!(reg.room_ids(), vec![rid("9")]);
}

#[tokio::test]
async fn test_bind_and_unbind_outside_the_registry() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();

    let handle = reg.room_for_join(&rid("2")).unwrap();
    let (tx, _rx) = channel();
    handle.connect(conn(1), player("a"), tx).await.unwrap();
    reg.bind_connection(conn(1), rid("2"), pid("a"));
    assert_eq!(reg.connection(conn(1)), Some(&(rid("2"), pid("a"))));

    let handle = reg.unbind_connection(conn(1)).unwrap();
    assert!(reg.connection(conn(1)).is_none());
    assert!(reg.unbind_connection(conn(1)).is_none());
    assert_eq!(handle.disconnect(conn(1)).await.unwrap(), Some(pid("a")));
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert!(stats.player_ids.is_empty());
}

#[tokio::test]
async fn test_unbind_after_room_deleted() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    reg.bind_connection(conn(1), rid("2"), pid("a"));
    reg.delete_room(&rid("2")).await.unwrap();
    assert!(reg.unbind_connection(conn(1)).is_none());
}

#[tokio::test]
async fn test_delete_room_closes_connections() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let (tx, mut rx) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx).await.unwrap();

    reg.delete_room(&rid("2")).await.unwrap();
    assert_eq!(reg.room_count(), 0);
    assert!(reg.connection(conn(1)).is_none());
    while rx.recv().await.is_some() {}

    assert!(matches!(
        reg.delete_room(&rid("2")).await,
        Err(RoomError::NoRoomWithThisId(_))
    ));
}

// =========================================================================
// Joining and activation
// =========================================================================

#[tokio::test]
async fn test_first_join_waits_second_starts() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();

    reg.connect(&rid("2"), player("a"), conn(1), tx_a).await.unwrap();
    let first = drain(&mut rx_a);
    assert_eq!(first.len(), 2, "projection then drawing buffer");
    let RoomOutbound::State(view) = &first[0] else {
        panic!("expected a projection first");
    };
    assert!(!view.is_active());
    assert!(matches!(&first[1], RoomOutbound::Drawing(d) if d.is_empty()));

    reg.connect(&rid("2"), player("b"), conn(2), tx_b).await.unwrap();
    let drawer = latest_view(&mut rx_a).unwrap();
    let guesser = latest_view(&mut rx_b).unwrap();

    assert!(matches!(drawer, RoomView::Drawer(_)));
    assert_eq!(drawer.clue().map(|c| c.word.as_str()), Some("cat"));
    assert!(matches!(guesser, RoomView::Guesser(_)));
    assert!(guesser.is_active());
    assert_eq!(guesser.turn_holder(), Some(&pid("a")));
    assert!(guesser.clue().is_none());
    assert_eq!(drawer.deadline(), guesser.deadline());

    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert!(stats.is_active);
    assert_eq!(stats.player_ids, vec![pid("a"), pid("b")]);
    assert_eq!(stats.generation, 1);
}

#[tokio::test]
async fn test_duplicate_player_rejected() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let (tx_a, _rx_a) = channel();
    let (tx_dup, mut rx_dup) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx_a).await.unwrap();

    let err = reg
        .connect(&rid("2"), player("a"), conn(2), tx_dup)
        .await
        .err()
        .unwrap();
    assert_eq!(err, RoomError::PlayerIdAlreadyInUse(pid("a"), rid("2")));
    assert!(drain(&mut rx_dup).is_empty());

    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.connected_player_count, 1);
    assert!(!stats.is_active);
}

#[tokio::test]
async fn test_third_join_only_updates_roster() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let (tx_a, mut rx_a) = channel();
    let (tx_b, _rx_b) = channel();
    let (tx_c, mut rx_c) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx_a).await.unwrap();
    reg.connect(&rid("2"), player("b"), conn(2), tx_b).await.unwrap();
    drain(&mut rx_a);

    reg.connect(&rid("2"), player("c"), conn(3), tx_c).await.unwrap();
    let view = latest_view(&mut rx_a).unwrap();
    assert_eq!(view.players().len(), 3);
    assert_eq!(view.turn_holder(), Some(&pid("a")));
    assert_eq!(latest_view(&mut rx_c).unwrap().turn_holder(), Some(&pid("a")));

    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.generation, 1);
}

// =========================================================================
// Guessing
// =========================================================================

async fn active_room(
    reg: &mut RoomRegistry,
) -> (
    mpsc::UnboundedReceiver<RoomOutbound>,
    mpsc::UnboundedReceiver<RoomOutbound>,
) {
    reg.create_room(rid("2")).unwrap();
    let (tx_a, mut rx_a) = channel();
    let (tx_b, mut rx_b) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx_a).await.unwrap();
    reg.connect(&rid("2"), player("b"), conn(2), tx_b).await.unwrap();
    drain(&mut rx_a);
    drain(&mut rx_b);
    (rx_a, rx_b)
}

fn guess(player: &str, message: &str) -> PlayerGuess {
    PlayerGuess {
        room_id: rid("2"),
        player_id: pid(player),
        message: message.into(),
    }
}

#[tokio::test]
async fn test_correct_guess_wins_and_rotates() {
    let mut reg = registry();
    let (mut rx_a, mut rx_b) = active_room(&mut reg).await;

    let result = reg.submit_guess(guess("b", " Cat. ")).await.unwrap();
    assert_eq!(result.status, GuessStatus::Win);
    assert_eq!(result.winner, Some(pid("b")));
    assert_eq!(result.drawer, Some(pid("a")));
    assert_eq!(result.clue.map(|c| c.word), Some("cat".to_string()));

    assert!(matches!(latest_view(&mut rx_b), Some(RoomView::Drawer(_))));
    assert!(matches!(latest_view(&mut rx_a), Some(RoomView::Guesser(_))));

    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("b")));
    assert_eq!(stats.generation, 2);
}

#[tokio::test]
async fn test_close_and_wrong_guesses_change_nothing() {
    let mut reg = registry();
    let (mut rx_a, _rx_b) = active_room(&mut reg).await;

    let close = reg.submit_guess(guess("b", "cats")).await.unwrap();
    assert_eq!(close.status, GuessStatus::IsClose);
    assert!(close.clue.is_none());

    let miss = reg.submit_guess(guess("b", "dog")).await.unwrap();
    assert_eq!(miss.status, GuessStatus::Miss);

    assert!(drain(&mut rx_a).is_empty());
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("a")));
    assert_eq!(stats.generation, 1);
}

#[tokio::test]
async fn test_guess_from_outside_roster_rejected() {
    let mut reg = registry();
    let (mut rx_a, _rx_b) = active_room(&mut reg).await;

    let err = reg.submit_guess(guess("ghost", "cat")).await.err().unwrap();
    assert_eq!(err, RoomError::NoPlayerWithThisId(pid("ghost"), rid("2")));

    assert!(drain(&mut rx_a).is_empty());
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("a")));
    assert_eq!(stats.generation, 1);
}

#[tokio::test]
async fn test_drawer_cannot_win_own_turn() {
    let mut reg = registry();
    let (_rx_a, mut rx_b) = active_room(&mut reg).await;

    let result = reg.submit_guess(guess("a", "cat")).await.unwrap();
    assert_eq!(result.status, GuessStatus::Miss);
    assert!(result.winner.is_none());

    assert!(drain(&mut rx_b).is_empty());
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("a")));
    assert_eq!(stats.generation, 1);
}

#[tokio::test]
async fn test_guess_in_waiting_room() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let err = reg.submit_guess(guess("a", "cat")).await.err().unwrap();
    assert_eq!(err, RoomError::GameNotStarted(rid("2")));
}

#[tokio::test]
async fn test_guess_unknown_room() {
    let reg = registry();
    let err = reg.submit_guess(guess("a", "cat")).await.err().unwrap();
    assert_eq!(err, RoomError::NoRoomWithThisId(rid("2")));
}

// =========================================================================
// Drawing
// =========================================================================

#[tokio::test]
async fn test_drawer_updates_are_relayed_to_everyone() {
    let mut reg = registry();
    let (mut rx_a, mut rx_b) = active_room(&mut reg).await;

    let bytes = vec![0x00, 0xff, 0x10, 0x80];
    reg.update_drawing(&rid("2"), pid("a"), bytes.clone()).await.unwrap();
    reg.room_stats(&rid("2")).await.unwrap();

    assert_eq!(drawings(&mut rx_a), vec![bytes.clone()]);
    assert_eq!(drawings(&mut rx_b), vec![bytes.clone()]);

    // A late joiner gets the buffer too.
    let (tx_c, mut rx_c) = channel();
    reg.connect(&rid("2"), player("c"), conn(3), tx_c).await.unwrap();
    assert_eq!(drawings(&mut rx_c), vec![bytes]);
}

#[tokio::test]
async fn test_repeated_update_replaces_buffer() {
    let mut reg = registry();
    let (mut rx_a, mut rx_b) = active_room(&mut reg).await;

    let bytes = vec![3, 1, 4, 1, 5];
    reg.update_drawing(&rid("2"), pid("a"), bytes.clone()).await.unwrap();
    reg.update_drawing(&rid("2"), pid("a"), bytes.clone()).await.unwrap();
    reg.room_stats(&rid("2")).await.unwrap();

    assert_eq!(drawings(&mut rx_a), vec![bytes.clone(), bytes.clone()]);
    assert_eq!(drawings(&mut rx_b), vec![bytes.clone(), bytes.clone()]);

    let (tx_c, mut rx_c) = channel();
    reg.connect(&rid("2"), player("c"), conn(3), tx_c).await.unwrap();
    let mut joined = Vec::new();
    let mut view = None;
    for msg in drain(&mut rx_c) {
        match msg {
            RoomOutbound::Drawing(data) => joined.push(data.to_vec()),
            RoomOutbound::State(v) => view = Some(v),
        }
    }
    assert_eq!(joined, vec![bytes.clone()]);
    assert_eq!(view.unwrap().drawing(), bytes.as_slice());
}

#[tokio::test]
async fn test_guesser_drawing_ignored() {
    let mut reg = registry();
    let (mut rx_a, mut rx_b) = active_room(&mut reg).await;

    reg.update_drawing(&rid("2"), pid("b"), vec![1, 2, 3]).await.unwrap();
    reg.room_stats(&rid("2")).await.unwrap();

    assert!(drain(&mut rx_a).is_empty());
    assert!(drain(&mut rx_b).is_empty());
}

#[tokio::test]
async fn test_new_turn_clears_drawing() {
    let mut reg = registry();
    let (_rx_a, mut rx_b) = active_room(&mut reg).await;

    reg.update_drawing(&rid("2"), pid("a"), vec![7; 16]).await.unwrap();
    reg.submit_guess(guess("b", "cat")).await.unwrap();

    let view = latest_view(&mut rx_b).unwrap();
    assert!(view.drawing().is_empty());
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test]
async fn test_drawer_leaving_passes_turn() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let mut receivers = Vec::new();
    for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
        let (tx, rx) = channel();
        reg.connect(&rid("2"), player(id), conn(i as u64 + 1), tx).await.unwrap();
        receivers.push(rx);
    }

    let removed = reg.disconnect(conn(1)).await.unwrap();
    assert_eq!(removed, Some((rid("2"), pid("a"))));

    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert!(stats.is_active);
    assert_eq!(stats.turn_holder, Some(pid("b")));
    assert_eq!(stats.player_ids, vec![pid("b"), pid("c"), pid("d")]);
    assert!(matches!(latest_view(&mut receivers[1]), Some(RoomView::Drawer(_))));
}

#[tokio::test]
async fn test_dropping_to_one_player_ends_game() {
    let mut reg = registry();
    let (mut rx_a, _rx_b) = active_room(&mut reg).await;

    reg.disconnect(conn(2)).await.unwrap();
    let view = latest_view(&mut rx_a).unwrap();
    assert!(!view.is_active());
    assert!(view.turn_holder().is_none());
    assert!(view.deadline().is_none());
    assert_eq!(view.players().len(), 1);
}

#[tokio::test]
async fn test_unknown_connection_disconnect_is_noop() {
    let mut reg = registry();
    assert_eq!(reg.disconnect(conn(42)).await.unwrap(), None);
}

#[tokio::test]
async fn test_stale_disconnect_does_not_evict_reconnected_player() {
    let mut reg = registry();
    let (_rx_a, _rx_b) = active_room(&mut reg).await;
    let handle = reg.get_room(&rid("2")).unwrap();

    reg.remove_player(&rid("2"), &pid("a")).await.unwrap();
    let (tx, _rx) = channel();
    reg.connect(&rid("2"), player("a"), conn(7), tx).await.unwrap();

    // The old socket's disconnect arrives late.
    assert_eq!(handle.disconnect(conn(1)).await.unwrap(), None);
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert!(stats.player_ids.contains(&pid("a")));
}

#[tokio::test]
async fn test_failed_send_drops_player() {
    let mut reg = registry();
    let (mut rx_a, _rx_b) = active_room(&mut reg).await;
    let (tx_c, rx_c) = channel();
    reg.connect(&rid("2"), player("c"), conn(3), tx_c).await.unwrap();
    drop(rx_c);

    reg.update_drawing(&rid("2"), pid("a"), vec![1]).await.unwrap();
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.player_ids, vec![pid("a"), pid("b")]);
    assert_eq!(latest_view(&mut rx_a).unwrap().players().len(), 2);
}

#[tokio::test]
async fn test_remove_unknown_player() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let err = reg.remove_player(&rid("2"), &pid("x")).await.err().unwrap();
    assert_eq!(err, RoomError::NoPlayerWithThisId(pid("x"), rid("2")));
}

// =========================================================================
// Admin operations
// =========================================================================

#[tokio::test]
async fn test_start_needs_two_players() {
    let mut reg = registry();
    reg.create_room(rid("2")).unwrap();
    let (tx, _rx) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx).await.unwrap();
    assert_eq!(
        reg.start_game(&rid("2")).await,
        Err(RoomError::NotEnoughPlayers {
            room_id: rid("2"),
            players: 1
        })
    );
    assert!(matches!(
        reg.restart_game(&rid("2")).await,
        Err(RoomError::NotEnoughPlayers { .. })
    ));
}

#[tokio::test]
async fn test_end_keeps_roster_and_start_resumes() {
    let mut reg = registry();
    let (mut rx_a, _rx_b) = active_room(&mut reg).await;

    reg.end_game(&rid("2")).await.unwrap();
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert!(!stats.is_active);
    assert!(stats.clue.is_none());
    assert_eq!(stats.connected_player_count, 2);
    assert!(!latest_view(&mut rx_a).unwrap().is_active());

    reg.start_game(&rid("2")).await.unwrap();
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert!(stats.is_active);
    assert_eq!(stats.generation, 2);
}

#[tokio::test]
async fn test_restart_skips_turn() {
    let mut reg = registry();
    let (_rx_a, _rx_b) = active_room(&mut reg).await;
    reg.restart_game(&rid("2")).await.unwrap();
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("b")));
}

#[tokio::test]
async fn test_end_all_games() {
    let mut reg = registry();
    let (_rx_a, _rx_b) = active_room(&mut reg).await;
    reg.create_room(rid("empty")).unwrap();

    reg.end_all_games().await;
    assert!(!reg.room_stats(&rid("2")).await.unwrap().is_active);
    assert!(!reg.room_stats(&rid("empty")).await.unwrap().is_active);
}

// =========================================================================
// Turn timer
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_timeout_rotates_turn() {
    let mut reg = registry();
    let (_rx_a, mut rx_b) = active_room(&mut reg).await;

    tokio::time::sleep(Duration::from_secs(16)).await;
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("b")));
    assert_eq!(stats.generation, 2);
    assert!(matches!(latest_view(&mut rx_b), Some(RoomView::Drawer(_))));
}

#[tokio::test(start_paused = true)]
async fn test_no_timeout_before_deadline() {
    let mut reg = registry();
    let (_rx_a, _rx_b) = active_room(&mut reg).await;

    tokio::time::sleep(Duration::from_secs(14)).await;
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("a")));
    assert_eq!(stats.generation, 1);
}

#[tokio::test(start_paused = true)]
async fn test_win_resets_deadline() {
    let mut reg = registry();
    let (_rx_a, _rx_b) = active_room(&mut reg).await;

    tokio::time::sleep(Duration::from_secs(14)).await;
    reg.submit_guess(guess("b", "cat")).await.unwrap();

    // The first turn's deadline passes; the new turn is untouched.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("b")));
    assert_eq!(stats.generation, 2);
}

#[tokio::test(start_paused = true)]
async fn test_ended_game_does_not_time_out() {
    let mut reg = registry();
    let (_rx_a, _rx_b) = active_room(&mut reg).await;
    reg.end_game(&rid("2")).await.unwrap();

    tokio::time::sleep(Duration::from_secs(30)).await;
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert!(!stats.is_active);
    assert_eq!(stats.generation, 1);
}

#[tokio::test(start_paused = true)]
async fn test_custom_turn_length() {
    let config = RoomConfig::default().with_turn_timeout(Duration::from_secs(5));
    let mut reg = RoomRegistry::new(config, corpus());
    let (_rx_a, _rx_b) = active_room(&mut reg).await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    let stats = reg.room_stats(&rid("2")).await.unwrap();
    assert_eq!(stats.turn_holder, Some(pid("b")));
}

// =========================================================================
// Telemetry
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_telemetry_reports_roster_and_timeouts() {
    let recorder = Arc::new(Recorder::default());
    let mut reg =
        RoomRegistry::with_telemetry(RoomConfig::default(), corpus(), Arc::clone(&recorder));
    reg.create_room(rid("2")).unwrap();
    let (tx_a, _rx_a) = channel();
    let (tx_b, _rx_b) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx_a).await.unwrap();
    reg.connect(&rid("2"), player("b"), conn(2), tx_b).await.unwrap();
    settle().await;

    let events = recorder.events();
    assert_eq!(events.len(), 2);
    let TelemetryEvent::RoomStatus(last) = &events[1] else {
        panic!("expected a status report");
    };
    assert_eq!(last.active_players, vec![pid("a"), pid("b")]);
    assert_eq!(last.current_drawer, Some(pid("a")));

    tokio::time::sleep(Duration::from_secs(16)).await;
    reg.room_stats(&rid("2")).await.unwrap();
    settle().await;

    let events = recorder.events();
    assert!(events.iter().any(|e| matches!(
        e,
        TelemetryEvent::Timeout(report) if report.clue == "cat" && report.room_id == rid("2")
    )));
    let TelemetryEvent::RoomStatus(last) = events.last().unwrap() else {
        panic!("expected the turn change to be reported");
    };
    assert_eq!(last.current_drawer, Some(pid("b")));
}

#[tokio::test]
async fn test_guesses_are_not_reported() {
    let recorder = Arc::new(Recorder::default());
    let mut reg =
        RoomRegistry::with_telemetry(RoomConfig::default(), corpus(), Arc::clone(&recorder));
    reg.create_room(rid("2")).unwrap();
    let (tx_a, _rx_a) = channel();
    let (tx_b, _rx_b) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx_a).await.unwrap();
    reg.connect(&rid("2"), player("b"), conn(2), tx_b).await.unwrap();
    reg.submit_guess(guess("b", "dog")).await.unwrap();
    settle().await;

    assert_eq!(recorder.events().len(), 2);
}

#[tokio::test]
async fn test_failing_telemetry_does_not_disturb_room() {
    let mut reg = RoomRegistry::with_telemetry(RoomConfig::default(), corpus(), Arc::new(Failing));
    reg.create_room(rid("2")).unwrap();
    let (tx_a, _rx_a) = channel();
    let (tx_b, _rx_b) = channel();
    reg.connect(&rid("2"), player("a"), conn(1), tx_a).await.unwrap();
    reg.connect(&rid("2"), player("b"), conn(2), tx_b).await.unwrap();
    settle().await;

    let result = reg.submit_guess(guess("b", "cat")).await.unwrap();
    assert_eq!(result.status, GuessStatus::Win);
}
