//! Single-shot turn deadlines for Doodle rooms.
//!
//! Each room owns one [`RoomTimer`]. Arming it spawns a task that sleeps on
//! Tokio's clock until the deadline and then posts a caller-supplied event
//! into the room's command queue. The timer never touches room state
//! itself; the room applies the event in order with everything else it
//! receives.
//!
//! # Cancellation
//!
//! [`RoomTimer::arm`] aborts the previous task before spawning the next,
//! so at most one timer task per room is ever live. An event that was
//! already queued before the abort still arrives; rooms tag events with a
//! generation number and drop stale ones.
//!
//! ```ignore
//! let deadline = timer.arm(RoomCommand::Timeout { generation });
//! // ... later, in the room's command loop:
//! RoomCommand::Timeout { generation } if generation != self.generation => {
//!     // stale, ignore
//! }
//! ```
//!
//! The timer holds only a weak sender, so an armed timer does not keep a
//! room's queue open after the room is dropped.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    /// How long a turn lasts before it is forced to advance.
    pub turn_duration: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            turn_duration: Duration::from_secs(15),
        }
    }
}

impl TimerConfig {
    /// Shortest accepted turn.
    pub const MIN_TURN: Duration = Duration::from_millis(10);
    /// Longest accepted turn.
    pub const MAX_TURN: Duration = Duration::from_secs(60 * 60);

    pub fn with_turn_duration(turn_duration: Duration) -> Self {
        Self { turn_duration }
    }

    /// Clamps the turn duration into [`Self::MIN_TURN`]..=[`Self::MAX_TURN`].
    pub fn validated(mut self) -> Self {
        let clamped = self.turn_duration.clamp(Self::MIN_TURN, Self::MAX_TURN);
        if clamped != self.turn_duration {
            warn!(
                requested_ms = self.turn_duration.as_millis() as u64,
                clamped_ms = clamped.as_millis() as u64,
                "turn duration out of range, clamping"
            );
            self.turn_duration = clamped;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Deadline
// ---------------------------------------------------------------------------

/// When an armed timer will fire, on both clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    /// Tokio instant the timer task sleeps until.
    pub instant: Instant,
    /// Wall-clock equivalent in Unix milliseconds, for clients.
    pub unix_ms: u64,
}

impl Deadline {
    fn after(duration: Duration) -> Self {
        let unix_ms = SystemTime::now()
            .checked_add(duration)
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            instant: Instant::now() + duration,
            unix_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

struct Armed {
    handle: JoinHandle<()>,
    deadline: Deadline,
}

/// A per-room single-shot timer that delivers `E` into a command queue.
pub struct RoomTimer<E: Send + 'static> {
    config: TimerConfig,
    target: mpsc::WeakSender<E>,
    armed: Option<Armed>,
    arm_count: u64,
}

impl<E: Send + 'static> RoomTimer<E> {
    /// Creates an idle timer that will post into `target`'s queue.
    pub fn new(config: TimerConfig, target: &mpsc::Sender<E>) -> Self {
        let config = config.validated();
        debug!(
            turn_ms = config.turn_duration.as_millis() as u64,
            "room timer created"
        );
        Self {
            config,
            target: target.downgrade(),
            armed: None,
            arm_count: 0,
        }
    }

    /// Cancels any live timer, then schedules `event` after the configured
    /// turn duration.
    pub fn arm(&mut self, event: E) -> Deadline {
        self.cancel();

        let deadline = Deadline::after(self.config.turn_duration);
        let target = self.target.clone();
        self.arm_count += 1;
        let arm = self.arm_count;

        let handle = tokio::spawn(async move {
            time::sleep_until(deadline.instant).await;
            let Some(sender) = target.upgrade() else {
                trace!(arm, "timer fired after its room was dropped");
                return;
            };
            trace!(arm, "timer fired");
            if sender.send(event).await.is_err() {
                trace!(arm, "room queue closed before timeout was delivered");
            }
        });

        self.armed = Some(Armed { handle, deadline });
        deadline
    }

    /// Aborts the live timer, if any. Returns `true` if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some(armed) => {
                let pending = !armed.handle.is_finished();
                armed.handle.abort();
                if pending {
                    trace!(arm = self.arm_count, "timer cancelled");
                }
                pending
            }
            None => false,
        }
    }

    /// `true` while a timer task is waiting to fire.
    pub fn is_armed(&self) -> bool {
        self.armed
            .as_ref()
            .is_some_and(|armed| !armed.handle.is_finished())
    }

    /// The deadline of the most recent arm, until cancelled.
    pub fn deadline(&self) -> Option<Deadline> {
        self.armed.as_ref().map(|armed| armed.deadline)
    }

    /// Number of times this timer has been armed.
    pub fn arm_count(&self) -> u64 {
        self.arm_count
    }

    pub fn turn_duration(&self) -> Duration {
        self.config.turn_duration
    }
}

impl<E: Send + 'static> Drop for RoomTimer<E> {
    fn drop(&mut self) {
        self.cancel();
    }
}
