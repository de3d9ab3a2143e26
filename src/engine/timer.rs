//! Owned, cancellable timers
//!
//! Every delay in the engine (reveal steps, countdown ticks, failure
//! resets, debounce windows) is armed on the round's `TimerWheel`. The
//! wheel is part of the round state, so tearing a round down drops every
//! pending timer with it; nothing can fire on behalf of an exercise that
//! no longer exists.

use serde::{Deserialize, Serialize};

use super::state::RevealPhase;

/// Cancellation handle for an armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerId(u32);

/// What to do when a timer fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerAction {
    /// Step the success reveal into the given phase
    EnterReveal(RevealPhase),
    /// Decrement the reveal countdown
    CountdownTick,
    /// Clear correctness marks on the place-value slots (placed digits stay)
    ClearSlotMarks,
    /// Clear a wrong difference answer from the answer area
    ClearWrongAnswer,
    /// End the plain success indicator and start the next round
    FinishSuccessHold,
    /// Close the tilt bounce debounce window
    TiltSettle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Timer {
    id: TimerId,
    remaining: f32,
    action: TimerAction,
}

/// Deadline scheduler driven by explicit `advance` calls
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimerWheel {
    timers: Vec<Timer>,
    next_id: u32,
}

impl TimerWheel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a timer; the returned handle cancels it early
    pub fn arm(&mut self, delay: f32, action: TimerAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            remaining: delay.max(0.0),
            action,
        });
        id
    }

    /// Cancel one timer; true if it was still pending
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.id != id);
        self.timers.len() != before
    }

    /// Cancel every pending timer (round teardown)
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Number of timers still pending
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    /// Whether a handle is still armed
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.timers.iter().any(|timer| timer.id == id)
    }

    /// Advance all timers by `dt` seconds; returns due actions in deadline order
    pub fn advance(&mut self, dt: f32) -> Vec<TimerAction> {
        for timer in &mut self.timers {
            timer.remaining -= dt;
        }

        let mut due = Vec::new();
        let mut keep = Vec::new();
        for timer in self.timers.drain(..) {
            if timer.remaining <= 0.0 {
                due.push(timer);
            } else {
                keep.push(timer);
            }
        }
        self.timers = keep;

        // Most overdue first, so chained steps fire in the order they
        // would have with finer-grained advances
        due.sort_by(|a, b| {
            a.remaining
                .partial_cmp(&b.remaining)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        due.into_iter().map(|timer| timer.action).collect()
    }
}
