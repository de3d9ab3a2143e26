//! Success reveal sequencing
//!
//! A strictly linear phase chain entered only from a validated success.
//! Each step arms exactly one timer, and only after the previous step's
//! effects are applied; all handles live on the round's wheel, so a
//! configuration change or reset tears the whole chain down at once.

use super::evaluate;
use super::state::{EnginePhase, Feedback, Level, RevealPhase, ScaleState, Signal};
use super::timer::TimerAction;
use crate::consts;

/// Enter the full phase chain (multi-digit decomposition and difference)
pub fn begin_chain(state: &mut ScaleState) {
    evaluate::force_balanced(state);
    state.emit(Signal::Feedback(Feedback::Success));
    state.phase = EnginePhase::Revealing;
    state.reveal.phase = RevealPhase::Highlighting;
    state.reveal.countdown = None;
    state.reveal.pending = Some(state.wheel.arm(
        consts::EQUATION_DELAY,
        TimerAction::EnterReveal(RevealPhase::Equation),
    ));
}

/// Plain success path: indicator only, then straight to the next round
pub fn begin_success_hold(state: &mut ScaleState) {
    evaluate::force_balanced(state);
    state.emit(Signal::Feedback(Feedback::Success));
    state.phase = EnginePhase::Revealing;
    state.reveal.pending = Some(state.wheel.arm(
        consts::SIMPLE_SUCCESS_HOLD,
        TimerAction::FinishSuccessHold,
    ));
}

/// A phase timer fired: apply the phase and arm the next step
pub fn enter_phase(state: &mut ScaleState, phase: RevealPhase) {
    let Some(exercise) = &state.exercise else {
        return;
    };
    let level = exercise.level;
    state.reveal.phase = phase;
    state.reveal.pending = None;

    match phase {
        RevealPhase::Equation => {
            // The difference level shows a proof step before counting
            let (next, delay) = if level == Level::Difference {
                (RevealPhase::Proof, consts::PROOF_DELAY)
            } else {
                (RevealPhase::Counting, consts::COUNTING_DELAY)
            };
            state.reveal.pending = Some(
                state
                    .wheel
                    .arm(delay, TimerAction::EnterReveal(next)),
            );
        }
        RevealPhase::Proof => {
            state.reveal.pending = Some(state.wheel.arm(
                consts::COUNTING_DELAY,
                TimerAction::EnterReveal(RevealPhase::Counting),
            ));
        }
        RevealPhase::Counting => {
            let start = if level == Level::Difference {
                consts::COUNTDOWN_FROM_DIFFERENCE
            } else {
                consts::COUNTDOWN_FROM_DECOMPOSE
            };
            state.reveal.countdown = Some(start);
            state.reveal.pending = Some(
                state
                    .wheel
                    .arm(consts::COUNTDOWN_TICK, TimerAction::CountdownTick),
            );
        }
        RevealPhase::Idle | RevealPhase::Highlighting => {}
    }
}

/// One countdown second elapsed; true once the chain has finished and the
/// caller should install the next round
pub fn countdown_tick(state: &mut ScaleState) -> bool {
    let Some(value) = state.reveal.countdown else {
        return false;
    };
    let value = value.saturating_sub(1);
    state.reveal.countdown = Some(value);
    if value == 0 {
        return true;
    }
    state.reveal.pending = Some(
        state
            .wheel
            .arm(consts::COUNTDOWN_TICK, TimerAction::CountdownTick),
    );
    false
}
