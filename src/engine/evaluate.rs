//! Balance derivation
//!
//! The tilt is never stored ahead of its inputs: every placement or
//! answer mutation calls `reevaluate` before the next event is processed,
//! so reads always see totals derived from current state.

use std::cmp::Ordering;

use super::state::{
    AnswerBuffer, BalanceState, Level, PanSide, PlaceValueSlot, ScaleState, Signal,
};
use super::timer::TimerAction;
use crate::{consts, pow10};

/// Pan totals derived from placements and answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanTotals {
    pub left: u64,
    pub right: u64,
}

/// Derive both pan totals from the current state
pub fn pan_totals(state: &ScaleState) -> PanTotals {
    let mut left = state.pan_sum(PanSide::Left);
    let mut right = state.pan_sum(PanSide::Right);

    // A single-digit decomposition operand sits on a pan and weighs it
    if let Some(exercise) = &state.exercise {
        if exercise.level == Level::Decompose && exercise.digit_count == 1 {
            match exercise.operand_side {
                PanSide::Left => left += exercise.target() as u64,
                PanSide::Right => right += exercise.target() as u64,
            }
        }
    }

    // Typed answers and filled slots weigh the right side
    right += state.answer.text_value();
    right += slot_total(&state.slots);

    PanTotals { left, right }
}

/// Weighted slot sum; one unfilled slot zeroes the whole contribution
fn slot_total(slots: &[PlaceValueSlot]) -> u64 {
    let mut total = 0u64;
    for slot in slots {
        match slot.placed {
            Some(digit) => total += digit as u64 * pow10(slot.position as u32),
            None => return 0,
        }
    }
    total
}

/// Classify the tilt from totals
pub fn classify(totals: PanTotals) -> BalanceState {
    match totals.left.cmp(&totals.right) {
        Ordering::Equal => BalanceState::Balanced,
        Ordering::Greater => BalanceState::LeftHeavy,
        Ordering::Less => BalanceState::RightHeavy,
    }
}

/// Recompute the balance after a mutation and emit the change signals
pub fn reevaluate(state: &mut ScaleState) {
    let totals = pan_totals(state);
    state.emit(Signal::BalanceChanged {
        left: totals.left,
        right: totals.right,
    });

    // A chosen comparison symbol forces the tilt, whatever the pans hold
    let tilt = match (&state.exercise, &state.answer) {
        (Some(exercise), AnswerBuffer::Relation(Some(relation)))
            if exercise.level == Level::Compare =>
        {
            relation.implied_tilt()
        }
        _ => classify(totals),
    };

    if tilt != state.balance {
        state.balance = tilt;
        bounce(state, tilt);
    }
}

/// Level the beam for a success reveal, bypassing the derivation
pub fn force_balanced(state: &mut ScaleState) {
    if state.balance != BalanceState::Balanced {
        state.balance = BalanceState::Balanced;
        state.emit(Signal::Bounce(BalanceState::Balanced));
    }
}

/// Emit a bounce unless the settle window from the last one is still open
fn bounce(state: &mut ScaleState, tilt: BalanceState) {
    let window_open = state
        .tilt_settle
        .map(|id| state.wheel.is_armed(id))
        .unwrap_or(false);
    if window_open {
        return;
    }
    state.emit(Signal::Bounce(tilt));
    state.tilt_settle = Some(state.wheel.arm(consts::TILT_SETTLE, TimerAction::TiltSettle));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{
        EnginePhase, Exercise, PlacementItem, Presentation, Relation, SlotMark, TokenKind,
    };

    fn exercise(level: Level) -> Exercise {
        Exercise {
            level,
            digit_count: 1,
            concentration: 10,
            left_operand: 6,
            right_operand: 9,
            presentation: Presentation::Rod,
            operand_side: PanSide::Left,
            expected_digits: Vec::new(),
            options: Vec::new(),
        }
    }

    fn live_state(exercise: Exercise) -> ScaleState {
        let mut state = ScaleState::new(1);
        state.exercise = Some(exercise);
        state.phase = EnginePhase::AwaitingInput;
        state
    }

    fn place(state: &mut ScaleState, side: PanSide, value: u32) {
        let id = state.next_placement_id();
        state.placements.push(PlacementItem {
            id,
            value,
            origin: side,
            kind: TokenKind::FreeToken,
        });
    }

    fn bounces(state: &mut ScaleState) -> Vec<BalanceState> {
        state
            .drain_signals()
            .into_iter()
            .filter_map(|signal| match signal {
                Signal::Bounce(tilt) => Some(tilt),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_classify_matches_comparison() {
        assert_eq!(
            classify(PanTotals { left: 3, right: 3 }),
            BalanceState::Balanced
        );
        assert_eq!(
            classify(PanTotals { left: 5, right: 3 }),
            BalanceState::LeftHeavy
        );
        assert_eq!(
            classify(PanTotals { left: 3, right: 5 }),
            BalanceState::RightHeavy
        );
    }

    #[test]
    fn test_single_digit_operand_weighs_its_pan() {
        let state = live_state(exercise(Level::Decompose));
        assert_eq!(pan_totals(&state), PanTotals { left: 6, right: 0 });

        // Same operand shown on the other pan weighs that side instead
        let mut shown_right = exercise(Level::Decompose);
        shown_right.operand_side = PanSide::Right;
        let state = live_state(shown_right);
        assert_eq!(pan_totals(&state), PanTotals { left: 0, right: 6 });
    }

    #[test]
    fn test_operands_do_not_weigh_on_other_levels() {
        let state = live_state(exercise(Level::Compare));
        assert_eq!(pan_totals(&state), PanTotals { left: 0, right: 0 });
    }

    #[test]
    fn test_text_answer_weighs_right() {
        let mut state = live_state(exercise(Level::Decompose));
        state.answer = AnswerBuffer::Text("6".to_string());
        assert_eq!(pan_totals(&state), PanTotals { left: 6, right: 6 });

        state.answer = AnswerBuffer::Text("nonsense".to_string());
        assert_eq!(pan_totals(&state), PanTotals { left: 6, right: 0 });
    }

    #[test]
    fn test_slot_sum_is_all_or_nothing() {
        let mut target = exercise(Level::Decompose);
        target.digit_count = 3;
        target.left_operand = 407;
        target.expected_digits = vec![4, 0, 7];
        let mut state = live_state(target);
        state.slots = state.exercise.as_ref().unwrap().fresh_slots();

        state.slot_mut(2).unwrap().placed = Some(4);
        state.slot_mut(0).unwrap().placed = Some(7);
        // One slot still empty: slots contribute nothing
        assert_eq!(pan_totals(&state).right, 0);

        state.slot_mut(1).unwrap().placed = Some(0);
        assert_eq!(pan_totals(&state).right, 407);
    }

    #[test]
    fn test_placements_weigh_their_pans() {
        let mut state = live_state(exercise(Level::Equation));
        place(&mut state, PanSide::Left, 30);
        place(&mut state, PanSide::Left, 4);
        place(&mut state, PanSide::Right, 34);
        assert_eq!(pan_totals(&state), PanTotals { left: 34, right: 34 });
    }

    #[test]
    fn test_chosen_symbol_forces_tilt() {
        let mut state = live_state(exercise(Level::Compare));
        state.answer = AnswerBuffer::Relation(Some(Relation::Less));
        reevaluate(&mut state);
        // Pans are empty (totals equal) but the symbol asserts right-heavy
        assert_eq!(state.balance, BalanceState::RightHeavy);

        state.answer = AnswerBuffer::Relation(None);
        reevaluate(&mut state);
        assert_eq!(state.balance, BalanceState::Balanced);
    }

    #[test]
    fn test_bounce_only_on_change() {
        let mut state = live_state(exercise(Level::Equation));
        reevaluate(&mut state);
        // Balanced from the start: recompute without change, no bounce
        assert!(bounces(&mut state).is_empty());

        place(&mut state, PanSide::Left, 5);
        reevaluate(&mut state);
        assert_eq!(bounces(&mut state), vec![BalanceState::LeftHeavy]);
    }

    #[test]
    fn test_bounce_debounced_within_settle_window() {
        let mut state = live_state(exercise(Level::Equation));
        place(&mut state, PanSide::Left, 5);
        reevaluate(&mut state);
        assert_eq!(bounces(&mut state).len(), 1);

        // Tilt flips immediately again: state updates, bounce suppressed
        place(&mut state, PanSide::Right, 20);
        reevaluate(&mut state);
        assert_eq!(state.balance, BalanceState::RightHeavy);
        assert!(bounces(&mut state).is_empty());

        // After the settle window a new change bounces again
        state.wheel.advance(consts::TILT_SETTLE);
        place(&mut state, PanSide::Left, 40);
        reevaluate(&mut state);
        assert_eq!(bounces(&mut state), vec![BalanceState::LeftHeavy]);
    }

    #[test]
    fn test_marks_do_not_affect_totals() {
        let mut target = exercise(Level::Decompose);
        target.digit_count = 2;
        target.left_operand = 35;
        target.expected_digits = vec![3, 5];
        let mut state = live_state(target);
        state.slots = state.exercise.as_ref().unwrap().fresh_slots();
        state.slot_mut(1).unwrap().placed = Some(3);
        state.slot_mut(0).unwrap().placed = Some(5);

        let before = pan_totals(&state);
        for slot in &mut state.slots {
            slot.mark = SlotMark::Incorrect;
        }
        assert_eq!(pan_totals(&state), before);
    }
}
