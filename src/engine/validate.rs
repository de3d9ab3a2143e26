//! Per-level answer validation
//!
//! Entered on an explicit validate token (decomposition, comparison,
//! equation) or directly from a difference-option drop. Failure never
//! ends the round: feedback is emitted, the offending part of the answer
//! is cleared, and the exercise stays live.

use super::state::{
    AnswerBuffer, EnginePhase, Exercise, Feedback, Level, Presentation, ScaleState, Signal,
    SlotMark,
};
use super::timer::TimerAction;
use super::{evaluate, reveal};
use crate::consts;

/// Run the validation pass for the live round
pub fn validate(state: &mut ScaleState) {
    if state.phase != EnginePhase::AwaitingInput {
        return;
    }
    let Some(exercise) = state.exercise.clone() else {
        return;
    };
    state.phase = EnginePhase::Validating;

    match exercise.level {
        Level::Decompose if exercise.digit_count >= 2 => validate_slots(state, &exercise),
        Level::Decompose => validate_single(state, &exercise),
        Level::Compare => validate_relation(state, &exercise),
        Level::Difference => validate_typed_difference(state, &exercise),
        Level::Equation => validate_equality(state),
    }

    // Anything short of a success reveal hands control back to the learner
    if state.phase == EnginePhase::Validating {
        state.phase = EnginePhase::AwaitingInput;
    }
}

/// Difference level, drop path: a dropped option validates immediately
pub fn validate_choice(state: &mut ScaleState, value: u32) {
    if state.phase != EnginePhase::AwaitingInput {
        return;
    }
    let Some(exercise) = state.exercise.clone() else {
        return;
    };
    if exercise.level != Level::Difference {
        return;
    }
    state.phase = EnginePhase::Validating;
    state.chosen_option = Some(value);
    evaluate::reevaluate(state);
    judge_difference(state, &exercise, value as u64);

    if state.phase == EnginePhase::Validating {
        state.phase = EnginePhase::AwaitingInput;
    }
}

/// Multi-digit decomposition: mark every slot, succeed when all match
fn validate_slots(state: &mut ScaleState, exercise: &Exercise) {
    if state.slots.iter().any(|slot| slot.placed.is_none()) {
        state.emit(Signal::Feedback(Feedback::FillAllSlots));
        return;
    }

    // A still-pending mark reset would wipe the marks set below
    if let Some(id) = state.mark_reset.take() {
        state.wheel.cancel(id);
    }

    let mut all_correct = true;
    for slot in &mut state.slots {
        let correct = slot.placed == Some(slot.expected_digit);
        slot.mark = if correct {
            SlotMark::Correct
        } else {
            SlotMark::Incorrect
        };
        all_correct &= correct;
    }

    if all_correct {
        log::info!(
            "round {}: decomposition of {} solved",
            state.round_index,
            exercise.target()
        );
        reveal::begin_chain(state);
    } else {
        state.emit(Signal::Feedback(Feedback::TryAgain));
        state.mark_reset = Some(
            state
                .wheel
                .arm(consts::SLOT_MARK_RESET, TimerAction::ClearSlotMarks),
        );
    }
}

/// Single-digit decomposition: the answer path depends on how the
/// operand is presented
fn validate_single(state: &mut ScaleState, exercise: &Exercise) {
    let target = exercise.target() as u64;
    let correct = match exercise.presentation {
        // Rod on the pan: the learner types the numeral
        Presentation::Rod => state.answer.text_value() == target,
        // Bare numeral: the learner rebuilds the value from tokens on
        // the opposite pan
        Presentation::Numeral => state.pan_sum(exercise.operand_side.opposite()) == target,
    };

    if correct {
        log::info!("round {}: {} named", state.round_index, exercise.target());
        reveal::begin_success_hold(state);
    } else {
        state.answer.clear();
        state.emit(Signal::Feedback(Feedback::TryAgain));
        evaluate::reevaluate(state);
    }
}

/// Comparison: the chosen symbol must match the true relation
fn validate_relation(state: &mut ScaleState, exercise: &Exercise) {
    let chosen = match &state.answer {
        AnswerBuffer::Relation(Some(relation)) => *relation,
        _ => {
            state.emit(Signal::Feedback(Feedback::TryAgain));
            return;
        }
    };

    if chosen == exercise.relation() {
        log::info!(
            "round {}: {} {} {} confirmed",
            state.round_index,
            exercise.left_operand,
            chosen.symbol(),
            exercise.right_operand
        );
        reveal::begin_success_hold(state);
    } else {
        // Wrong symbol comes off immediately; the tilt falls back to the
        // derived totals
        state.answer.clear();
        state.emit(Signal::Feedback(Feedback::TryAgain));
        evaluate::reevaluate(state);
    }
}

/// Difference level, typed path: the digit boxes must compose the answer
fn validate_typed_difference(state: &mut ScaleState, exercise: &Exercise) {
    let Some(composed) = state.answer.composed_digits() else {
        state.emit(Signal::Feedback(Feedback::TryAgain));
        return;
    };
    judge_difference(state, exercise, composed);
}

fn judge_difference(state: &mut ScaleState, exercise: &Exercise, value: u64) {
    // Either outcome supersedes a pending wrong-answer clear
    if let Some(id) = state.wrong_clear.take() {
        state.wheel.cancel(id);
    }

    if value == exercise.difference() as u64 {
        log::info!(
            "round {}: difference {} found",
            state.round_index,
            exercise.difference()
        );
        reveal::begin_chain(state);
    } else {
        // Leave the wrong value visible briefly, then clear it
        state.emit(Signal::Feedback(Feedback::TryAgain));
        state.wrong_clear = Some(
            state
                .wheel
                .arm(consts::WRONG_ANSWER_CLEAR, TimerAction::ClearWrongAnswer),
        );
    }
}

/// Equation: plain pan-sum equality
fn validate_equality(state: &mut ScaleState) {
    // TODO: term-by-term checking once the equation variant gets its own
    // generator
    let totals = evaluate::pan_totals(state);
    if totals.left == totals.right {
        log::info!("round {}: pans balanced at {}", state.round_index, totals.left);
        reveal::begin_success_hold(state);
    } else {
        state.emit(Signal::Feedback(Feedback::TryAgain));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{
        BalanceState, PanSide, PlacementItem, Relation, RevealPhase, TokenKind,
    };

    fn live_state(exercise: Exercise) -> ScaleState {
        let mut state = ScaleState::new(11);
        state.slots = exercise.fresh_slots();
        state.answer = match exercise.level {
            Level::Compare => AnswerBuffer::Relation(None),
            Level::Difference => AnswerBuffer::DigitBoxes {
                boxes: vec![None],
                cursor: 0,
            },
            _ => AnswerBuffer::Text(String::new()),
        };
        state.exercise = Some(exercise);
        state.phase = EnginePhase::AwaitingInput;
        state
    }

    fn decompose_multi(target: u32, digits: u8) -> ScaleState {
        live_state(Exercise {
            level: Level::Decompose,
            digit_count: digits,
            concentration: 10,
            left_operand: target,
            right_operand: 0,
            presentation: Presentation::Rod,
            operand_side: PanSide::Left,
            expected_digits: crate::digits_of(target as u64, digits),
            options: Vec::new(),
        })
    }

    fn decompose_single(target: u32, presentation: Presentation) -> ScaleState {
        live_state(Exercise {
            level: Level::Decompose,
            digit_count: 1,
            concentration: 10,
            left_operand: target,
            right_operand: 0,
            presentation,
            operand_side: PanSide::Left,
            expected_digits: Vec::new(),
            options: Vec::new(),
        })
    }

    fn compare(left: u32, right: u32) -> ScaleState {
        live_state(Exercise {
            level: Level::Compare,
            digit_count: 1,
            concentration: 10,
            left_operand: left,
            right_operand: right,
            presentation: Presentation::Rod,
            operand_side: PanSide::Left,
            expected_digits: Vec::new(),
            options: Vec::new(),
        })
    }

    fn difference(left: u32, right: u32) -> ScaleState {
        let d = left.abs_diff(right);
        live_state(Exercise {
            level: Level::Difference,
            digit_count: 1,
            concentration: 10,
            left_operand: left,
            right_operand: right,
            presentation: Presentation::Rod,
            operand_side: PanSide::Left,
            expected_digits: Vec::new(),
            options: vec![d, d.saturating_sub(1), d + 1],
        })
    }

    fn feedbacks(state: &mut ScaleState) -> Vec<Feedback> {
        state
            .drain_signals()
            .into_iter()
            .filter_map(|signal| match signal {
                Signal::Feedback(feedback) => Some(feedback),
                _ => None,
            })
            .collect()
    }

    fn fill_slot(state: &mut ScaleState, position: u8, digit: u8) {
        let slot = state.slot_mut(position).unwrap();
        slot.placed = Some(digit);
        slot.mark = SlotMark::Unknown;
    }

    #[test]
    fn test_slots_all_correct_enters_reveal() {
        let mut state = decompose_multi(407, 3);
        fill_slot(&mut state, 2, 4);
        fill_slot(&mut state, 1, 0);
        fill_slot(&mut state, 0, 7);

        validate(&mut state);

        assert_eq!(state.phase, EnginePhase::Revealing);
        assert_eq!(state.reveal.phase, RevealPhase::Highlighting);
        assert!(state.slots.iter().all(|slot| slot.mark == SlotMark::Correct));
        assert_eq!(state.balance, BalanceState::Balanced);
        assert!(feedbacks(&mut state).contains(&Feedback::Success));
    }

    #[test]
    fn test_unfilled_slot_blocks_validation() {
        let mut state = decompose_multi(407, 3);
        fill_slot(&mut state, 2, 4);
        fill_slot(&mut state, 0, 7);

        validate(&mut state);

        assert_eq!(state.phase, EnginePhase::AwaitingInput);
        assert_eq!(feedbacks(&mut state), vec![Feedback::FillAllSlots]);
        // No marks were touched
        assert!(state.slots.iter().all(|slot| slot.mark == SlotMark::Unknown));
        assert_eq!(state.wheel.pending(), 0);
    }

    #[test]
    fn test_partial_failure_marks_then_resets_after_delay() {
        let mut state = decompose_multi(407, 3);
        fill_slot(&mut state, 2, 4);
        fill_slot(&mut state, 1, 9);
        fill_slot(&mut state, 0, 7);

        validate(&mut state);

        assert_eq!(state.phase, EnginePhase::AwaitingInput);
        assert_eq!(feedbacks(&mut state), vec![Feedback::TryAgain]);
        assert_eq!(state.slot_mut(2).unwrap().mark, SlotMark::Correct);
        assert_eq!(state.slot_mut(1).unwrap().mark, SlotMark::Incorrect);
        assert_eq!(state.slot_mut(0).unwrap().mark, SlotMark::Correct);

        // Marks clear after the reset delay; placed values survive
        let due = state.wheel.advance(consts::SLOT_MARK_RESET);
        assert_eq!(due, vec![TimerAction::ClearSlotMarks]);
    }

    #[test]
    fn test_revalidation_cancels_stale_mark_reset() {
        let mut state = decompose_multi(35, 2);
        fill_slot(&mut state, 1, 3);
        fill_slot(&mut state, 0, 9);
        validate(&mut state);
        assert!(state.mark_reset.is_some());

        fill_slot(&mut state, 0, 5);
        validate(&mut state);

        // The old reset was cancelled; the reveal owns the wheel now
        assert_eq!(state.phase, EnginePhase::Revealing);
        assert!(state.mark_reset.is_none());
        assert!(!state.wheel.advance(10.0).contains(&TimerAction::ClearSlotMarks));
    }

    #[test]
    fn test_single_rod_checks_typed_answer() {
        let mut state = decompose_single(6, Presentation::Rod);
        state.answer = AnswerBuffer::Text("6".to_string());
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::Revealing);
    }

    #[test]
    fn test_single_rod_failure_clears_text_keeps_placements() {
        let mut state = decompose_single(6, Presentation::Rod);
        let id = state.next_placement_id();
        state.placements.push(PlacementItem {
            id,
            value: 3,
            origin: PanSide::Right,
            kind: TokenKind::FreeToken,
        });
        state.answer = AnswerBuffer::Text("7".to_string());

        validate(&mut state);

        assert_eq!(state.phase, EnginePhase::AwaitingInput);
        assert_eq!(state.answer, AnswerBuffer::Text(String::new()));
        assert_eq!(state.placements.len(), 1);
    }

    #[test]
    fn test_single_numeral_checks_opposite_pan_sum() {
        let mut state = decompose_single(9, Presentation::Numeral);
        for value in [4, 5] {
            let id = state.next_placement_id();
            state.placements.push(PlacementItem {
                id,
                value,
                origin: PanSide::Right,
                kind: TokenKind::FreeToken,
            });
        }
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::Revealing);
    }

    #[test]
    fn test_numeral_on_the_right_sums_the_left_pan() {
        let mut state = decompose_single(6, Presentation::Numeral);
        if let Some(exercise) = &mut state.exercise {
            exercise.operand_side = PanSide::Right;
        }

        // Tokens on the pan the numeral sits on do not count
        let id = state.next_placement_id();
        state.placements.push(PlacementItem {
            id,
            value: 6,
            origin: PanSide::Right,
            kind: TokenKind::FreeToken,
        });
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::AwaitingInput);

        state.placements.clear();
        let id = state.next_placement_id();
        state.placements.push(PlacementItem {
            id,
            value: 6,
            origin: PanSide::Left,
            kind: TokenKind::FreeToken,
        });
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::Revealing);
    }

    #[test]
    fn test_wrong_symbol_cleared_right_symbol_wins() {
        let mut state = compare(6, 9);

        state.answer = AnswerBuffer::Relation(Some(Relation::Greater));
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::AwaitingInput);
        assert_eq!(state.answer, AnswerBuffer::Relation(None));
        assert_eq!(feedbacks(&mut state), vec![Feedback::TryAgain]);

        state.answer = AnswerBuffer::Relation(Some(Relation::Less));
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::Revealing);
        assert!(feedbacks(&mut state).contains(&Feedback::Success));
    }

    #[test]
    fn test_validate_without_symbol_is_a_retry() {
        let mut state = compare(3, 3);
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::AwaitingInput);
        assert_eq!(feedbacks(&mut state), vec![Feedback::TryAgain]);
    }

    #[test]
    fn test_correct_difference_drop_reveals_immediately() {
        let mut state = difference(8, 3);
        validate_choice(&mut state, 5);
        assert_eq!(state.phase, EnginePhase::Revealing);
        assert_eq!(state.reveal.phase, RevealPhase::Highlighting);
        assert_eq!(state.chosen_option, Some(5));
    }

    #[test]
    fn test_wrong_difference_drop_arms_a_clear() {
        let mut state = difference(8, 3);
        validate_choice(&mut state, 4);

        assert_eq!(state.phase, EnginePhase::AwaitingInput);
        assert_eq!(state.chosen_option, Some(4));
        assert!(state.wrong_clear.is_some());
        assert_eq!(feedbacks(&mut state), vec![Feedback::TryAgain]);
    }

    #[test]
    fn test_correct_drop_supersedes_pending_clear() {
        let mut state = difference(8, 3);
        validate_choice(&mut state, 4);
        validate_choice(&mut state, 5);

        assert_eq!(state.phase, EnginePhase::Revealing);
        assert_eq!(state.chosen_option, Some(5));
        // The stale clear must not fire during the reveal
        assert!(!state
            .wheel
            .advance(consts::WRONG_ANSWER_CLEAR)
            .contains(&TimerAction::ClearWrongAnswer));
    }

    #[test]
    fn test_typed_difference_validates_on_token() {
        let mut state = difference(8, 3);
        state.answer = AnswerBuffer::DigitBoxes {
            boxes: vec![Some(5)],
            cursor: 0,
        };
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::Revealing);
    }

    #[test]
    fn test_incomplete_digit_boxes_are_a_retry() {
        let mut state = difference(13, 2);
        state.answer = AnswerBuffer::DigitBoxes {
            boxes: vec![Some(1), None],
            cursor: 1,
        };
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::AwaitingInput);
        assert_eq!(feedbacks(&mut state), vec![Feedback::TryAgain]);
    }

    #[test]
    fn test_equation_pan_equality() {
        let mut state = live_state(Exercise {
            level: Level::Equation,
            digit_count: 1,
            concentration: 10,
            left_operand: 7,
            right_operand: 4,
            presentation: Presentation::Rod,
            operand_side: PanSide::Left,
            expected_digits: Vec::new(),
            options: Vec::new(),
        });
        for (value, origin) in [(30, PanSide::Left), (4, PanSide::Left), (34, PanSide::Right)] {
            let id = state.next_placement_id();
            state.placements.push(PlacementItem {
                id,
                value,
                origin,
                kind: TokenKind::FreeToken,
            });
        }
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::Revealing);

        let mut state = live_state(Exercise {
            level: Level::Equation,
            digit_count: 1,
            concentration: 10,
            left_operand: 7,
            right_operand: 4,
            presentation: Presentation::Rod,
            operand_side: PanSide::Left,
            expected_digits: Vec::new(),
            options: Vec::new(),
        });
        let id = state.next_placement_id();
        state.placements.push(PlacementItem {
            id,
            value: 3,
            origin: PanSide::Left,
            kind: TokenKind::FreeToken,
        });
        validate(&mut state);
        assert_eq!(state.phase, EnginePhase::AwaitingInput);
    }
}
