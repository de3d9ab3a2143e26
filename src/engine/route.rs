//! Event routing and round lifecycle
//!
//! The engine has exactly two entry points: discrete learner/host events
//! go through `handle_event`, and elapsed time arrives through `advance`.
//! Everything else (validation, reveal steps, timer effects) happens
//! inside those two calls, synchronously, before they return.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::input::{DropMessage, DropTarget, InputEvent, KeyToken};
use super::state::{
    AnswerBuffer, BalanceState, EnginePhase, Exercise, Level, PanSide, PlacementItem, Presentation,
    Relation, RevealState, ScaleState, Signal, SlotMark, TokenKind,
};
use super::timer::TimerAction;
use super::{evaluate, exercise, reveal, validate};
use crate::config::{ConfigError, ScaleConfig};
use crate::decimal_width;

/// Apply a new configuration; tears down any live round and installs a
/// freshly generated exercise
pub fn configure(state: &mut ScaleState, config: ScaleConfig) -> Result<(), ConfigError> {
    config.validate()?;
    if config.digits != state.config.digits {
        state.emit(Signal::DigitsChanged(config.digits));
    }
    state.config = config;
    begin_round(state);
    Ok(())
}

/// Route one discrete event into the engine
pub fn handle_event(state: &mut ScaleState, event: InputEvent) {
    match event {
        InputEvent::Drop { target, payload } => {
            // Malformed payloads die here, before they can touch state
            let Some(message) = payload.decode() else {
                return;
            };
            handle_drop(state, target, message);
        }
        InputEvent::Key(token) => handle_key(state, token),
        InputEvent::ClickItem { id } => remove_item(state, id),
        InputEvent::ChooseRelation(relation) => choose_relation(state, relation),
        InputEvent::Reset => reset(state),
    }
}

/// Re-inject an externally sourced key token as if typed; acknowledged
/// whether or not it was usable
pub fn inject_key(state: &mut ScaleState, token: &str) {
    match KeyToken::parse(token) {
        Some(token) => handle_key(state, token),
        None => log::debug!("discarding unknown key token {token:?}"),
    }
    state.emit(Signal::KeyConsumed);
}

/// Explicit user reset: same teardown as a configuration change
pub fn reset(state: &mut ScaleState) {
    if state.exercise.is_some() {
        begin_round(state);
    }
}

/// Deliver elapsed time; fires due timers in deadline order
pub fn advance(state: &mut ScaleState, dt: f32) {
    let round = state.round_index;
    for action in state.wheel.advance(dt) {
        apply_timer(state, action);
        if state.round_index != round {
            // The round was replaced mid-batch; anything still queued
            // belonged to the torn-down round
            break;
        }
    }
}

/// Generate the next exercise from the config and install it
fn begin_round(state: &mut ScaleState) {
    let Some(level) = Level::from_index(state.config.level) else {
        log::warn!("config level {} out of range", state.config.level);
        return;
    };
    state.phase = EnginePhase::Generating;
    state.round_index = state.round_index.wrapping_add(1);

    // Deterministic per-round stream derived from round number and run seed
    let round_seed = (state.round_index as u64)
        .wrapping_mul(2654435761)
        .wrapping_add(state.seed);
    let mut rng = Pcg32::seed_from_u64(round_seed);
    let next =
        exercise::generate(&mut rng, level, state.config.digits, state.config.concentration);
    install(state, next);
}

/// Tear down whatever round is live and install `next` in its place
pub(crate) fn install(state: &mut ScaleState, next: Exercise) {
    // Teardown first: no timer may survive its round
    state.wheel.cancel_all();
    state.reveal = RevealState::default();
    state.mark_reset = None;
    state.wrong_clear = None;
    state.tilt_settle = None;
    state.placements.clear();
    state.chosen_option = None;
    state.balance = BalanceState::Balanced;

    state.slots = next.fresh_slots();
    state.answer = initial_answer(&next);
    let typed = has_typed_input(&next);

    log::info!(
        "round {} installed: level {}, operands {}/{}, digits {}",
        state.round_index,
        next.level.index(),
        next.left_operand,
        next.right_operand,
        next.digit_count
    );

    state.exercise = Some(next);
    state.phase = EnginePhase::AwaitingInput;
    state.emit(Signal::RoundStarted {
        round: state.round_index,
    });
    state.emit(Signal::ShowKeyboard(typed));
    evaluate::reevaluate(state);
}

/// The empty answer shape for a round
fn initial_answer(exercise: &Exercise) -> AnswerBuffer {
    match exercise.level {
        Level::Compare => AnswerBuffer::Relation(None),
        Level::Difference => {
            let width = decimal_width(exercise.difference() as u64) as usize;
            AnswerBuffer::DigitBoxes {
                boxes: vec![None; width],
                cursor: 0,
            }
        }
        _ => AnswerBuffer::Text(String::new()),
    }
}

/// Whether the round takes typed input (drives the virtual keyboard)
fn has_typed_input(exercise: &Exercise) -> bool {
    match exercise.level {
        Level::Decompose => {
            exercise.digit_count == 1 && exercise.presentation == Presentation::Rod
        }
        Level::Difference | Level::Equation => true,
        Level::Compare => false,
    }
}

fn handle_drop(state: &mut ScaleState, target: DropTarget, message: DropMessage) {
    if state.phase != EnginePhase::AwaitingInput {
        log::debug!("discarding drop in phase {:?}", state.phase);
        return;
    }
    let Some(exercise) = state.exercise.clone() else {
        return;
    };

    match message {
        DropMessage::DistractorChoice { value } => {
            // Difference options land on the answer area and validate
            // immediately; anything else is a stray drag
            if exercise.level == Level::Difference
                && target == DropTarget::Answer
                && exercise.options.contains(&value)
            {
                validate::validate_choice(state, value);
            } else {
                log::debug!("discarding difference option {value} on {target:?}");
            }
        }
        DropMessage::Rod { value } => {
            route_value_drop(state, &exercise, target, value, TokenKind::Rod)
        }
        DropMessage::Generic {
            value,
            kind,
            position,
            ..
        } => {
            if let Some(position) = position {
                log::debug!("token came off slot {position}");
            }
            route_value_drop(
                state,
                &exercise,
                target,
                value,
                TokenKind::from_wire(&kind),
            );
        }
    }
}

/// Put a plain value token where it was dropped
fn route_value_drop(
    state: &mut ScaleState,
    exercise: &Exercise,
    target: DropTarget,
    value: u32,
    kind: TokenKind,
) {
    let uses_slots = exercise.level == Level::Decompose && exercise.digit_count >= 2;
    match target {
        DropTarget::Slot(position) if uses_slots => {
            // Slots take single digits only
            if value > 9 {
                log::debug!("discarding value {value} dropped on slot {position}");
                return;
            }
            let Some(slot) = state.slot_mut(position) else {
                log::debug!("discarding drop on unknown slot {position}");
                return;
            };
            slot.placed = Some(value as u8);
            slot.mark = SlotMark::Unknown;
            evaluate::reevaluate(state);
        }
        DropTarget::LeftPan | DropTarget::RightPan if !uses_slots => {
            let side = if target == DropTarget::LeftPan {
                PanSide::Left
            } else {
                PanSide::Right
            };
            let id = state.next_placement_id();
            state.placements.push(PlacementItem {
                id,
                value,
                origin: side,
                kind,
            });
            evaluate::reevaluate(state);
        }
        _ => log::debug!("discarding value {value} dropped on {target:?}"),
    }
}

/// Click on a placed token removes it
fn remove_item(state: &mut ScaleState, id: u32) {
    if state.phase != EnginePhase::AwaitingInput {
        return;
    }
    let before = state.placements.len();
    state.placements.retain(|item| item.id != id);
    if state.placements.len() != before {
        evaluate::reevaluate(state);
    }
}

/// Comparison symbol button; also forces the tilt the symbol asserts
fn choose_relation(state: &mut ScaleState, relation: Relation) {
    if state.phase != EnginePhase::AwaitingInput {
        return;
    }
    let compare = state
        .exercise
        .as_ref()
        .is_some_and(|exercise| exercise.level == Level::Compare);
    if !compare {
        log::debug!("discarding symbol {} outside comparison", relation.symbol());
        return;
    }
    state.answer = AnswerBuffer::Relation(Some(relation));
    evaluate::reevaluate(state);
}

fn handle_key(state: &mut ScaleState, token: KeyToken) {
    if state.phase != EnginePhase::AwaitingInput {
        return;
    }
    let Some(level) = state.exercise.as_ref().map(|exercise| exercise.level) else {
        return;
    };

    if token == KeyToken::Validate {
        validate::validate(state);
        return;
    }

    if level == Level::Difference {
        digit_box_key(state, token);
    } else {
        text_key(state, token);
    }
}

/// Difference level: fixed digit boxes with a single active-box cursor
fn digit_box_key(state: &mut ScaleState, token: KeyToken) {
    let AnswerBuffer::DigitBoxes { boxes, cursor } = &mut state.answer else {
        return;
    };
    match token {
        KeyToken::Digit(digit) => {
            boxes[*cursor] = Some(digit);
            if *cursor + 1 < boxes.len() {
                *cursor += 1;
            }
        }
        KeyToken::Backspace => {
            // Two-step: clear the active box first, then step back
            if boxes[*cursor].is_some() {
                boxes[*cursor] = None;
            } else if *cursor > 0 {
                *cursor -= 1;
                boxes[*cursor] = None;
            }
        }
        // Operators have no meaning in the digit boxes
        KeyToken::Plus | KeyToken::Minus | KeyToken::Validate => return,
    }
    evaluate::reevaluate(state);
}

/// Free-text entry for the numeral and equation answers
fn text_key(state: &mut ScaleState, token: KeyToken) {
    let AnswerBuffer::Text(text) = &mut state.answer else {
        // The comparison level has no text entry
        return;
    };
    match token {
        KeyToken::Digit(digit) => text.push(char::from(b'0' + digit)),
        KeyToken::Plus => text.push('+'),
        KeyToken::Minus => text.push('-'),
        KeyToken::Backspace => {
            text.pop();
        }
        KeyToken::Validate => return,
    }
    evaluate::reevaluate(state);
}

fn apply_timer(state: &mut ScaleState, action: TimerAction) {
    match action {
        TimerAction::EnterReveal(phase) => reveal::enter_phase(state, phase),
        TimerAction::CountdownTick => {
            if reveal::countdown_tick(state) {
                begin_round(state);
            }
        }
        TimerAction::FinishSuccessHold => begin_round(state),
        TimerAction::ClearSlotMarks => {
            state.mark_reset = None;
            for slot in &mut state.slots {
                slot.mark = SlotMark::Unknown;
            }
        }
        TimerAction::ClearWrongAnswer => {
            state.wrong_clear = None;
            state.chosen_option = None;
            state.answer.clear();
            evaluate::reevaluate(state);
        }
        TimerAction::TiltSettle => {
            state.tilt_settle = None;
        }
    }
}
