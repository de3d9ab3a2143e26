//! Deterministic exercise engine
//!
//! All exercise logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (one derived stream per round)
//! - Time arrives through explicit `advance` calls; every delay is an
//!   owned, cancellable timer on the round's wheel
//! - Every placement or answer mutation re-derives the balance before
//!   returning
//! - No rendering or platform dependencies

pub mod evaluate;
pub mod exercise;
pub mod input;
pub mod reveal;
pub mod route;
pub mod state;
pub mod timer;
pub mod validate;

pub use evaluate::{PanTotals, classify, pan_totals, reevaluate};
pub use exercise::generate;
pub use input::{DropMessage, DropPayload, DropTarget, InputEvent, KeyToken};
pub use route::{advance, configure, handle_event, inject_key, reset};
pub use state::{
    AnswerBuffer, BalanceState, EnginePhase, Exercise, Feedback, Level, PanSide, PlaceValueSlot,
    PlacementItem, Presentation, Relation, RevealPhase, RevealState, ScaleState, Signal, SlotMark,
    TokenKind,
};
pub use timer::{TimerAction, TimerId, TimerWheel};
pub use validate::{validate, validate_choice};
