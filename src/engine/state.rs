//! Engine state and core exercise types
//!
//! All state that must be persisted for snapshot/restore lives here.

use std::cmp::Ordering;
use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::timer::{TimerId, TimerWheel};
use crate::config::ScaleConfig;

/// Current phase of the engine lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EnginePhase {
    /// No exercise installed yet
    #[default]
    Idle,
    /// A new exercise is being generated
    Generating,
    /// Exercise live, accepting learner input
    AwaitingInput,
    /// A validation pass is running
    Validating,
    /// Success reveal in progress; learner input is ignored
    Revealing,
}

/// Exercise level as selected by the hosting page (1-4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    /// Split a number into place values, or rebuild it from tokens
    Decompose,
    /// Compare two operand magnitudes with <, = or >
    Compare,
    /// Find the absolute difference between two operands
    Difference,
    /// Balance two free sums
    Equation,
}

impl Level {
    /// Map the host's numeric level
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            1 => Some(Level::Decompose),
            2 => Some(Level::Compare),
            3 => Some(Level::Difference),
            4 => Some(Level::Equation),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Level::Decompose => 1,
            Level::Compare => 2,
            Level::Difference => 3,
            Level::Equation => 4,
        }
    }
}

/// How a single-digit decomposition operand is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Presentation {
    /// A rod token sits on the pan; the learner types the numeral
    #[default]
    Rod,
    /// A bare numeral is shown; the learner rebuilds the value from tokens
    Numeral,
}

/// One side of the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanSide {
    Left,
    Right,
}

impl PanSide {
    pub fn opposite(self) -> Self {
        match self {
            PanSide::Left => PanSide::Right,
            PanSide::Right => PanSide::Left,
        }
    }
}

/// Which way the beam tips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BalanceState {
    #[default]
    Balanced,
    LeftHeavy,
    RightHeavy,
}

/// Comparison symbol the learner can choose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Less,
    Equal,
    Greater,
}

impl Relation {
    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::Less => "<",
            Relation::Equal => "=",
            Relation::Greater => ">",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "<" => Some(Relation::Less),
            "=" => Some(Relation::Equal),
            ">" => Some(Relation::Greater),
            _ => None,
        }
    }

    /// True relation between two operand magnitudes
    pub fn between(left: u32, right: u32) -> Self {
        match left.cmp(&right) {
            Ordering::Less => Relation::Less,
            Ordering::Equal => Relation::Equal,
            Ordering::Greater => Relation::Greater,
        }
    }

    /// Tilt this symbol asserts: "left < right" means the right pan hangs low
    pub fn implied_tilt(self) -> BalanceState {
        match self {
            Relation::Less => BalanceState::RightHeavy,
            Relation::Equal => BalanceState::Balanced,
            Relation::Greater => BalanceState::LeftHeavy,
        }
    }
}

/// What kind of token a placement came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TokenKind {
    #[default]
    FreeToken,
    Rod,
}

impl TokenKind {
    /// Map the wire `type` string of a generic token
    pub fn from_wire(kind: &str) -> Self {
        match kind {
            "rod" | "rigleta" => TokenKind::Rod,
            _ => TokenKind::FreeToken,
        }
    }
}

/// A token the learner dropped on a pan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementItem {
    pub id: u32,
    pub value: u32,
    /// Which pan it sits on
    pub origin: PanSide,
    pub kind: TokenKind,
}

/// Correctness mark on one place-value slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlotMark {
    /// Not validated since the last change
    #[default]
    Unknown,
    Correct,
    Incorrect,
}

/// One decimal digit position of the decomposition target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceValueSlot {
    /// Decimal position, 0 = units
    pub position: u8,
    /// The digit that belongs here
    pub expected_digit: u8,
    /// Digit the learner placed, if any
    pub placed: Option<u8>,
    /// Reset to Unknown whenever the slot changes
    pub mark: SlotMark,
}

/// Typed or selected answer state not expressed as pan placements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerBuffer {
    /// Free-text numeric entry (single-digit decomposition, equation)
    Text(String),
    /// Chosen comparison symbol
    Relation(Option<Relation>),
    /// Fixed-length digit boxes with one active box (difference level)
    DigitBoxes {
        boxes: Vec<Option<u8>>,
        cursor: usize,
    },
}

impl AnswerBuffer {
    /// Empty the buffer in place, keeping its shape
    pub fn clear(&mut self) {
        match self {
            AnswerBuffer::Text(text) => text.clear(),
            AnswerBuffer::Relation(chosen) => *chosen = None,
            AnswerBuffer::DigitBoxes { boxes, cursor } => {
                for digit in boxes.iter_mut() {
                    *digit = None;
                }
                *cursor = 0;
            }
        }
    }

    /// Free text parsed as a non-negative integer; 0 when empty or non-numeric
    pub fn text_value(&self) -> u64 {
        match self {
            AnswerBuffer::Text(text) => text.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Digit boxes composed into a number; None while any box is empty
    pub fn composed_digits(&self) -> Option<u64> {
        let AnswerBuffer::DigitBoxes { boxes, .. } = self else {
            return None;
        };
        let mut value = 0u64;
        for digit in boxes {
            value = value * 10 + (*digit)? as u64;
        }
        Some(value)
    }
}

/// Phase of the success reveal chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RevealPhase {
    /// No reveal running
    #[default]
    Idle,
    /// Correct answer highlighted on the scale
    Highlighting,
    /// Worked equation displayed
    Equation,
    /// Difference proof displayed (difference level only)
    Proof,
    /// Visible countdown to the next round
    Counting,
}

/// Transient reveal state, torn down with its round
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealState {
    pub phase: RevealPhase,
    /// Ticking countdown value while `Counting`
    pub countdown: Option<u8>,
    /// Handle for the next step, if one is armed
    pub pending: Option<TimerId>,
}

/// User-visible feedback kinds; the host renders the actual indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    /// Correct answer
    Success,
    /// Wrong answer, exercise stays live
    TryAgain,
    /// Validation refused: every place-value slot must be filled first
    FillAllSlots,
}

/// Outbound notification for the hosting page, drained after each call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Pan totals after a recomputation
    BalanceChanged { left: u64, right: u64 },
    /// Tilt changed; bounce the beam (debounced)
    Bounce(BalanceState),
    /// Show transient feedback
    Feedback(Feedback),
    /// The configured digit count changed
    DigitsChanged(u8),
    /// The virtual keyboard should be shown or hidden
    ShowKeyboard(bool),
    /// An injected key token was processed
    KeyConsumed,
    /// A new exercise was installed
    RoundStarted { round: u32 },
}

/// Immutable parameters of one exercise round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub level: Level,
    /// Digit count the round was generated with
    pub digit_count: u8,
    /// Operand upper bound the round was generated with
    pub concentration: u32,
    pub left_operand: u32,
    pub right_operand: u32,
    /// Display style for single-digit decomposition; no effect elsewhere
    pub presentation: Presentation,
    /// Which pan shows the decomposition operand
    pub operand_side: PanSide,
    /// Decimal digits of the target, most significant first
    /// (multi-digit decomposition only)
    pub expected_digits: Vec<u8>,
    /// Shuffled answer options (difference level only, 3 entries)
    pub options: Vec<u32>,
}

impl Exercise {
    /// Decomposition target (the drawn operand)
    pub fn target(&self) -> u32 {
        self.left_operand
    }

    /// Absolute difference of the operands
    pub fn difference(&self) -> u32 {
        self.left_operand.abs_diff(self.right_operand)
    }

    /// True relation between the operands
    pub fn relation(&self) -> Relation {
        Relation::between(self.left_operand, self.right_operand)
    }

    /// Empty learner slots for the decomposition target, one per digit
    pub fn fresh_slots(&self) -> Vec<PlaceValueSlot> {
        self.expected_digits
            .iter()
            .enumerate()
            .map(|(index, &digit)| PlaceValueSlot {
                position: self.digit_count - 1 - index as u8,
                expected_digit: digit,
                placed: None,
                mark: SlotMark::Unknown,
            })
            .collect()
    }
}

/// Complete engine state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleState {
    /// Run seed; each round derives its own RNG stream from this
    pub seed: u64,
    /// Active configuration
    pub config: ScaleConfig,
    /// Lifecycle phase
    pub phase: EnginePhase,
    /// Round counter, incremented on every installation
    pub round_index: u32,
    /// Parameters of the live round (None until the first configure)
    pub exercise: Option<Exercise>,
    /// Tokens on the pans
    pub placements: Vec<PlacementItem>,
    /// Place-value slots (multi-digit decomposition only)
    pub slots: Vec<PlaceValueSlot>,
    /// Typed or selected answer
    pub answer: AnswerBuffer,
    /// Difference option dropped on the answer area, until cleared
    pub chosen_option: Option<u32>,
    /// Current tilt
    pub balance: BalanceState,
    /// Success reveal state
    pub reveal: RevealState,
    /// Pending timers for the live round
    pub wheel: TimerWheel,
    /// Armed slot-mark reset, if a failed validation left marks up
    pub(crate) mark_reset: Option<TimerId>,
    /// Armed wrong-answer clear (difference level)
    pub(crate) wrong_clear: Option<TimerId>,
    /// Open tilt bounce debounce window
    pub(crate) tilt_settle: Option<TimerId>,
    /// Next placement ID
    next_id: u32,
    /// Outbound signals, drained by the host
    #[serde(skip)]
    pub signals: VecDeque<Signal>,
}

impl ScaleState {
    /// Create an engine with the given run seed; nothing is live until the
    /// first configure call
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: ScaleConfig::default(),
            phase: EnginePhase::Idle,
            round_index: 0,
            exercise: None,
            placements: Vec::new(),
            slots: Vec::new(),
            answer: AnswerBuffer::Text(String::new()),
            chosen_option: None,
            balance: BalanceState::Balanced,
            reveal: RevealState::default(),
            wheel: TimerWheel::new(),
            mark_reset: None,
            wrong_clear: None,
            tilt_settle: None,
            next_id: 1,
            signals: VecDeque::new(),
        }
    }

    /// Allocate a new placement ID
    pub fn next_placement_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Queue an outbound signal
    pub fn emit(&mut self, signal: Signal) {
        self.signals.push_back(signal);
    }

    /// Drain queued signals (host side)
    pub fn drain_signals(&mut self) -> Vec<Signal> {
        self.signals.drain(..).collect()
    }

    /// Sum of token values on one pan
    pub fn pan_sum(&self, side: PanSide) -> u64 {
        self.placements
            .iter()
            .filter(|item| item.origin == side)
            .map(|item| item.value as u64)
            .sum()
    }

    /// Look up a slot by decimal position
    pub fn slot_mut(&mut self, position: u8) -> Option<&mut PlaceValueSlot> {
        self.slots.iter_mut().find(|slot| slot.position == position)
    }

    /// Cross-field sanity check for a restored snapshot. Serde only
    /// guarantees the shape, not the relations between fields: the
    /// cursor has to sit inside the digit boxes, and slot positions
    /// have to stay within the supported decimal range.
    pub fn snapshot_coherent(&self) -> bool {
        if self.config.validate().is_err() {
            return false;
        }
        if let AnswerBuffer::DigitBoxes { boxes, cursor } = &self.answer {
            // Box count is the decimal width of a u32 difference
            if boxes.is_empty() || boxes.len() > 10 || *cursor >= boxes.len() {
                return false;
            }
            if boxes.iter().flatten().any(|digit| *digit > 9) {
                return false;
            }
        }
        self.slots.len() <= 9
            && self.slots.iter().all(|slot| {
                (slot.position as usize) < self.slots.len()
                    && slot.expected_digit <= 9
                    && slot.placed.unwrap_or(0) <= 9
            })
    }
}
