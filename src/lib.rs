//! Pan Balance - a balance-scale arithmetic exercise engine
//!
//! Core modules:
//! - `engine`: Deterministic exercise engine (generation, placements, balance, validation, reveal)
//! - `config`: Host-facing configuration
//! - `web`: Browser bindings for the hosting page (wasm32 only)

pub mod config;
pub mod engine;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use config::{ConfigError, ScaleConfig};

/// Engine timing constants
pub mod consts {
    /// Reveal: delay from highlighting to the equation display (seconds)
    pub const EQUATION_DELAY: f32 = 0.5;
    /// Reveal: delay from the equation to the proof display (seconds)
    pub const PROOF_DELAY: f32 = 1.5;
    /// Reveal: delay from the last display phase into counting (seconds)
    pub const COUNTING_DELAY: f32 = 1.5;

    /// Countdown tick interval (seconds)
    pub const COUNTDOWN_TICK: f32 = 1.0;
    /// Countdown start value for decomposition rounds
    pub const COUNTDOWN_FROM_DECOMPOSE: u8 = 5;
    /// Countdown start value for difference rounds
    pub const COUNTDOWN_FROM_DIFFERENCE: u8 = 7;

    /// How long wrong place-value marks stay visible (seconds)
    pub const SLOT_MARK_RESET: f32 = 2.0;
    /// How long a wrong difference answer stays visible (seconds)
    pub const WRONG_ANSWER_CLEAR: f32 = 1.5;
    /// Success indicator duration on the single-step levels (seconds)
    pub const SIMPLE_SUCCESS_HOLD: f32 = 2.5;
    /// Tilt bounce debounce window (seconds)
    pub const TILT_SETTLE: f32 = 0.3;
}

/// 10^power as a u64, for place-value weights
#[inline]
pub fn pow10(power: u32) -> u64 {
    10u64.pow(power)
}

/// Number of decimal digits in `n` (1 for zero)
#[inline]
pub fn decimal_width(mut n: u64) -> u8 {
    let mut width = 1;
    while n >= 10 {
        n /= 10;
        width += 1;
    }
    width
}

/// Decimal digits of `n`, most significant first, left-padded with zeros to `width`
pub fn digits_of(n: u64, width: u8) -> Vec<u8> {
    let mut digits = vec![0u8; width as usize];
    let mut rest = n;
    for slot in digits.iter_mut().rev() {
        *slot = (rest % 10) as u8;
        rest /= 10;
    }
    digits
}
