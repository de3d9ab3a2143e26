//! Exercise generation
//!
//! Each round draws its parameters from a per-round seeded RNG stream, so
//! the same seed and round index always produce the same exercise.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;

use super::state::{Exercise, Level, PanSide, Presentation};
use crate::digits_of;

/// Generate one exercise
pub fn generate(rng: &mut Pcg32, level: Level, digit_count: u8, concentration: u32) -> Exercise {
    match level {
        Level::Decompose => generate_decompose(rng, digit_count, concentration),
        Level::Compare => generate_compare(rng, digit_count, concentration),
        Level::Difference => generate_difference(rng, digit_count, concentration),
        Level::Equation => generate_equation(rng, digit_count, concentration),
    }
}

/// Single-digit: one operand drawn in [1, concentration], shown as a rod or
/// a bare numeral. Multi-digit: a target with exactly `digit_count` digits,
/// split into place values.
fn generate_decompose(rng: &mut Pcg32, digit_count: u8, concentration: u32) -> Exercise {
    if digit_count <= 1 {
        let target = rng.random_range(1..=concentration);
        let presentation = if rng.random_bool(0.5) {
            Presentation::Rod
        } else {
            Presentation::Numeral
        };
        return Exercise {
            level: Level::Decompose,
            digit_count: 1,
            concentration,
            left_operand: target,
            right_operand: 0,
            presentation,
            operand_side: PanSide::Left,
            expected_digits: Vec::new(),
            options: Vec::new(),
        };
    }

    // No leading zero: the target has exactly digit_count digits
    let low = 10u32.pow(digit_count as u32 - 1);
    let high = 10u32.pow(digit_count as u32) - 1;
    let target = rng.random_range(low..=high);
    Exercise {
        level: Level::Decompose,
        digit_count,
        concentration,
        left_operand: target,
        right_operand: 0,
        presentation: Presentation::default(),
        operand_side: PanSide::Left,
        expected_digits: digits_of(target as u64, digit_count),
        options: Vec::new(),
    }
}

/// Two operands in [1, concentration]; equal draws are allowed so the "="
/// answer stays reachable.
fn generate_compare(rng: &mut Pcg32, digit_count: u8, concentration: u32) -> Exercise {
    let left = rng.random_range(1..=concentration);
    let right = rng.random_range(1..=concentration);
    Exercise {
        level: Level::Compare,
        digit_count,
        concentration,
        left_operand: left,
        right_operand: right,
        presentation: Presentation::default(),
        operand_side: PanSide::Left,
        expected_digits: Vec::new(),
        options: Vec::new(),
    }
}

/// Two distinct operands plus three shuffled answer options around the
/// true difference.
fn generate_difference(rng: &mut Pcg32, digit_count: u8, concentration: u32) -> Exercise {
    let left = rng.random_range(1..=concentration);
    let mut right = rng.random_range(1..=concentration);
    // A zero difference has nothing to find; redraw until the operands differ
    while right == left {
        right = rng.random_range(1..=concentration);
    }

    let difference = left.abs_diff(right);
    // The true answer flanked by its neighbours, lower one clamped at zero
    let mut options = vec![difference, difference.saturating_sub(1), difference + 1];
    options.shuffle(rng);

    Exercise {
        level: Level::Difference,
        digit_count,
        concentration,
        left_operand: left,
        right_operand: right,
        presentation: Presentation::default(),
        operand_side: PanSide::Left,
        expected_digits: Vec::new(),
        options,
    }
}

fn generate_equation(rng: &mut Pcg32, digit_count: u8, concentration: u32) -> Exercise {
    let left = rng.random_range(1..=concentration);
    let right = rng.random_range(1..=concentration);
    Exercise {
        level: Level::Equation,
        digit_count,
        concentration,
        left_operand: left,
        right_operand: right,
        presentation: Presentation::default(),
        operand_side: PanSide::Left,
        expected_digits: Vec::new(),
        options: Vec::new(),
    }
}
