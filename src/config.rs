//! Host-facing configuration
//!
//! The hosting page hands the engine one of these (usually parsed from
//! JSON attributes). Validation happens once at the boundary; the engine
//! itself assumes a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected host configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("level must be 1-4, got {0}")]
    Level(u8),
    #[error("digits must be 1-9, got {0}")]
    Digits(u8),
    #[error("concentration must be at least {min}, got {got}")]
    Concentration { min: u32, got: u32 },
}

/// Inbound configuration from the hosting page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Display flavor, echoed back to the renderer; no effect on the engine
    pub variant: String,
    /// Exercise level (1 decomposition, 2 comparison, 3 difference, 4 equation)
    pub level: u8,
    /// Digit count for decomposition exercises (1-9)
    pub digits: u8,
    /// Upper bound for randomly drawn operands
    pub concentration: u32,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            variant: "rods".to_string(),
            level: 1,
            digits: 1,
            concentration: 10,
        }
    }
}

impl ScaleConfig {
    /// Check the host kept its side of the contract
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=4).contains(&self.level) {
            return Err(ConfigError::Level(self.level));
        }
        if !(1..=9).contains(&self.digits) {
            return Err(ConfigError::Digits(self.digits));
        }
        // The difference level redraws operands until they differ, which
        // needs at least two possible values
        let min = if self.level == 3 { 2 } else { 1 };
        if self.concentration < min {
            return Err(ConfigError::Concentration {
                min,
                got: self.concentration,
            });
        }
        Ok(())
    }
}
