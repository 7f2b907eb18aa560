//! Dice: roll 0.00-99.99 and bet under or over a target

use crate::config::DiceConfig;
use crate::errors::{FairResult, FairnessError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Random values consumed per roll
pub const DICE_FLOATS: usize = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiceDirection {
    Under,
    Over,
}

impl fmt::Display for DiceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiceDirection::Under => write!(f, "under"),
            DiceDirection::Over => write!(f, "over"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiceParams {
    /// Threshold in percent, two decimals
    pub target: f64,
    pub direction: DiceDirection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiceResult {
    pub roll: f64,
    pub target: f64,
    pub direction: DiceDirection,
    /// Percent chance of this bet winning
    pub win_chance: f64,
    pub won: bool,
}

/// Convert a value with at most two decimals to hundredths
pub(crate) fn to_hundredths(value: f64, field: &str) -> FairResult<u64> {
    if !value.is_finite() || value < 0.0 {
        return Err(FairnessError::invalid_bet(format!("{} must be a non-negative number", field)));
    }
    let scaled = value * 100.0;
    let rounded = scaled.round();
    if (scaled - rounded).abs() > 1e-6 {
        return Err(FairnessError::invalid_bet(format!(
            "{} must have at most two decimal places",
            field
        )));
    }
    Ok(rounded as u64)
}

/// Roll in hundredths, 0..=9999
pub fn roll_from_float(float: f64) -> u64 {
    ((float * 10_000.0).floor() as u64).min(9_999)
}

/// Win chance in percent for a validated target
pub fn win_chance(target: f64, direction: DiceDirection) -> f64 {
    match direction {
        DiceDirection::Under => target,
        DiceDirection::Over => 100.0 - target,
    }
}

/// Check the target against the configured win-chance bounds
pub fn validate(params: &DiceParams, config: &DiceConfig) -> FairResult<u64> {
    let target = to_hundredths(params.target, "target")?;

    let (low, high) = match params.direction {
        DiceDirection::Under => (config.min_win_chance, config.max_win_chance),
        DiceDirection::Over => (100.0 - config.max_win_chance, 100.0 - config.min_win_chance),
    };
    if params.target < low || params.target > high {
        return Err(FairnessError::invalid_bet(format!(
            "target must be between {} and {} for {}",
            low, high, params.direction
        )));
    }

    Ok(target)
}

/// Resolve a roll from one random value
pub fn resolve(float: f64, params: &DiceParams, config: &DiceConfig) -> FairResult<DiceResult> {
    let target = validate(params, config)?;
    let roll = roll_from_float(float);

    let won = match params.direction {
        DiceDirection::Under => roll < target,
        DiceDirection::Over => roll > target,
    };

    Ok(DiceResult {
        roll: roll as f64 / 100.0,
        target: target as f64 / 100.0,
        direction: params.direction,
        win_chance: win_chance(target as f64 / 100.0, params.direction),
        won,
    })
}
