//! Limbo: a crash-style multiplier must reach the player's target

use crate::config::LimboConfig;
use crate::errors::{FairResult, FairnessError};
use crate::games::dice::to_hundredths;
use serde::{Deserialize, Serialize};

pub const LIMBO_FLOATS: usize = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimboParams {
    /// Multiplier the result must reach
    pub target: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LimboResult {
    /// Multiplier produced by the random value
    pub result: f64,
    pub target: f64,
    pub win_chance: f64,
    pub won: bool,
}

pub fn validate(params: &LimboParams, config: &LimboConfig) -> FairResult<u64> {
    let target = to_hundredths(params.target, "target")?;
    if params.target < config.min_target || params.target > config.max_target {
        return Err(FairnessError::invalid_bet(format!(
            "target must be between {} and {}",
            config.min_target, config.max_target
        )));
    }
    Ok(target)
}

/// Result multiplier in hundredths: `(100 - edge) / (100 * float)`, truncated,
/// floored at 1.00 and capped at the configured maximum
pub fn multiplier_from_float(float: f64, house_edge_percent: f64, max_target: f64) -> u64 {
    let cap = (max_target * 100.0).floor() as u64;
    if float <= 0.0 {
        return cap;
    }

    let raw = (100.0 - house_edge_percent) / (100.0 * float);
    if raw >= max_target {
        return cap;
    }
    // Nudge before flooring so 1.98 stays 1.98 rather than 1.97
    let truncated = (raw * 100.0 + 1e-9).floor() as u64;
    truncated.clamp(100, cap)
}

/// Percent chance of reaching `target`, clamped to (0, 100]
pub fn win_chance(target: f64, house_edge_percent: f64) -> f64 {
    ((100.0 - house_edge_percent) / target).clamp(f64::MIN_POSITIVE, 100.0)
}

pub fn resolve(float: f64, params: &LimboParams, config: &LimboConfig, house_edge_percent: f64) -> FairResult<LimboResult> {
    let target = validate(params, config)?;
    let result = multiplier_from_float(float, house_edge_percent, config.max_target);

    Ok(LimboResult {
        result: result as f64 / 100.0,
        target: target as f64 / 100.0,
        win_chance: win_chance(target as f64 / 100.0, house_edge_percent),
        won: result >= target,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(target: f64) -> LimboParams {
        LimboParams { target }
    }

    #[test]
    fn test_multiplier_curve() {
        assert_eq!(multiplier_from_float(0.5, 1.0, 1_000_000.0), 198);
        assert_eq!(multiplier_from_float(0.99, 1.0, 1_000_000.0), 100);
        // Values above 0.99 would fall below 1.00
        assert_eq!(multiplier_from_float(0.999, 1.0, 1_000_000.0), 100);
        assert_eq!(multiplier_from_float(0.0, 1.0, 1_000_000.0), 100_000_000);
        assert_eq!(multiplier_from_float(1e-12, 1.0, 1_000_000.0), 100_000_000);
    }

    #[test]
    fn test_win_at_exact_target() {
        let config = LimboConfig::default();

        let exact = resolve(0.5, &target(1.98), &config, 1.0).unwrap();
        assert_eq!(exact.result, 1.98);
        assert!(exact.won);

        assert!(!resolve(0.5, &target(1.99), &config, 1.0).unwrap().won);
        assert!(!resolve(0.99, &target(1.01), &config, 1.0).unwrap().won);
    }

    #[test]
    fn test_win_chance() {
        assert_eq!(win_chance(2.0, 1.0), 49.5);
        assert_eq!(win_chance(1.01, 0.0), 99.00990099009901);
        assert!(win_chance(1_000_000.0, 1.0) > 0.0);
    }

    #[test]
    fn test_target_validation() {
        let config = LimboConfig::default();

        assert!(validate(&target(1.01), &config).is_ok());
        assert!(validate(&target(1_000_000.0), &config).is_ok());
        assert!(validate(&target(1.0), &config).is_err());
        assert!(validate(&target(1_000_000.01), &config).is_err());
        assert!(validate(&target(2.555), &config).is_err());
        assert!(validate(&target(f64::INFINITY), &config).is_err());
    }
}
