//! Configuration management for the outcome engine
//!
//! Defaults, TOML loading, environment variable overrides and validation.

use crate::errors::{ConfigurationError, FairResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Complete engine configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Percent subtracted from the fair payout (dice, limbo)
    pub house_edge_percent: f64,
    pub dice: DiceConfig,
    pub limbo: LimboConfig,
    pub baccarat: BaccaratConfig,
    pub mines: MinesConfig,
    pub seeds: SeedConfig,
}

/// Dice win-chance bounds, in percent
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiceConfig {
    pub min_win_chance: f64,
    pub max_win_chance: f64,
}

/// Limbo target bounds
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LimboConfig {
    pub min_target: f64,
    pub max_target: f64,
}

/// Baccarat total-return multipliers per winning side
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BaccaratConfig {
    pub player_payout: f64,
    pub banker_payout: f64,
    pub tie_payout: f64,
}

/// Minesweeper board limits and multiplier curve
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MinesConfig {
    /// Multiplier gained for clearing the whole board
    pub range_factor: f64,
    pub max_board_side: u32,
}

/// Seed generation sizes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeedConfig {
    pub server_seed_bytes: usize,
    pub client_seed_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            house_edge_percent: 1.0,
            dice: DiceConfig::default(),
            limbo: LimboConfig::default(),
            baccarat: BaccaratConfig::default(),
            mines: MinesConfig::default(),
            seeds: SeedConfig::default(),
        }
    }
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            min_win_chance: 1.0,
            max_win_chance: 98.0,
        }
    }
}

impl Default for LimboConfig {
    fn default() -> Self {
        Self {
            min_target: 1.01,
            max_target: 1_000_000.0,
        }
    }
}

impl Default for BaccaratConfig {
    fn default() -> Self {
        Self {
            player_payout: 2.0,
            banker_payout: 1.95,
            tie_payout: 8.0,
        }
    }
}

impl Default for MinesConfig {
    fn default() -> Self {
        Self {
            range_factor: 9.0,
            max_board_side: 8,
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            server_seed_bytes: 32,
            client_seed_bytes: 16,
        }
    }
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> FairResult<EngineConfig> {
        let mut config = match self.config_path {
            Some(ref path) => self.load_from_file(path)?,
            None => EngineConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        validate(&config)?;

        Ok(config)
    }

    /// Load configuration from TOML file
    fn load_from_file(&self, path: &str) -> FairResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    /// Save configuration to file
    pub fn save(&self, config: &EngineConfig, path: &str) -> FairResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_override<T: std::str::FromStr>(key: &str, value: String, reason: &str) -> FairResult<T> {
    value.parse().map_err(|_| {
        ConfigurationError::InvalidValue {
            field: key.to_string(),
            value,
            reason: reason.to_string(),
        }
        .into()
    })
}

/// Apply `FAIRPLAY_*` overrides read through `lookup`
pub fn apply_overrides<F>(config: &mut EngineConfig, lookup: F) -> FairResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(edge) = lookup("FAIRPLAY_HOUSE_EDGE") {
        config.house_edge_percent = parse_override("FAIRPLAY_HOUSE_EDGE", edge, "Invalid percentage")?;
    }
    if let Some(max) = lookup("FAIRPLAY_LIMBO_MAX_TARGET") {
        config.limbo.max_target = parse_override("FAIRPLAY_LIMBO_MAX_TARGET", max, "Invalid multiplier")?;
    }
    if let Some(factor) = lookup("FAIRPLAY_MINES_RANGE_FACTOR") {
        config.mines.range_factor = parse_override("FAIRPLAY_MINES_RANGE_FACTOR", factor, "Invalid factor")?;
    }
    if let Some(side) = lookup("FAIRPLAY_MINES_MAX_SIDE") {
        config.mines.max_board_side = parse_override("FAIRPLAY_MINES_MAX_SIDE", side, "Invalid board side")?;
    }

    Ok(())
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> FairResult<()> {
    Err(ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
    .into())
}

/// Validate configuration values
pub fn validate(config: &EngineConfig) -> FairResult<()> {
    let edge = config.house_edge_percent;
    if !edge.is_finite() || !(0.0..50.0).contains(&edge) {
        return invalid("house_edge_percent", edge, "House edge must be in [0, 50)");
    }

    let dice = &config.dice;
    if !(dice.min_win_chance > 0.0 && dice.min_win_chance < dice.max_win_chance && dice.max_win_chance < 100.0) {
        return invalid(
            "dice.min_win_chance",
            format!("{}..{}", dice.min_win_chance, dice.max_win_chance),
            "Win chance bounds must satisfy 0 < min < max < 100",
        );
    }

    if !(config.limbo.min_target >= 1.01 && config.limbo.max_target >= config.limbo.min_target) {
        return invalid(
            "limbo.max_target",
            config.limbo.max_target,
            "Limbo targets must satisfy 1.01 <= min <= max",
        );
    }

    let baccarat = &config.baccarat;
    for (field, payout) in [
        ("baccarat.player_payout", baccarat.player_payout),
        ("baccarat.banker_payout", baccarat.banker_payout),
        ("baccarat.tie_payout", baccarat.tie_payout),
    ] {
        if !payout.is_finite() || payout < 0.0 {
            return invalid(field, payout, "Payout must be a non-negative number");
        }
    }

    if !(config.mines.range_factor.is_finite() && config.mines.range_factor > 0.0) {
        return invalid("mines.range_factor", config.mines.range_factor, "Range factor must be positive");
    }
    if !(2..=32).contains(&config.mines.max_board_side) {
        return invalid("mines.max_board_side", config.mines.max_board_side, "Board side must be in 2..=32");
    }

    if config.seeds.server_seed_bytes < 16 {
        return invalid("seeds.server_seed_bytes", config.seeds.server_seed_bytes, "Server seed needs at least 16 bytes");
    }
    if config.seeds.client_seed_bytes == 0 {
        return invalid("seeds.client_seed_bytes", 0, "Client seed cannot be empty");
    }

    Ok(())
}

/// Generate a sample configuration file
pub fn generate_sample_config(path: &str) -> FairResult<()> {
    ConfigLoader::new().save(&EngineConfig::default(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FairnessError;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.house_edge_percent, 1.0);
        assert_eq!(config.dice.max_win_chance, 98.0);
        assert_eq!(config.limbo.max_target, 1_000_000.0);
        assert_eq!(config.baccarat.banker_payout, 1.95);
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        config.house_edge_percent = 75.0;
        assert!(validate(&config).is_err());

        config = EngineConfig::default();
        config.mines.max_board_side = 1;
        assert!(validate(&config).is_err());

        config = EngineConfig::default();
        config.limbo.max_target = 1.0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [("FAIRPLAY_HOUSE_EDGE", "2.5"), ("FAIRPLAY_MINES_MAX_SIDE", "5")]
            .into_iter()
            .collect();
        let mut config = EngineConfig::default();

        apply_overrides(&mut config, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.house_edge_percent, 2.5);
        assert_eq!(config.mines.max_board_side, 5);
        assert_eq!(config.mines.range_factor, 9.0);
    }

    #[test]
    fn test_bad_override_is_reported() {
        let mut config = EngineConfig::default();
        let err = apply_overrides(&mut config, |k| {
            (k == "FAIRPLAY_HOUSE_EDGE").then(|| "lots".to_string())
        })
        .unwrap_err();

        match err {
            FairnessError::Configuration(ConfigurationError::InvalidValue { field, .. }) => {
                assert_eq!(field, "FAIRPLAY_HOUSE_EDGE");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_save_and_load_config() -> FairResult<()> {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_str().unwrap();

        let mut original = EngineConfig::default();
        original.mines.range_factor = 4.5;
        ConfigLoader::new().save(&original, path)?;

        let loaded = ConfigLoader::new().with_path(path).load_from_file(path)?;
        assert_eq!(loaded, original);

        Ok(())
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: EngineConfig = toml::from_str("[mines]\nrange_factor = 3.0\n").unwrap();
        assert_eq!(config.house_edge_percent, 1.0);
        assert_eq!(config.mines.range_factor, 3.0);
        assert_eq!(config.mines.max_board_side, 8);
        assert_eq!(config.limbo.min_target, 1.01);
    }
}
