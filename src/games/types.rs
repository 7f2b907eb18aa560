use crate::games::baccarat::{BaccaratParams, BaccaratResult, BACCARAT_FLOATS};
use crate::games::dice::{DiceParams, DiceResult, DICE_FLOATS};
use crate::games::limbo::{LimboParams, LimboResult, LIMBO_FLOATS};
use crate::games::mines::{MinesParams, MinesResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported game types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum GameType {
    Dice,
    Limbo,
    Baccarat,
    Mines,
}

impl GameType {
    pub const ALL: [GameType; 4] = [GameType::Dice, GameType::Limbo, GameType::Baccarat, GameType::Mines];
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameType::Dice => write!(f, "dice"),
            GameType::Limbo => write!(f, "limbo"),
            GameType::Baccarat => write!(f, "baccarat"),
            GameType::Mines => write!(f, "mines"),
        }
    }
}

/// Game-specific bet parameters (discriminated union)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum BetParams {
    Dice(DiceParams),
    Limbo(LimboParams),
    Baccarat(BaccaratParams),
    Mines(MinesParams),
}

impl BetParams {
    pub fn game_type(&self) -> GameType {
        match self {
            BetParams::Dice(_) => GameType::Dice,
            BetParams::Limbo(_) => GameType::Limbo,
            BetParams::Baccarat(_) => GameType::Baccarat,
            BetParams::Mines(_) => GameType::Mines,
        }
    }

    /// Random values the resolver consumes
    pub fn floats_needed(&self) -> usize {
        match self {
            BetParams::Dice(_) => DICE_FLOATS,
            BetParams::Limbo(_) => LIMBO_FLOATS,
            BetParams::Baccarat(_) => BACCARAT_FLOATS,
            BetParams::Mines(mines) => mines.mines as usize,
        }
    }
}

/// A single bet as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetRequest {
    pub amount: f64,
    pub params: BetParams,
}

impl BetRequest {
    pub fn new(amount: f64, params: BetParams) -> Self {
        Self { amount, params }
    }

    pub fn game_type(&self) -> GameType {
        self.params.game_type()
    }
}

/// Structured result per game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "game", rename_all = "lowercase")]
pub enum GameResult {
    Dice(DiceResult),
    Limbo(LimboResult),
    Baccarat(BaccaratResult),
    Mines(MinesResult),
}

impl GameResult {
    pub fn game_type(&self) -> GameType {
        match self {
            GameResult::Dice(_) => GameType::Dice,
            GameResult::Limbo(_) => GameType::Limbo,
            GameResult::Baccarat(_) => GameType::Baccarat,
            GameResult::Mines(_) => GameType::Mines,
        }
    }
}

/// Immutable record of one resolved bet; the unit logged for verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolvedOutcome {
    pub game: GameType,
    /// Commitment published before the bet
    pub server_seed_hash: String,
    pub client_seed: String,
    pub nonce: u64,
    /// Random values consumed, in cursor order
    pub floats: Vec<f64>,
    pub result: GameResult,
    pub bet_amount: f64,
    pub payout_multiplier: f64,
    pub payout: f64,
}

impl ResolvedOutcome {
    pub fn is_win(&self) -> bool {
        self.payout_multiplier > 0.0
    }
}

/// Response to a successful `resolve`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetReceipt {
    pub outcome: ResolvedOutcome,
    pub payout_multiplier: f64,
    /// Session nonce after this bet
    pub new_nonce: u64,
}
