//! Payout multipliers with the configured house edge

use crate::config::{BaccaratConfig, EngineConfig};
use crate::errors::{FairResult, FairnessError};
use crate::games::baccarat::BaccaratSide;
use crate::games::types::GameResult;
use crate::games::mines::RoundState;

/// Round `value` to `places` decimals
fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Decimal places kept for a dice multiplier. Small win chances produce
/// large multipliers, which keep more precision.
pub fn dice_precision(win_chance: f64) -> i32 {
    if win_chance < 10.0 {
        4
    } else if win_chance < 50.0 {
        3
    } else {
        2
    }
}

/// `1 + (cleared / total_safe) * range_factor`, four decimals
pub fn mines_multiplier(cleared: usize, total_safe: usize, range_factor: f64) -> f64 {
    if total_safe == 0 {
        return 1.0;
    }
    round_to(1.0 + (cleared as f64 / total_safe as f64) * range_factor, 4)
}

/// Converts resolved results into payout multipliers
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutCalculator {
    house_edge_percent: f64,
    baccarat: BaccaratConfig,
    mines_range_factor: f64,
}

impl PayoutCalculator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            house_edge_percent: config.house_edge_percent,
            baccarat: config.baccarat.clone(),
            mines_range_factor: config.mines.range_factor,
        }
    }

    pub fn house_edge_percent(&self) -> f64 {
        self.house_edge_percent
    }

    /// `(100 - edge) / win_chance`, rounded per precision tier
    pub fn dice_multiplier(&self, win_chance: f64) -> f64 {
        let fair = (100.0 - self.house_edge_percent) / win_chance;
        round_to(fair, dice_precision(win_chance))
    }

    pub fn baccarat_multiplier(&self, side: BaccaratSide, winner: BaccaratSide) -> f64 {
        if side != winner {
            return 0.0;
        }
        match side {
            BaccaratSide::Player => self.baccarat.player_payout,
            BaccaratSide::Banker => self.baccarat.banker_payout,
            BaccaratSide::Tie => self.baccarat.tie_payout,
        }
    }

    pub fn mines_multiplier(&self, cleared: usize, total_safe: usize) -> f64 {
        mines_multiplier(cleared, total_safe, self.mines_range_factor)
    }

    /// Total-return multiplier for a resolved result; zero on a loss
    pub fn payout_multiplier(&self, result: &GameResult) -> f64 {
        match result {
            GameResult::Dice(dice) if dice.won => self.dice_multiplier(dice.win_chance),
            GameResult::Limbo(limbo) if limbo.won => limbo.target,
            GameResult::Baccarat(hand) => self.baccarat_multiplier(hand.side, hand.winner),
            GameResult::Mines(mines) => match mines.state {
                RoundState::Won | RoundState::CashedOut => mines.multiplier,
                _ => 0.0,
            },
            _ => 0.0,
        }
    }

    /// Amount returned for `amount` at `multiplier`
    pub fn payout(&self, amount: f64, multiplier: f64) -> f64 {
        amount * multiplier
    }
}

/// Bet amounts must be finite and positive
pub fn validate_amount(amount: f64) -> FairResult<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(FairnessError::invalid_bet("bet amount must be a positive number"));
    }
    Ok(())
}
