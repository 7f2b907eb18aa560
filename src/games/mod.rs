//! Outcome resolvers, one per game, and the shared resolution path

pub mod baccarat;
pub mod dice;
pub mod limbo;
pub mod mines;
pub mod payout;
pub mod types;

pub use payout::PayoutCalculator;
pub use types::*;

use crate::config::EngineConfig;
use crate::errors::{FairResult, FairnessError};
use crate::rng::RandomSource;
use crate::seed::ServerSeed;

/// Map random values to a game result. Pure: same inputs, same result.
pub fn resolve_game(floats: &[f64], params: &BetParams, config: &EngineConfig) -> FairResult<GameResult> {
    let needed = params.floats_needed();
    if floats.len() < needed {
        return Err(FairnessError::invalid_bet(format!(
            "{} needs {} random values, got {}",
            params.game_type(),
            needed,
            floats.len()
        )));
    }

    Ok(match params {
        BetParams::Dice(dice) => GameResult::Dice(dice::resolve(floats[0], dice, &config.dice)?),
        BetParams::Limbo(limbo) => GameResult::Limbo(limbo::resolve(
            floats[0],
            limbo,
            &config.limbo,
            config.house_edge_percent,
        )?),
        BetParams::Baccarat(hand) => GameResult::Baccarat(baccarat::resolve(floats, hand)?),
        BetParams::Mines(mines) => GameResult::Mines(mines::resolve(floats, mines, &config.mines)?),
    })
}

/// Check a bet without drawing randomness
pub fn validate_bet(bet: &BetRequest, config: &EngineConfig) -> FairResult<()> {
    payout::validate_amount(bet.amount)?;
    match &bet.params {
        BetParams::Dice(dice) => dice::validate(dice, &config.dice).map(|_| ()),
        BetParams::Limbo(limbo) => limbo::validate(limbo, &config.limbo).map(|_| ()),
        BetParams::Baccarat(_) => Ok(()),
        BetParams::Mines(mines) => mines.setup().validate(&config.mines),
    }
}

/// Full resolution of one bet: random values, game result and payout.
///
/// The engine and the verifier both go through here, so a verified outcome is
/// recomputed by exactly the code that produced it.
pub fn resolve_outcome(
    server_seed: &ServerSeed,
    client_seed: &str,
    nonce: u64,
    bet: &BetRequest,
    config: &EngineConfig,
) -> FairResult<ResolvedOutcome> {
    validate_bet(bet, config)?;

    let source = RandomSource::new(server_seed.as_bytes(), client_seed, nonce)?;
    let floats = source.floats(bet.params.floats_needed());
    let result = resolve_game(&floats, &bet.params, config)?;

    let calculator = PayoutCalculator::new(config);
    let payout_multiplier = calculator.payout_multiplier(&result);

    Ok(ResolvedOutcome {
        game: bet.game_type(),
        server_seed_hash: server_seed.commitment(),
        client_seed: client_seed.to_string(),
        nonce,
        floats,
        payout: calculator.payout(bet.amount, payout_multiplier),
        bet_amount: bet.amount,
        payout_multiplier,
        result,
    })
}
