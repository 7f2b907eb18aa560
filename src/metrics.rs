//! Engine counters and return-to-player snapshots

use crate::games::types::{GameType, ResolvedOutcome};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Amounts are accumulated in millionths so the counters stay atomic
const AMOUNT_SCALE: f64 = 1_000_000.0;

fn to_units(amount: f64) -> u64 {
    (amount * AMOUNT_SCALE).round().max(0.0) as u64
}

fn from_units(units: u64) -> f64 {
    units as f64 / AMOUNT_SCALE
}

#[derive(Default)]
struct GameCounters {
    bets: AtomicU64,
    wins: AtomicU64,
    wagered: AtomicU64,
    paid: AtomicU64,
}

impl GameCounters {
    fn snapshot(&self) -> GameStats {
        let wagered = from_units(self.wagered.load(Ordering::SeqCst));
        let paid = from_units(self.paid.load(Ordering::SeqCst));
        GameStats {
            bets: self.bets.load(Ordering::SeqCst),
            wins: self.wins.load(Ordering::SeqCst),
            wagered,
            paid,
            rtp_percent: if wagered > 0.0 { paid / wagered * 100.0 } else { 0.0 },
        }
    }
}

pub struct EngineMetrics {
    start_time: Instant,
    sessions_created: AtomicU64,
    rotations: AtomicU64,
    rejected_bets: AtomicU64,
    nonce_conflicts: AtomicU64,
    abandoned_rounds: AtomicU64,
    verifications: AtomicU64,
    verification_failures: AtomicU64,
    dice: GameCounters,
    limbo: GameCounters,
    baccarat: GameCounters,
    mines: GameCounters,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            sessions_created: AtomicU64::new(0),
            rotations: AtomicU64::new(0),
            rejected_bets: AtomicU64::new(0),
            nonce_conflicts: AtomicU64::new(0),
            abandoned_rounds: AtomicU64::new(0),
            verifications: AtomicU64::new(0),
            verification_failures: AtomicU64::new(0),
            dice: GameCounters::default(),
            limbo: GameCounters::default(),
            baccarat: GameCounters::default(),
            mines: GameCounters::default(),
        }
    }

    fn game(&self, game: GameType) -> &GameCounters {
        match game {
            GameType::Dice => &self.dice,
            GameType::Limbo => &self.limbo,
            GameType::Baccarat => &self.baccarat,
            GameType::Mines => &self.mines,
        }
    }

    pub fn record_session(&self) {
        self.sessions_created.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rotation(&self) {
        self.rotations.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_outcome(&self, outcome: &ResolvedOutcome) {
        let counters = self.game(outcome.game);
        counters.bets.fetch_add(1, Ordering::SeqCst);
        if outcome.is_win() {
            counters.wins.fetch_add(1, Ordering::SeqCst);
        }
        counters.wagered.fetch_add(to_units(outcome.bet_amount), Ordering::SeqCst);
        counters.paid.fetch_add(to_units(outcome.payout), Ordering::SeqCst);
    }

    pub fn record_rejection(&self) {
        self.rejected_bets.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_nonce_conflict(&self) {
        self.nonce_conflicts.fetch_add(1, Ordering::SeqCst);
    }

    /// Interactive round dropped without an outcome
    pub fn record_abandoned_round(&self) {
        self.abandoned_rounds.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_verification(&self, matched: bool) {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        if !matched {
            self.verification_failures.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn total_runtime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let games: BTreeMap<String, GameStats> = GameType::ALL
            .iter()
            .map(|&game| (game.to_string(), self.game(game).snapshot()))
            .collect();
        let total_bets = games.values().map(|g| g.bets).sum();

        MetricsSnapshot {
            uptime_secs: self.total_runtime().as_secs(),
            sessions_created: self.sessions_created.load(Ordering::SeqCst),
            rotations: self.rotations.load(Ordering::SeqCst),
            total_bets,
            rejected_bets: self.rejected_bets.load(Ordering::SeqCst),
            nonce_conflicts: self.nonce_conflicts.load(Ordering::SeqCst),
            abandoned_rounds: self.abandoned_rounds.load(Ordering::SeqCst),
            verifications: self.verifications.load(Ordering::SeqCst),
            verification_failures: self.verification_failures.load(Ordering::SeqCst),
            games,
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStats {
    pub bets: u64,
    pub wins: u64,
    pub wagered: f64,
    pub paid: f64,
    /// Realized return to player
    pub rtp_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub sessions_created: u64,
    pub rotations: u64,
    pub total_bets: u64,
    pub rejected_bets: u64,
    pub nonce_conflicts: u64,
    pub abandoned_rounds: u64,
    pub verifications: u64,
    pub verification_failures: u64,
    pub games: BTreeMap<String, GameStats>,
}
