//! Engine facade: sessions, bet resolution, rotation and verification

use crate::config::{self, EngineConfig};
use crate::errors::{FairResult, FairnessError};
use crate::games::mines::{Coord, MineLayout, MinesParams, MinesRound, MinesSetup, Reveal, RoundState};
use crate::games::{self, BetParams, BetReceipt, BetRequest, ResolvedOutcome};
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::rng::RandomSource;
use crate::seed::{SeedSession, ServerSeed, SessionCommitment};
use crate::session_store::{RoundTicket, SessionRegistry};
use crate::verifier::{VerificationRecord, VerificationReport, Verifier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Public result of a seed rotation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeedRotation {
    /// Secret of the retired session, now safe to publish
    pub revealed_server_seed: String,
    pub previous: SessionCommitment,
    pub next: SessionCommitment,
}

pub struct FairnessEngine {
    config: EngineConfig,
    sessions: SessionRegistry,
    verifier: Verifier,
    metrics: Arc<EngineMetrics>,
}

impl FairnessEngine {
    pub fn new(config: EngineConfig) -> FairResult<Self> {
        config::validate(&config)?;
        Ok(Self {
            verifier: Verifier::new(config.clone()),
            config,
            sessions: SessionRegistry::new(),
            metrics: Arc::new(EngineMetrics::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open a session with a fresh server seed and publish its commitment
    pub fn create_session(&self, client_seed: Option<String>) -> FairResult<SessionCommitment> {
        let session = SeedSession::create(client_seed, &self.config.seeds)?;
        Ok(self.open_session(session))
    }

    /// Register an externally built session (e.g. from a persisted seed)
    pub fn open_session(&self, session: SeedSession) -> SessionCommitment {
        let commitment = self.sessions.insert(session);
        self.metrics.record_session();
        info!(
            "Opened session {} with commitment {}",
            commitment.session_id, commitment.hashed_server_seed
        );
        commitment
    }

    pub fn session(&self, id: Uuid) -> FairResult<SessionCommitment> {
        self.sessions.commitment(id)
    }

    /// Resolve one bet at `expected_nonce`.
    ///
    /// The nonce advances only when resolution succeeds; any error leaves the
    /// session exactly as it was.
    pub fn resolve(&self, id: Uuid, expected_nonce: u64, bet: &BetRequest) -> FairResult<BetReceipt> {
        let result = self.sessions.with_session(id, |session| {
            session.check_nonce(expected_nonce)?;
            let outcome = games::resolve_outcome(
                session.server_seed(),
                session.client_seed(),
                session.nonce(),
                bet,
                &self.config,
            )?;
            let new_nonce = session.advance();

            Ok(BetReceipt {
                payout_multiplier: outcome.payout_multiplier,
                outcome,
                new_nonce,
            })
        });

        match &result {
            Ok(receipt) => {
                self.metrics.record_outcome(&receipt.outcome);
                debug!(
                    "Resolved {} bet on session {} at nonce {}: multiplier {}",
                    receipt.outcome.game, id, expected_nonce, receipt.payout_multiplier
                );
            }
            Err(e) => self.record_failure(id, e),
        }
        result
    }

    fn record_failure(&self, id: Uuid, error: &FairnessError) {
        match error {
            FairnessError::NonceReuse { .. } => {
                self.metrics.record_nonce_conflict();
                warn!("Rejected bet on session {}: {}", id, error);
            }
            _ => {
                self.metrics.record_rejection();
                debug!("Rejected bet on session {}: {}", id, error);
            }
        }
    }

    /// Commit a minesweeper layout at `expected_nonce` and hand back the round.
    ///
    /// The nonce is consumed here, before the first reveal. The session cannot
    /// be rotated until the round ends or is dropped.
    pub fn start_mines_round(
        &self,
        id: Uuid,
        expected_nonce: u64,
        amount: f64,
        setup: MinesSetup,
    ) -> FairResult<MinesGame> {
        let result = self.sessions.with_open_round(id, |session| {
            session.check_nonce(expected_nonce)?;
            games::payout::validate_amount(amount)?;
            setup.validate(&self.config.mines)?;

            let source = RandomSource::new(session.server_seed().as_bytes(), session.client_seed(), session.nonce())?;
            let layout = MineLayout::generate(setup, &source.floats(setup.mines as usize))?;
            let mut round = MinesRound::new(layout, self.config.mines.range_factor);
            round.start()?;

            let game = MinesGame {
                server_seed: session.server_seed().clone(),
                client_seed: session.client_seed().to_string(),
                nonce: session.nonce(),
                amount,
                round,
                config: self.config.clone(),
                metrics: Arc::clone(&self.metrics),
                ticket: None,
                recorded: false,
            };
            session.advance();
            Ok(game)
        })
        .map(|(mut game, ticket)| {
            game.ticket = Some(ticket);
            game
        });

        match &result {
            Ok(game) => debug!(
                "Started mines round on session {} at nonce {} ({}x{}, {} mines)",
                id, game.nonce, setup.width, setup.height, setup.mines
            ),
            Err(e) => self.record_failure(id, e),
        }
        result
    }

    /// Reveal the current server seed and replace the session.
    ///
    /// Fails with `RoundInProgress` while a minesweeper round from this session
    /// is still being played.
    pub fn rotate_seeds(&self, id: Uuid, new_client_seed: Option<String>) -> FairResult<SeedRotation> {
        let rotated = self.sessions.rotate(id, new_client_seed, &self.config.seeds).map_err(|e| {
            if let FairnessError::RoundInProgress { .. } = e {
                warn!("Refused rotation of session {}: {}", id, e);
            }
            e
        })?;
        self.metrics.record_rotation();

        let next = rotated.new_session.commitment();
        info!(
            "Rotated session {} after {} bets; new session {}",
            id, rotated.previous.nonce, next.session_id
        );

        Ok(SeedRotation {
            revealed_server_seed: rotated.revealed_server_seed,
            previous: rotated.previous,
            next,
        })
    }

    pub fn verify(&self, record: &VerificationRecord) -> VerificationReport {
        let report = self.verifier.verify(record);
        self.metrics.record_verification(report.matches);
        if let Err(e) = report.ensure_match() {
            if e.is_verification_failure() {
                warn!("Outcome at nonce {} failed verification: {}", record.nonce, e);
            }
        }
        report
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn open_rounds(&self, id: Uuid) -> FairResult<usize> {
        self.sessions.open_rounds(id)
    }
}

/// A minesweeper round in progress. The layout is committed; reveals and
/// cash-out drive the state machine and `finish` yields the logged outcome.
///
/// A round dropped before `finish` is forfeited: its nonce stays consumed, no
/// outcome is produced and it is counted as abandoned.
pub struct MinesGame {
    server_seed: ServerSeed,
    client_seed: String,
    nonce: u64,
    amount: f64,
    round: MinesRound,
    config: EngineConfig,
    metrics: Arc<EngineMetrics>,
    /// Held while the round is being played
    ticket: Option<RoundTicket>,
    recorded: bool,
}

impl MinesGame {
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn server_seed_hash(&self) -> String {
        self.server_seed.commitment()
    }

    pub fn state(&self) -> RoundState {
        self.round.state()
    }

    pub fn multiplier(&self) -> f64 {
        self.round.multiplier()
    }

    pub fn revealed(&self) -> &[Coord] {
        self.round.revealed()
    }

    pub fn reveal(&mut self, coord: Coord) -> FairResult<Reveal> {
        let reveal = self.round.reveal(coord)?;
        self.release_if_ended();
        Ok(reveal)
    }

    pub fn cash_out(&mut self) -> FairResult<f64> {
        let multiplier = self.round.cash_out()?;
        self.release_if_ended();
        Ok(multiplier)
    }

    // Once the round has ended the seed may be revealed
    fn release_if_ended(&mut self) {
        if self.round.state().is_finished() {
            self.ticket = None;
        }
    }

    /// The one-shot bet equivalent to the reveals made so far
    pub fn bet(&self) -> BetRequest {
        let setup = self.round.layout().setup();
        BetRequest::new(
            self.amount,
            BetParams::Mines(MinesParams {
                width: setup.width,
                height: setup.height,
                mines: setup.mines,
                picks: self.round.revealed().to_vec(),
            }),
        )
    }

    /// Produce the outcome of an ended round. Each round yields its outcome once.
    pub fn finish(&mut self) -> FairResult<ResolvedOutcome> {
        if !self.round.state().is_finished() {
            return Err(FairnessError::invalid_bet(format!(
                "round is still {:?}; reveal a mine, clear the board or cash out",
                self.round.state()
            )));
        }
        if self.recorded {
            return Err(FairnessError::invalid_bet(format!(
                "outcome for nonce {} was already recorded",
                self.nonce
            )));
        }

        let outcome = games::resolve_outcome(&self.server_seed, &self.client_seed, self.nonce, &self.bet(), &self.config)?;
        self.recorded = true;
        self.metrics.record_outcome(&outcome);
        debug!(
            "Finished mines round at nonce {}: {:?}, multiplier {}",
            self.nonce,
            self.round.state(),
            outcome.payout_multiplier
        );
        Ok(outcome)
    }
}

impl Drop for MinesGame {
    fn drop(&mut self) {
        if !self.recorded {
            self.metrics.record_abandoned_round();
            warn!(
                "Mines round at nonce {} dropped while {:?}; forfeited",
                self.nonce,
                self.round.state()
            );
        }
    }
}
