//! Independent re-derivation of past outcomes from revealed seeds

use crate::config::EngineConfig;
use crate::errors::{FairResult, FairnessError};
use crate::games::{self, BetRequest, ResolvedOutcome};
use crate::seed::ServerSeed;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything a player needs to re-check one bet after rotation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationRecord {
    /// Revealed server seed, hex
    pub server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub bet: BetRequest,
    /// Outcome as it was shown to the player
    pub claimed: ResolvedOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum VerificationFailure {
    SeedTampered,
    OutcomeMismatch(String),
    InvalidSeed(String),
    InvalidBet(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationReport {
    pub nonce: u64,
    pub committed_hash: String,
    /// Empty when the revealed seed could not be decoded
    pub computed_hash: String,
    pub claimed: ResolvedOutcome,
    pub computed: Option<ResolvedOutcome>,
    pub matches: bool,
    pub failure: Option<VerificationFailure>,
}

impl VerificationReport {
    /// Convert a failed report into the matching error
    pub fn ensure_match(&self) -> FairResult<()> {
        match &self.failure {
            None => Ok(()),
            Some(VerificationFailure::SeedTampered) => Err(FairnessError::SeedTampered {
                committed: self.committed_hash.clone(),
                computed: self.computed_hash.clone(),
            }),
            Some(VerificationFailure::OutcomeMismatch(reason)) => Err(FairnessError::OutcomeMismatch {
                nonce: self.nonce,
                reason: reason.clone(),
            }),
            Some(VerificationFailure::InvalidSeed(msg)) => Err(FairnessError::InvalidSeed(msg.clone())),
            Some(VerificationFailure::InvalidBet(msg)) => Err(FairnessError::InvalidBetParameters(msg.clone())),
        }
    }
}

/// First field where two outcomes disagree
fn describe_difference(claimed: &ResolvedOutcome, computed: &ResolvedOutcome) -> Option<String> {
    if claimed.game != computed.game {
        return Some(format!("game {} != {}", claimed.game, computed.game));
    }
    if claimed.floats != computed.floats {
        return Some("random values differ".to_string());
    }
    if claimed.result != computed.result {
        return Some(format!("{} result differs", computed.game));
    }
    if claimed.payout_multiplier != computed.payout_multiplier {
        return Some(format!(
            "payout multiplier {} != {}",
            claimed.payout_multiplier, computed.payout_multiplier
        ));
    }
    if claimed.bet_amount != computed.bet_amount || claimed.payout != computed.payout {
        return Some(format!("payout {} != {}", claimed.payout, computed.payout));
    }
    if claimed != computed {
        return Some("outcome records differ".to_string());
    }
    None
}

pub struct Verifier {
    config: EngineConfig,
}

impl Verifier {
    /// `config` must be the configuration the outcome was produced under
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn verify(&self, record: &VerificationRecord) -> VerificationReport {
        let claimed = &record.claimed;
        let mut report = VerificationReport {
            nonce: record.nonce,
            committed_hash: claimed.server_seed_hash.clone(),
            computed_hash: String::new(),
            claimed: claimed.clone(),
            computed: None,
            matches: false,
            failure: None,
        };

        let server_seed = match ServerSeed::from_hex(&record.server_seed) {
            Ok(seed) => seed,
            Err(e) => {
                debug!("Verification of nonce {} failed: {}", record.nonce, e);
                report.failure = Some(VerificationFailure::InvalidSeed(e.to_string()));
                return report;
            }
        };
        report.computed_hash = server_seed.commitment();

        let computed = games::resolve_outcome(
            &server_seed,
            &record.client_seed,
            record.nonce,
            &record.bet,
            &self.config,
        );

        let failure = match &computed {
            _ if report.computed_hash != report.committed_hash => Some(VerificationFailure::SeedTampered),
            _ if record.client_seed != claimed.client_seed => Some(VerificationFailure::OutcomeMismatch(
                "client seed differs from the claimed outcome".to_string(),
            )),
            _ if record.nonce != claimed.nonce => Some(VerificationFailure::OutcomeMismatch(format!(
                "nonce {} != claimed {}",
                record.nonce, claimed.nonce
            ))),
            Err(FairnessError::InvalidSeed(msg)) => Some(VerificationFailure::InvalidSeed(msg.clone())),
            Err(FairnessError::InvalidBetParameters(msg)) => Some(VerificationFailure::InvalidBet(msg.clone())),
            Err(e) => Some(VerificationFailure::InvalidBet(e.to_string())),
            Ok(outcome) => describe_difference(claimed, outcome).map(VerificationFailure::OutcomeMismatch),
        };

        report.computed = computed.ok();
        report.matches = failure.is_none();
        report.failure = failure;

        match &report.failure {
            None => debug!("Verified {} outcome at nonce {}", claimed.game, record.nonce),
            Some(failure) => debug!("Verification of nonce {} failed: {:?}", record.nonce, failure),
        }
        report
    }

    /// Verify a JSON-encoded `VerificationRecord`
    pub fn verify_json(&self, json: &str) -> FairResult<VerificationReport> {
        let record: VerificationRecord = serde_json::from_str(json)?;
        Ok(self.verify(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::dice::{DiceDirection, DiceParams};
    use crate::games::BetParams;

    fn record() -> VerificationRecord {
        let seed = ServerSeed::from_bytes(vec![0x11; 32]).unwrap();
        let bet = BetRequest::new(
            1.0,
            BetParams::Dice(DiceParams {
                target: 50.0,
                direction: DiceDirection::Under,
            }),
        );
        let claimed = games::resolve_outcome(&seed, "player-seed", 3, &bet, &EngineConfig::default()).unwrap();

        VerificationRecord {
            server_seed: seed.to_hex(),
            client_seed: "player-seed".to_string(),
            nonce: 3,
            bet,
            claimed,
        }
    }

    fn verifier() -> Verifier {
        Verifier::new(EngineConfig::default())
    }

    #[test]
    fn test_honest_record_matches() {
        let report = verifier().verify(&record());
        assert!(report.matches);
        assert_eq!(report.committed_hash, report.computed_hash);
        assert_eq!(report.computed.as_ref(), Some(&report.claimed));
        assert!(report.ensure_match().is_ok());
    }

    #[test]
    fn test_survives_json() {
        let json = serde_json::to_string(&record()).unwrap();
        let report = verifier().verify_json(&json).unwrap();
        assert!(report.matches);

        assert!(matches!(
            verifier().verify_json("{not json"),
            Err(FairnessError::Serialization(_))
        ));
    }

    #[test]
    fn test_tampered_seed() {
        let mut record = record();
        let mut bytes = hex::decode(&record.server_seed).unwrap();
        bytes[0] ^= 0x01;
        record.server_seed = hex::encode(bytes);

        let report = verifier().verify(&record);
        assert!(!report.matches);
        assert_eq!(report.failure, Some(VerificationFailure::SeedTampered));
        assert!(matches!(report.ensure_match(), Err(FairnessError::SeedTampered { .. })));
    }

    #[test]
    fn test_altered_outcome() {
        let mut record = record();
        record.claimed.payout_multiplier = 50.0;

        let report = verifier().verify(&record);
        assert!(!report.matches);
        assert!(matches!(
            report.ensure_match(),
            Err(FairnessError::OutcomeMismatch { nonce: 3, .. })
        ));
    }

    #[test]
    fn test_wrong_nonce() {
        let mut record = record();
        record.nonce = 4;

        let report = verifier().verify(&record);
        assert!(matches!(report.failure, Some(VerificationFailure::OutcomeMismatch(_))));
    }

    #[test]
    fn test_undecodable_seed() {
        let mut record = record();
        record.server_seed = "not-hex".to_string();

        let report = verifier().verify(&record);
        assert!(!report.matches);
        assert!(report.computed.is_none());
        assert!(matches!(report.ensure_match(), Err(FairnessError::InvalidSeed(_))));
    }
}
