//! Fairplay - provably-fair outcome engine
//!
//! Commit-reveal randomness for casino games. The house commits to a secret
//! server seed by publishing its SHA-256 hash, every bet draws from
//! `(server_seed, client_seed, nonce)` and, once the seed is rotated and
//! revealed, anyone can recompute each outcome and compare.
//!
//! ```no_run
//! use fairplay::{BetParams, BetRequest, EngineConfig, FairnessEngine};
//! use fairplay::games::limbo::LimboParams;
//!
//! # fn main() -> fairplay::FairResult<()> {
//! let engine = FairnessEngine::new(EngineConfig::default())?;
//! let session = engine.create_session(Some("my seed".to_string()))?;
//! let receipt = engine.resolve(
//!     session.session_id,
//!     0,
//!     &BetRequest::new(1.0, BetParams::Limbo(LimboParams { target: 2.0 })),
//! )?;
//! assert_eq!(receipt.new_nonce, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod games;
pub mod metrics;
pub mod rng;
pub mod seed;
pub mod session_store;
pub mod verifier;

pub use config::{ConfigLoader, EngineConfig};
pub use engine::{FairnessEngine, MinesGame, SeedRotation};
pub use errors::{ConfigurationError, FairResult, FairnessError};
pub use games::{BetParams, BetReceipt, BetRequest, GameResult, GameType, PayoutCalculator, ResolvedOutcome};
pub use rng::{next_floats, RandomSource};
pub use seed::{SeedSession, ServerSeed, SessionCommitment};
pub use verifier::{VerificationRecord, VerificationReport, Verifier};
