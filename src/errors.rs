//! Error types for the provably-fair outcome engine
//!
//! Every error here is local and recoverable by the caller. A failed call never
//! leaves a session partially mutated.

use uuid::Uuid;

/// Root error type for all engine operations
#[derive(Debug, thiserror::Error)]
pub enum FairnessError {
    /// Empty or malformed server/client seed
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// Bet parameters outside the accepted range
    #[error("Invalid bet parameters: {0}")]
    InvalidBetParameters(String),

    /// Caller tried to resolve with a nonce other than the session's current one
    #[error("Nonce error: expected {expected}, got {actual}")]
    NonceReuse { expected: u64, actual: u64 },

    /// Revealed server seed does not hash to the published commitment
    #[error("Server seed does not match commitment: committed {committed}, computed {computed}")]
    SeedTampered { committed: String, computed: String },

    /// Recomputed outcome differs from the one shown to the player
    #[error("Outcome mismatch for nonce {nonce}: {reason}")]
    OutcomeMismatch { nonce: u64, reason: String },

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Seeds cannot be revealed while a round drawn from them is still open
    #[error("Session {session} has {open} round(s) in progress")]
    RoundInProgress { session: Uuid, open: usize },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Configuration and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),
}

impl FairnessError {
    /// Shorthand for bet validation failures
    pub fn invalid_bet(msg: impl Into<String>) -> Self {
        FairnessError::InvalidBetParameters(msg.into())
    }

    /// True for errors produced only by verification
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            FairnessError::SeedTampered { .. } | FairnessError::OutcomeMismatch { .. }
        )
    }
}

// Convenience type alias for Results
pub type FairResult<T> = Result<T, FairnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_error_details() {
        let err = FairnessError::NonceReuse {
            expected: 5,
            actual: 3,
        };

        assert!(err.to_string().contains("expected 5"));
        assert!(err.to_string().contains("got 3"));
    }

    #[test]
    fn test_configuration_conversion() {
        let config_error = ConfigurationError::LoadFailed("missing file".to_string());
        let err: FairnessError = config_error.into();

        match err {
            FairnessError::Configuration(_) => {}
            _ => panic!("Expected configuration error"),
        }
        assert!(err.to_string().contains("missing file"));
    }

    #[test]
    fn test_verification_failure_classification() {
        let tampered = FairnessError::SeedTampered {
            committed: "aa".to_string(),
            computed: "bb".to_string(),
        };
        assert!(tampered.is_verification_failure());
        assert!(!FairnessError::invalid_bet("target too low").is_verification_failure());
    }
}
