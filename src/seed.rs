//! Seed sessions and the server seed commitment
//!
//! A session binds a secret server seed, its published SHA-256 commitment, the
//! player's client seed and the nonce counter. The server seed never leaves the
//! session until it is revealed by rotation.

use crate::config::SeedConfig;
use crate::errors::{FairResult, FairnessError};
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Longest client seed accepted, in bytes
pub const MAX_CLIENT_SEED_LEN: usize = 256;

/// Secret server seed bytes
#[derive(Clone, PartialEq, Eq)]
pub struct ServerSeed(Vec<u8>);

impl ServerSeed {
    /// Draw a fresh seed from the operating system RNG
    pub fn generate(len: usize) -> Self {
        let mut bytes = vec![0u8; len];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> FairResult<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(FairnessError::InvalidSeed("server seed cannot be empty".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Parse a revealed seed from hex
    pub fn from_hex(hex_seed: &str) -> FairResult<Self> {
        let bytes = hex::decode(hex_seed.trim())
            .map_err(|e| FairnessError::InvalidSeed(format!("server seed is not valid hex: {}", e)))?;
        Self::from_bytes(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Public commitment for this seed
    pub fn commitment(&self) -> String {
        hash_server_seed(&self.0)
    }
}

// Never print the secret
impl fmt::Debug for ServerSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerSeed(<{} bytes redacted>)", self.0.len())
    }
}

/// Lowercase hex SHA-256 of the raw seed bytes
pub fn hash_server_seed(seed: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(seed);
    hex::encode(hasher.finalize())
}

/// Random hex client seed for players who do not pick one
pub fn random_client_seed(len: usize) -> String {
    let mut bytes = vec![0u8; len.max(1)];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn validate_client_seed(client_seed: &str) -> FairResult<()> {
    if client_seed.trim().is_empty() {
        return Err(FairnessError::InvalidSeed("client seed cannot be empty".to_string()));
    }
    if client_seed.len() > MAX_CLIENT_SEED_LEN {
        return Err(FairnessError::InvalidSeed(format!(
            "client seed longer than {} bytes",
            MAX_CLIENT_SEED_LEN
        )));
    }
    Ok(())
}

/// Committed seed pair plus the per-session nonce
#[derive(Debug, Clone)]
pub struct SeedSession {
    id: Uuid,
    server_seed: ServerSeed,
    hashed_server_seed: String,
    client_seed: String,
    nonce: u64,
    created_at: DateTime<Utc>,
}

/// What the player is allowed to see about a session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionCommitment {
    pub session_id: Uuid,
    pub hashed_server_seed: String,
    pub client_seed: String,
    pub nonce: u64,
    pub created_at: DateTime<Utc>,
}

/// Result of rotating seeds: the old secret and the session replacing it
#[derive(Debug, Clone)]
pub struct RotatedSeeds {
    pub revealed_server_seed: String,
    /// Final public state of the retired session
    pub previous: SessionCommitment,
    pub new_session: SeedSession,
}

impl SeedSession {
    /// Open a session with a fresh server seed
    pub fn create(client_seed: Option<String>, config: &SeedConfig) -> FairResult<Self> {
        let client_seed = client_seed.unwrap_or_else(|| random_client_seed(config.client_seed_bytes));
        Self::with_seeds(ServerSeed::generate(config.server_seed_bytes), client_seed)
    }

    /// Open a session over known seeds
    pub fn with_seeds(server_seed: ServerSeed, client_seed: impl Into<String>) -> FairResult<Self> {
        let client_seed = client_seed.into();
        validate_client_seed(&client_seed)?;

        Ok(Self {
            id: Uuid::new_v4(),
            hashed_server_seed: server_seed.commitment(),
            server_seed,
            client_seed,
            nonce: 0,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn server_seed(&self) -> &ServerSeed {
        &self.server_seed
    }

    pub fn hashed_server_seed(&self) -> &str {
        &self.hashed_server_seed
    }

    pub fn client_seed(&self) -> &str {
        &self.client_seed
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn commitment(&self) -> SessionCommitment {
        SessionCommitment {
            session_id: self.id,
            hashed_server_seed: self.hashed_server_seed.clone(),
            client_seed: self.client_seed.clone(),
            nonce: self.nonce,
            created_at: self.created_at,
        }
    }

    /// Reject any nonce other than the current one
    pub fn check_nonce(&self, nonce: u64) -> FairResult<()> {
        if nonce != self.nonce {
            return Err(FairnessError::NonceReuse {
                expected: self.nonce,
                actual: nonce,
            });
        }
        Ok(())
    }

    /// Consume the current nonce. Callers must hold the session exclusively.
    pub(crate) fn advance(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }

    /// Reveal the server seed and open a replacement session.
    ///
    /// Without a new client seed the current one carries over; the server seed
    /// and nonce always reset.
    pub fn rotate(&self, new_client_seed: Option<String>, config: &SeedConfig) -> FairResult<RotatedSeeds> {
        let client_seed = new_client_seed.unwrap_or_else(|| self.client_seed.clone());
        let new_session = SeedSession::create(Some(client_seed), config)?;

        Ok(RotatedSeeds {
            revealed_server_seed: self.server_seed.to_hex(),
            previous: self.commitment(),
            new_session,
        })
    }
}
