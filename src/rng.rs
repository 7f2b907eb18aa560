//! Deterministic random source
//!
//! Every float is an independent SHA-256 digest of
//! `(server_seed, client_seed, nonce, cursor)`. There is no hidden state: the
//! same triple always yields the same sequence, which is what lets a third
//! party recompute an outcome from the revealed seed.

use crate::errors::{FairResult, FairnessError};
use sha2::{Digest, Sha256};

/// Domain separator for float derivation
const FLOAT_DOMAIN: &[u8] = b"FAIRPLAY_FLOAT_V1";

/// 2^53, the number of distinct floats produced
const FLOAT_SCALE: f64 = (1u64 << 53) as f64;

/// Random stream bound to one bet
#[derive(Debug, Clone, Copy)]
pub struct RandomSource<'a> {
    server_seed: &'a [u8],
    client_seed: &'a str,
    nonce: u64,
}

impl<'a> RandomSource<'a> {
    pub fn new(server_seed: &'a [u8], client_seed: &'a str, nonce: u64) -> FairResult<Self> {
        if server_seed.is_empty() {
            return Err(FairnessError::InvalidSeed("server seed cannot be empty".to_string()));
        }
        if client_seed.is_empty() {
            return Err(FairnessError::InvalidSeed("client seed cannot be empty".to_string()));
        }
        Ok(Self {
            server_seed,
            client_seed,
            nonce,
        })
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Leading 53 bits of the digest at `cursor`
    pub fn raw_at(&self, cursor: u64) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(FLOAT_DOMAIN);
        // Length prefixes keep ("ab", "c") and ("a", "bc") apart
        hasher.update((self.server_seed.len() as u64).to_be_bytes());
        hasher.update(self.server_seed);
        hasher.update((self.client_seed.len() as u64).to_be_bytes());
        hasher.update(self.client_seed.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(cursor.to_be_bytes());
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head) >> 11
    }

    /// Uniform float in [0, 1) at `cursor`
    pub fn float_at(&self, cursor: u64) -> f64 {
        self.raw_at(cursor) as f64 / FLOAT_SCALE
    }

    /// First `count` floats of the stream
    pub fn floats(&self, count: usize) -> Vec<f64> {
        (0..count as u64).map(|cursor| self.float_at(cursor)).collect()
    }
}

/// `count` floats for `(server_seed, client_seed, nonce)`
pub fn next_floats(server_seed: &[u8], client_seed: &str, nonce: u64, count: usize) -> FairResult<Vec<f64>> {
    Ok(RandomSource::new(server_seed, client_seed, nonce)?.floats(count))
}

/// Map a float in [0, 1) onto `0..len`
pub fn index_from_float(float: f64, len: usize) -> usize {
    debug_assert!(len > 0);
    ((float * len as f64) as usize).min(len.saturating_sub(1))
}

/// Fisher-Yates from the last index down to 1, one float per position.
///
/// `floats[k]` drives the swap at index `len - 1 - k`.
pub fn shuffle<T>(items: &mut [T], floats: &[f64]) -> FairResult<()> {
    let swaps = items.len().saturating_sub(1);
    if floats.len() < swaps {
        return Err(FairnessError::invalid_bet(format!(
            "shuffle of {} items needs {} random values, got {}",
            items.len(),
            swaps,
            floats.len()
        )));
    }

    for (k, i) in (1..items.len()).rev().enumerate() {
        let j = index_from_float(floats[k], i + 1);
        items.swap(i, j);
    }
    Ok(())
}

/// Draw `floats.len()` distinct indices from `0..len`, in draw order
pub fn pick_without_replacement(len: usize, floats: &[f64]) -> FairResult<Vec<usize>> {
    if floats.len() > len {
        return Err(FairnessError::invalid_bet(format!(
            "cannot pick {} distinct items from {}",
            floats.len(),
            len
        )));
    }

    let mut remaining: Vec<usize> = (0..len).collect();
    Ok(floats
        .iter()
        .map(|&f| {
            let idx = index_from_float(f, remaining.len());
            remaining.remove(idx)
        })
        .collect())
}
