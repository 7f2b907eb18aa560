//! Concurrent session registry.
//!
//! Sessions live behind their own mutex so bets on one session are strictly
//! ordered while different sessions resolve in parallel.

use crate::config::SeedConfig;
use crate::errors::{FairResult, FairnessError};
use crate::seed::{RotatedSeeds, SeedSession, SessionCommitment};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

struct SessionSlot {
    session: SeedSession,
    /// Set once the session has been rotated away
    retired: bool,
    /// Interactive rounds drawn from this session that have not ended
    open_rounds: Arc<AtomicUsize>,
}

/// Marks one open interactive round on a session. Rotation is refused while
/// any ticket for the session is alive; dropping the ticket closes the round.
#[derive(Debug)]
pub struct RoundTicket {
    open_rounds: Arc<AtomicUsize>,
}

impl Drop for RoundTicket {
    fn drop(&mut self) {
        self.open_rounds.fetch_sub(1, Ordering::SeqCst);
    }
}

type SharedSlot = Arc<Mutex<SessionSlot>>;

/// Thread-safe map of live seed sessions
pub struct SessionRegistry {
    sessions: DashMap<Uuid, SharedSlot>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a session and return its public view
    pub fn insert(&self, session: SeedSession) -> SessionCommitment {
        let commitment = session.commitment();
        self.sessions.insert(
            session.id(),
            Arc::new(Mutex::new(SessionSlot {
                session,
                retired: false,
                open_rounds: Arc::new(AtomicUsize::new(0)),
            })),
        );
        commitment
    }

    fn slot(&self, id: Uuid) -> FairResult<SharedSlot> {
        // Clone the Arc so the map shard is released before we block on the mutex
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(FairnessError::SessionNotFound(id))
    }

    fn lock(slot: &SharedSlot) -> MutexGuard<'_, SessionSlot> {
        // Sessions are consistent even when poisoned: the nonce moves last
        slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn commitment(&self, id: Uuid) -> FairResult<SessionCommitment> {
        self.with_session(id, |session| Ok(session.commitment()))
    }

    /// Run `f` with exclusive access to the session
    pub fn with_session<R, F>(&self, id: Uuid, f: F) -> FairResult<R>
    where
        F: FnOnce(&mut SeedSession) -> FairResult<R>,
    {
        let slot = self.slot(id)?;
        let mut guard = Self::lock(&slot);
        if guard.retired {
            return Err(FairnessError::SessionNotFound(id));
        }
        f(&mut guard.session)
    }

    /// Like `with_session`, but a successful `f` also opens a round on the
    /// session. The round stays open until the returned ticket is dropped.
    pub fn with_open_round<R, F>(&self, id: Uuid, f: F) -> FairResult<(R, RoundTicket)>
    where
        F: FnOnce(&mut SeedSession) -> FairResult<R>,
    {
        let slot = self.slot(id)?;
        let mut guard = Self::lock(&slot);
        if guard.retired {
            return Err(FairnessError::SessionNotFound(id));
        }
        let value = f(&mut guard.session)?;

        guard.open_rounds.fetch_add(1, Ordering::SeqCst);
        let ticket = RoundTicket {
            open_rounds: Arc::clone(&guard.open_rounds),
        };
        Ok((value, ticket))
    }

    /// Interactive rounds still open on `id`
    pub fn open_rounds(&self, id: Uuid) -> FairResult<usize> {
        let slot = self.slot(id)?;
        let guard = Self::lock(&slot);
        if guard.retired {
            return Err(FairnessError::SessionNotFound(id));
        }
        Ok(guard.open_rounds.load(Ordering::SeqCst))
    }

    /// Retire `id` and register its replacement.
    ///
    /// Holding the old session's lock across the swap means a bet racing the
    /// rotation either lands before it or fails with `SessionNotFound`.
    /// Refused with `RoundInProgress` while an interactive round is open.
    pub fn rotate(&self, id: Uuid, new_client_seed: Option<String>, config: &SeedConfig) -> FairResult<RotatedSeeds> {
        let slot = self.slot(id)?;
        let mut guard = Self::lock(&slot);
        if guard.retired {
            return Err(FairnessError::SessionNotFound(id));
        }
        let open = guard.open_rounds.load(Ordering::SeqCst);
        if open > 0 {
            return Err(FairnessError::RoundInProgress { session: id, open });
        }

        let rotated = guard.session.rotate(new_client_seed, config)?;
        guard.retired = true;
        self.insert(rotated.new_session.clone());
        self.sessions.remove(&id);

        Ok(rotated)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        match self.sessions.remove(&id) {
            Some((_, slot)) => {
                Self::lock(&slot).retired = true;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
