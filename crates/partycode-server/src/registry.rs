//! Party code registry
//!
//! Issues codes, resolves them back to peer ids, and drops expired entries
//! lazily on every lookup. All store access goes through one mutex, so the
//! uniqueness check and insert in [`Registry::create`] and the sweep and read
//! in [`Registry::resolve`] are each atomic.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, info, warn};

use partycode_core::{
    generate_code, normalize_code, Clock, EntropySource, OsEntropy, PartyCode, SystemClock,
    CODE_LENGTH, FALLBACK_CODE_LENGTH, MAX_CODE_ATTEMPTS,
};

use crate::storage::{CodeStore, StorageError};

/// Code registry over an injected store
pub struct Registry {
    store: Mutex<Box<dyn CodeStore>>,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
}

impl Registry {
    /// Registry using the wall clock and the OS RNG
    pub fn new(store: impl CodeStore + 'static) -> Self {
        Self::with_sources(store, Arc::new(SystemClock), Arc::new(OsEntropy))
    }

    pub fn with_sources(
        store: impl CodeStore + 'static,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
    ) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
            clock,
            entropy,
        }
    }

    /// Issue a code for `peer_id`
    ///
    /// Tries up to [`MAX_CODE_ATTEMPTS`] short codes that are not held by a
    /// live entry, then falls back to a long code without checking it. A
    /// long-code collision overwrites the older entry.
    pub fn create(&self, peer_id: &str) -> Result<PartyCode, RegistryError> {
        let mut store = self.lock()?;
        let now = self.clock.now();

        let mut code = None;
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = generate_code(CODE_LENGTH, self.entropy.as_ref())?;
            if !store.contains_live(&candidate, now)? {
                code = Some(candidate);
                break;
            }
            debug!("Code collision on attempt {}: {}", attempt, candidate);
        }

        let code = match code {
            Some(code) => code,
            None => {
                warn!(
                    "No free {}-character code after {} attempts, issuing {}-character code",
                    CODE_LENGTH, MAX_CODE_ATTEMPTS, FALLBACK_CODE_LENGTH
                );
                generate_code(FALLBACK_CODE_LENGTH, self.entropy.as_ref())?
            }
        };

        let entry = PartyCode::new(code, peer_id.to_string(), now);
        store.insert(&entry)?;

        info!("Party code created: {} for peer {}", entry.code, entry.peer_id);
        Ok(entry)
    }

    /// Look up a code, case-insensitively
    ///
    /// Every call first deletes all expired entries, so an expired code is
    /// never returned. `Ok(None)` means the code is unknown or expired.
    pub fn resolve(&self, code: &str) -> Result<Option<PartyCode>, RegistryError> {
        let code = normalize_code(code);
        let mut store = self.lock()?;
        let now = self.clock.now();

        let swept = store.purge_expired(now)?;
        if swept > 0 {
            debug!("Swept {} expired party codes", swept);
        }

        let entry = store.get(&code)?;
        match &entry {
            Some(e) => debug!("Party code resolved: {} -> {}", code, e.peer_id),
            None => debug!("Party code not found: {}", code),
        }
        Ok(entry)
    }

    /// Number of stored entries
    pub fn live_count(&self) -> Result<usize, RegistryError> {
        Ok(self.lock()?.count()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Box<dyn CodeStore>>, StorageError> {
        self.store.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("entropy source failed: {0}")]
    Entropy(#[from] getrandom::Error),
}
