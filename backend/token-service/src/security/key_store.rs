//! Ephemeral key store
//!
//! Maps an email address to the secret that signed its most recent
//! verification token. One entry per subject; a new request overwrites the
//! previous secret, and a successful exchange replaces it with
//! [`VerificationSecret::Consumed`] rather than removing it. Entries are
//! never expired here: each token carries its own `exp`.
//!
//! All operations take one mutex for the duration of the map access only.
//! No signing, verification or I/O happens while it is held.
use crate::security::SigningSecret;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Stored state for one subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationSecret {
    /// Can still verify the outstanding token
    Live(SigningSecret),
    /// The token was exchanged; nothing verifies against this entry again
    Consumed,
}

#[derive(Debug, Default)]
pub struct EphemeralKeyStore {
    entries: Mutex<HashMap<String, VerificationSecret>>,
}

impl EphemeralKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the live secret for `subject`
    pub fn put(&self, subject: &str, secret: SigningSecret) {
        self.entries()
            .insert(subject.to_string(), VerificationSecret::Live(secret));
    }

    /// Current entry for `subject`, which may be the consumed marker.
    ///
    /// Read-only: consumption is recorded separately via
    /// [`mark_consumed`](Self::mark_consumed) once verification succeeded.
    pub fn lookup(&self, subject: &str) -> Option<VerificationSecret> {
        self.entries().get(subject).cloned()
    }

    /// Unconditionally overwrite the entry for `subject` with the consumed
    /// marker, returning what was stored before.
    ///
    /// Callers compare the returned value with the secret they verified
    /// against; anything other than that same live secret means another
    /// request consumed or replaced it first.
    pub fn mark_consumed(&self, subject: &str) -> Option<VerificationSecret> {
        self.entries()
            .insert(subject.to_string(), VerificationSecret::Consumed)
    }

    /// Number of subjects with an entry (live or consumed)
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, VerificationSecret>> {
        // No code path panics while holding the guard, so a poisoned map is
        // still consistent.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
