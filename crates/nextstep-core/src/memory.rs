//! In-memory credential store.

use std::sync::{Mutex, PoisonError};

use crate::Result;
use crate::traits::{CredentialStore, StoredSession};

/// A non-durable [`CredentialStore`] for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entry: Mutex<Option<StoredSession>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds a session.
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            entry: Mutex::new(Some(session)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn put(&self, session: &StoredSession) -> Result<()> {
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        Ok(())
    }

    fn get(&self) -> Result<Option<StoredSession>> {
        Ok(self
            .entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn clear(&self) -> Result<()> {
        self.entry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}
