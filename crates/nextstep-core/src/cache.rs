//! Identity-scoped memoization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::state::{Generation, SessionEvent, SessionListener, SessionState};
use crate::types::UserId;

/// A cache of per-user values that is emptied whenever the session moves
/// into or out of `Authenticated`, or the identity changes.
///
/// Values are keyed by user id and a caller-chosen key. Inserts carry the
/// session generation the value was fetched under and are dropped if the
/// session has moved on since, so a slow response can never repopulate the
/// cache for a session that has already ended.
pub struct IdentityCache<V> {
    inner: Arc<Mutex<CacheInner<V>>>,
}

struct CacheInner<V> {
    generation: Generation,
    entries: HashMap<(UserId, String), V>,
}

impl<V: Clone + Send + 'static> IdentityCache<V> {
    /// Create a cache bound to `state`.
    pub fn attach(state: &SessionState) -> Self {
        let cache = Self {
            inner: Arc::new(Mutex::new(CacheInner {
                generation: state.generation(),
                entries: HashMap::new(),
            })),
        };
        state.add_listener(Arc::new(cache.clone()));
        cache
    }

    pub fn get(&self, user: UserId, key: &str) -> Option<V> {
        self.lock().entries.get(&(user, key.to_string())).cloned()
    }

    /// Store a value fetched under `generation`. Returns false if the value
    /// was stale and discarded.
    pub fn insert(&self, generation: Generation, user: UserId, key: &str, value: V) -> bool {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(%generation, current = %inner.generation, "Dropping stale cache insert");
            return false;
        }
        inner.entries.insert((user, key.to_string()), value);
        true
    }

    pub fn invalidate(&self) {
        self.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V> Clone for IdentityCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V: Clone + Send + 'static> SessionListener for IdentityCache<V> {
    fn on_session_event(&self, event: &SessionEvent) {
        let mut inner = self.lock();
        // Events from different threads may arrive out of order.
        let generation = event.current.generation();
        if generation < inner.generation {
            debug!(%generation, current = %inner.generation, "Ignoring out-of-order session event");
            return;
        }
        inner.generation = generation;
        if event.crossed_authentication() || event.identity_changed() {
            let dropped = inner.entries.len();
            inner.entries.clear();
            debug!(cause = ?event.cause, dropped, "Invalidated identity cache");
        }
    }
}

impl<V> std::fmt::Debug for IdentityCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("IdentityCache")
            .field("generation", &inner.generation)
            .field("entries", &inner.entries.len())
            .finish()
    }
}
