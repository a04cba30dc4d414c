//! The session state container.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{Error, SessionError, StorageError};
use crate::tokens::{AccessToken, Credential};
use crate::traits::{CredentialStore, StoredSession, TransportEvent, TransportListener};
use crate::types::Identity;
use crate::Result;

use super::attempt::AuthAttempt;
use super::listener::{SessionEvent, SessionListener, Transition};
use super::snapshot::{Generation, SessionPhase, SessionSnapshot};

/// The durable half of a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DurableWrite {
    /// Leave the credential store untouched.
    Keep,
    /// Replace the stored session.
    Put(StoredSession),
    /// Remove everything from the credential store.
    Clear,
}

/// One unit of work: the next snapshot and the store write that pairs with it.
///
/// The write runs first; the snapshot is committed only if it succeeds,
/// unless the plan is `forced`, in which case a failed write is logged and
/// the snapshot is committed anyway.
#[derive(Debug)]
struct Plan {
    cause: Transition,
    next: Option<SessionSnapshot>,
    write: DurableWrite,
    forced: bool,
}

/// Authoritative in-memory session state.
///
/// All reads and writes are short synchronous critical sections; nothing is
/// awaited while the state lock is held. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct SessionState {
    inner: Arc<StateInner>,
}

struct StateInner {
    current: Mutex<SessionSnapshot>,
    store: Arc<dyn CredentialStore>,
    watch: watch::Sender<SessionSnapshot>,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
}

impl SessionState {
    /// Build the initial state from the credential store.
    ///
    /// A stored credential with a stored identity restores an
    /// `Authenticated` session that is not yet revalidated. A credential
    /// without an identity cannot satisfy the session invariant, and a
    /// corrupt entry cannot be read back at all; both are cleared and the
    /// session starts anonymous.
    pub fn hydrate(store: Arc<dyn CredentialStore>) -> Result<Self> {
        let initial = Generation::default();
        let stored = match store.get() {
            Err(Error::Storage(StorageError::Corrupt { key, reason })) => {
                warn!(%key, %reason, "Stored session is corrupt; discarding it");
                store.clear()?;
                None
            }
            other => other?,
        };
        let snapshot = match stored {
            Some(StoredSession {
                credential,
                identity: Some(identity),
            }) => {
                info!(user = %identity.id, "Restored persisted session");
                SessionSnapshot::authenticated(initial.next(), identity, credential, false)
            }
            Some(StoredSession { identity: None, .. }) => {
                warn!("Stored credential has no identity; discarding it");
                store.clear()?;
                SessionSnapshot::anonymous(initial)
            }
            None => SessionSnapshot::anonymous(initial),
        };
        Ok(Self::with_snapshot(store, snapshot))
    }

    /// Build an anonymous state without reading the store.
    pub fn anonymous(store: Arc<dyn CredentialStore>) -> Self {
        Self::with_snapshot(store, SessionSnapshot::anonymous(Generation::default()))
    }

    fn with_snapshot(store: Arc<dyn CredentialStore>, snapshot: SessionSnapshot) -> Self {
        let (watch, _) = watch::channel(snapshot.clone());
        Self {
            inner: Arc::new(StateInner {
                current: Mutex::new(snapshot),
                store,
                watch,
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Returns a copy of the current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.lock().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity().cloned()
    }

    pub fn generation(&self) -> Generation {
        self.lock().generation()
    }

    /// The bearer token to attach to an outbound request, together with the
    /// generation it belongs to.
    pub fn bearer(&self) -> Option<(AccessToken, Generation)> {
        let current = self.lock();
        current
            .access_token()
            .map(|token| (token.clone(), current.generation()))
    }

    /// Subscribe to snapshots. The receiver always sees whole snapshots,
    /// never a half-applied transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.watch.subscribe()
    }

    /// Register a synchronous transition listener.
    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// `Anonymous -> Authenticating`.
    ///
    /// The returned attempt must be settled with `succeed` or `fail`;
    /// dropping it unsettled counts as a failure.
    pub fn begin_auth(&self) -> Result<AuthAttempt> {
        let event = self.commit(|current| match current.phase() {
            SessionPhase::Anonymous => Ok(Some(Plan {
                cause: Transition::BeginAuth,
                next: Some(SessionSnapshot::authenticating(current.generation().next())),
                write: DurableWrite::Keep,
                forced: false,
            })),
            SessionPhase::Authenticating => Err(SessionError::AuthInProgress.into()),
            SessionPhase::Authenticated => Err(SessionError::AlreadyAuthenticated.into()),
        })?;

        let generation = event
            .map(|e| e.current.generation())
            .unwrap_or_else(|| self.generation());
        Ok(AuthAttempt::new(self.clone(), generation))
    }

    /// `Authenticating -> Authenticated`, writing through to the store.
    ///
    /// Fails with [`SessionError::Superseded`] if the attempt is no longer
    /// the current one. If the store write fails the attempt is abandoned
    /// and the session returns to anonymous.
    pub(crate) fn finish_auth(
        &self,
        generation: Generation,
        identity: Identity,
        credential: Credential,
    ) -> Result<()> {
        let result = self.commit(move |current| {
            if current.phase() != SessionPhase::Authenticating
                || current.generation() != generation
            {
                return Err(SessionError::Superseded.into());
            }
            let stored = StoredSession {
                credential: credential.clone(),
                identity: Some(identity.clone()),
            };
            Ok(Some(Plan {
                cause: Transition::AuthSucceeded,
                next: Some(SessionSnapshot::authenticated(
                    generation.next(),
                    identity,
                    credential,
                    true,
                )),
                write: DurableWrite::Put(stored),
                forced: false,
            }))
        });

        match result {
            Ok(_) => Ok(()),
            Err(Error::Storage(e)) => {
                self.abort_auth(generation);
                Err(Error::Storage(e))
            }
            Err(e) => {
                warn!(%generation, "Discarding stale authentication result");
                Err(e)
            }
        }
    }

    /// `Authenticating -> Anonymous`, with no store write. Returns whether
    /// the attempt was still current.
    pub(crate) fn abort_auth(&self, generation: Generation) -> bool {
        let result = self.commit(|current| {
            if current.phase() != SessionPhase::Authenticating
                || current.generation() != generation
            {
                return Ok(None);
            }
            Ok(Some(Plan {
                cause: Transition::AuthFailed,
                next: Some(SessionSnapshot::anonymous(generation.next())),
                write: DurableWrite::Keep,
                forced: false,
            }))
        });
        matches!(result, Ok(Some(_)))
    }

    /// Return to `Anonymous` and clear the credential store.
    ///
    /// Local-only and idempotent: logging out an anonymous session still
    /// clears the store but emits no event. If the store cannot be cleared
    /// the session is left as it was and the error is returned.
    pub fn logout(&self) -> Result<()> {
        let event = self.commit(|current| {
            let next = match current.phase() {
                SessionPhase::Anonymous => None,
                _ => Some(SessionSnapshot::anonymous(current.generation().next())),
            };
            Ok(Some(Plan {
                cause: Transition::Logout,
                next,
                write: DurableWrite::Clear,
                forced: false,
            }))
        })?;
        if event.is_some() {
            info!("Logged out");
        }
        Ok(())
    }

    /// `Authenticated -> Anonymous` after the service rejected the
    /// credential of `generation`.
    ///
    /// Applied at most once per generation: later rejections of the same
    /// credential, and rejections of an already replaced credential, are
    /// ignored. Returns whether this call performed the transition.
    pub fn credential_rejected(&self, generation: Generation) -> bool {
        let result = self.commit(|current| {
            if current.phase() != SessionPhase::Authenticated
                || current.generation() != generation
            {
                return Ok(None);
            }
            Ok(Some(Plan {
                cause: Transition::CredentialRejected,
                next: Some(SessionSnapshot::anonymous(generation.next())),
                write: DurableWrite::Clear,
                forced: true,
            }))
        });
        match result {
            Ok(Some(_)) => {
                info!(%generation, "Credential rejected; session ended");
                true
            }
            Ok(None) => {
                debug!(%generation, "Ignoring rejection of a superseded credential");
                false
            }
            Err(e) => {
                error!(error = %e, "Failed to apply credential rejection");
                false
            }
        }
    }

    /// Replace the identity of the current session after a profile fetch.
    ///
    /// Fails with [`SessionError::Superseded`] if the session changed since
    /// the fetch was issued.
    pub fn identity_refreshed(&self, generation: Generation, identity: Identity) -> Result<()> {
        self.commit(move |current| {
            let credential = match (current.phase(), current.credential()) {
                (SessionPhase::Authenticated, Some(c)) if current.generation() == generation => {
                    c.clone()
                }
                _ => return Err(SessionError::Superseded.into()),
            };
            let stored = StoredSession {
                credential: credential.clone(),
                identity: Some(identity.clone()),
            };
            Ok(Some(Plan {
                cause: Transition::IdentityRefreshed,
                next: Some(SessionSnapshot::authenticated(
                    generation, identity, credential, true,
                )),
                write: DurableWrite::Put(stored),
                forced: false,
            }))
        })?;
        Ok(())
    }

    /// Run one transition: decide, write durably, commit, notify.
    ///
    /// The snapshot and watch channel are updated under the state lock, so
    /// they always see transitions in order. Listeners run after the lock is
    /// released; two transitions committed on different threads may reach
    /// them in either order, so listeners must not assume `event.current`
    /// is the latest state.
    fn commit<F>(&self, decide: F) -> Result<Option<SessionEvent>>
    where
        F: FnOnce(&SessionSnapshot) -> Result<Option<Plan>>,
    {
        let event = {
            let mut current = self.lock();
            let Some(plan) = decide(&*current)? else {
                return Ok(None);
            };

            if let Err(e) = self.write_durable(&plan.write) {
                if !plan.forced {
                    return Err(e);
                }
                error!(error = %e, cause = ?plan.cause, "Credential store write failed");
            }

            let Some(next) = plan.next else {
                return Ok(None);
            };

            let previous = std::mem::replace(&mut *current, next.clone());
            self.inner.watch.send_replace(next.clone());
            debug!(
                cause = ?plan.cause,
                from = %previous.phase(),
                to = %next.phase(),
                generation = %next.generation(),
                "Session transition"
            );
            SessionEvent {
                cause: plan.cause,
                previous,
                current: next,
            }
        };

        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.on_session_event(&event);
        }

        Ok(Some(event))
    }

    fn write_durable(&self, write: &DurableWrite) -> Result<()> {
        match write {
            DurableWrite::Keep => Ok(()),
            DurableWrite::Put(session) => self.inner.store.put(session),
            DurableWrite::Clear => self.inner.store.clear(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionSnapshot> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransportListener for SessionState {
    fn on_transport_event(&self, event: &TransportEvent) {
        match *event {
            TransportEvent::CredentialRejected { generation } => {
                self.credential_rejected(generation);
            }
        }
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let current = self.lock();
        f.debug_struct("SessionState")
            .field("phase", &current.phase())
            .field("generation", &current.generation())
            .field("user", &current.identity().map(|i| i.id))
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryCredentialStore;
    use crate::tokens::{AccessToken, RefreshToken};
    use crate::types::{Role, UserId};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn identity(id: i64) -> Identity {
        let ts = chrono::NaiveDateTime::parse_from_str("2024-01-01T00:00:00", "%Y-%m-%dT%H:%M:%S")
            .unwrap();
        Identity {
            id: UserId(id),
            email: format!("user{id}@x.com"),
            username: format!("user{id}"),
            role: Role::User,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn credential(token: &str) -> Credential {
        Credential::new(AccessToken::new(token), Some(RefreshToken::new("r")))
    }

    /// Store whose writes can be switched to fail.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryCredentialStore,
        fail: AtomicBool,
        clears: AtomicUsize,
    }

    impl FlakyStore {
        fn check(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                Err(crate::error::StorageError::Unavailable("disk full".into()).into())
            } else {
                Ok(())
            }
        }
    }

    impl CredentialStore for FlakyStore {
        fn put(&self, session: &StoredSession) -> Result<()> {
            self.check()?;
            self.inner.put(session)
        }

        fn get(&self) -> Result<Option<StoredSession>> {
            self.inner.get()
        }

        fn clear(&self) -> Result<()> {
            self.check()?;
            self.clears.fetch_add(1, Ordering::SeqCst);
            self.inner.clear()
        }
    }

    fn logged_in(store: Arc<dyn CredentialStore>) -> SessionState {
        let state = SessionState::anonymous(store);
        state
            .begin_auth()
            .unwrap()
            .succeed(identity(1), credential("t1"))
            .unwrap();
        state
    }

    #[test]
    fn login_transitions_and_persists() {
        let store = Arc::new(MemoryCredentialStore::new());
        let state = SessionState::anonymous(store.clone());

        let attempt = state.begin_auth().unwrap();
        assert_eq!(state.phase(), SessionPhase::Authenticating);
        assert!(state.snapshot().is_loading());

        attempt.succeed(identity(1), credential("t1")).unwrap();

        let snapshot = state.snapshot();
        assert!(snapshot.is_authenticated());
        assert!(!snapshot.is_loading());
        assert_eq!(snapshot.identity().unwrap().id, UserId(1));
        let stored = store.get().unwrap().unwrap();
        assert_eq!(stored.credential.access_token().as_str(), "t1");
        assert_eq!(stored.identity.unwrap().id, UserId(1));
    }

    #[test]
    fn failed_auth_returns_to_anonymous_without_write() {
        let store = Arc::new(MemoryCredentialStore::new());
        let state = SessionState::anonymous(store.clone());

        state.begin_auth().unwrap().fail();

        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn dropped_attempt_counts_as_failure() {
        let state = SessionState::anonymous(Arc::new(MemoryCredentialStore::new()));
        {
            let _attempt = state.begin_auth().unwrap();
            assert_eq!(state.phase(), SessionPhase::Authenticating);
        }
        assert_eq!(state.phase(), SessionPhase::Anonymous);
    }

    #[test]
    fn begin_auth_requires_anonymous() {
        let state = SessionState::anonymous(Arc::new(MemoryCredentialStore::new()));
        let _attempt = state.begin_auth().unwrap();
        assert!(matches!(
            state.begin_auth(),
            Err(Error::Session(SessionError::AuthInProgress))
        ));

        let state = logged_in(Arc::new(MemoryCredentialStore::new()));
        assert!(matches!(
            state.begin_auth(),
            Err(Error::Session(SessionError::AlreadyAuthenticated))
        ));
    }

    #[test]
    fn logout_is_idempotent_and_always_clears_store() {
        let store = Arc::new(FlakyStore::default());
        let state = logged_in(store.clone());

        state.logout().unwrap();
        state.logout().unwrap();

        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(store.get().unwrap().is_none());
        assert_eq!(store.clears.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn logout_during_auth_supersedes_attempt() {
        let store = Arc::new(MemoryCredentialStore::new());
        let state = SessionState::anonymous(store.clone());

        let attempt = state.begin_auth().unwrap();
        state.logout().unwrap();

        let result = attempt.succeed(identity(1), credential("late"));
        assert!(matches!(
            result,
            Err(Error::Session(SessionError::Superseded))
        ));
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn rejection_applies_once_per_generation() {
        let store = Arc::new(FlakyStore::default());
        let state = logged_in(store.clone());
        let rejections = Arc::new(AtomicUsize::new(0));
        {
            let rejections = rejections.clone();
            state.add_listener(Arc::new(move |event: &SessionEvent| {
                if event.is_rejection() {
                    rejections.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }

        let (_, generation) = state.bearer().unwrap();
        assert!(state.credential_rejected(generation));
        assert!(!state.credential_rejected(generation));

        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(store.get().unwrap().is_none());
        assert_eq!(store.clears.load(Ordering::SeqCst), 1);
        assert_eq!(rejections.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejection_of_old_credential_does_not_end_new_session() {
        let state = logged_in(Arc::new(MemoryCredentialStore::new()));
        let (_, old) = state.bearer().unwrap();
        state.logout().unwrap();
        state
            .begin_auth()
            .unwrap()
            .succeed(identity(2), credential("t2"))
            .unwrap();

        assert!(!state.credential_rejected(old));
        assert!(state.is_authenticated());
    }

    #[test]
    fn rejection_is_forced_even_if_store_clear_fails() {
        let store = Arc::new(FlakyStore::default());
        let state = logged_in(store.clone());
        store.fail.store(true, Ordering::SeqCst);

        let (_, generation) = state.bearer().unwrap();
        assert!(state.credential_rejected(generation));
        assert!(!state.is_authenticated());
    }

    #[test]
    fn failed_logout_write_keeps_state_consistent() {
        let store = Arc::new(FlakyStore::default());
        let state = logged_in(store.clone());
        store.fail.store(true, Ordering::SeqCst);

        assert!(matches!(state.logout(), Err(Error::Storage(_))));
        assert!(state.is_authenticated());
        assert!(store.get().unwrap().is_some());
    }

    #[test]
    fn failed_login_write_returns_to_anonymous() {
        let store = Arc::new(FlakyStore::default());
        store.fail.store(true, Ordering::SeqCst);
        let state = SessionState::anonymous(store.clone());

        let result = state
            .begin_auth()
            .unwrap()
            .succeed(identity(1), credential("t1"));

        assert!(matches!(result, Err(Error::Storage(_))));
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(store.get().unwrap().is_none());
    }

    #[test]
    fn hydrate_restores_unrevalidated_session() {
        let store = Arc::new(MemoryCredentialStore::with_session(StoredSession {
            credential: credential("t1"),
            identity: Some(identity(1)),
        }));

        let state = SessionState::hydrate(store).unwrap();
        let snapshot = state.snapshot();
        assert!(snapshot.is_authenticated());
        assert!(!snapshot.is_revalidated());
        assert_eq!(snapshot.access_token().unwrap().as_str(), "t1");
    }

    #[test]
    fn hydrate_discards_credential_without_identity() {
        let store = Arc::new(MemoryCredentialStore::with_session(StoredSession {
            credential: credential("t1"),
            identity: None,
        }));

        let state = SessionState::hydrate(store.clone()).unwrap();
        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(store.get().unwrap().is_none());
    }

    /// Store whose entry cannot be decoded until it is cleared.
    #[derive(Default)]
    struct CorruptStore {
        cleared: AtomicBool,
    }

    impl CredentialStore for CorruptStore {
        fn put(&self, _: &StoredSession) -> Result<()> {
            Ok(())
        }

        fn get(&self) -> Result<Option<StoredSession>> {
            if self.cleared.load(Ordering::SeqCst) {
                return Ok(None);
            }
            Err(crate::error::StorageError::Corrupt {
                key: "auth-storage.json".into(),
                reason: "expected value at line 1 column 2".into(),
            }
            .into())
        }

        fn clear(&self) -> Result<()> {
            self.cleared.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn hydrate_discards_corrupt_entry() {
        let store = Arc::new(CorruptStore::default());

        let state = SessionState::hydrate(store.clone()).unwrap();

        assert_eq!(state.phase(), SessionPhase::Anonymous);
        assert!(store.cleared.load(Ordering::SeqCst));
        assert!(SessionState::hydrate(store).is_ok());
    }

    #[test]
    fn hydration_is_the_initial_state_not_an_event() {
        let store = Arc::new(MemoryCredentialStore::with_session(StoredSession {
            credential: credential("t1"),
            identity: Some(identity(1)),
        }));
        let state = SessionState::hydrate(store).unwrap();
        let hydrated = state.snapshot();

        let causes = Arc::new(Mutex::new(Vec::new()));
        {
            let causes = causes.clone();
            state.add_listener(Arc::new(move |event: &SessionEvent| {
                causes.lock().unwrap().push((event.cause, event.previous.clone()));
            }));
        }
        state.logout().unwrap();

        let causes = causes.lock().unwrap();
        assert_eq!(causes.len(), 1);
        assert_eq!(causes[0].0, Transition::Logout);
        assert_eq!(causes[0].1, hydrated);
    }

    #[test]
    fn hydrate_still_reports_other_storage_errors() {
        struct Unreadable;

        impl CredentialStore for Unreadable {
            fn put(&self, _: &StoredSession) -> Result<()> {
                Ok(())
            }

            fn get(&self) -> Result<Option<StoredSession>> {
                Err(crate::error::StorageError::Unavailable("locked".into()).into())
            }

            fn clear(&self) -> Result<()> {
                Ok(())
            }
        }

        assert!(matches!(
            SessionState::hydrate(Arc::new(Unreadable)),
            Err(Error::Storage(StorageError::Unavailable(_)))
        ));
    }

    #[test]
    fn identity_refresh_marks_revalidated_and_mirrors() {
        let store = Arc::new(MemoryCredentialStore::with_session(StoredSession {
            credential: credential("t1"),
            identity: Some(identity(1)),
        }));
        let state = SessionState::hydrate(store.clone()).unwrap();
        let generation = state.generation();

        let mut updated = identity(1);
        updated.role = Role::Premium;
        state.identity_refreshed(generation, updated).unwrap();

        assert!(state.snapshot().is_revalidated());
        assert_eq!(state.identity().unwrap().role, Role::Premium);
        assert_eq!(store.get().unwrap().unwrap().identity.unwrap().role, Role::Premium);
        assert_eq!(state.generation(), generation);
    }

    #[test]
    fn stale_identity_refresh_does_not_resurrect_session() {
        let state = logged_in(Arc::new(MemoryCredentialStore::new()));
        let generation = state.generation();
        state.logout().unwrap();

        let result = state.identity_refreshed(generation, identity(1));
        assert!(matches!(
            result,
            Err(Error::Session(SessionError::Superseded))
        ));
        assert_eq!(state.phase(), SessionPhase::Anonymous);
    }

    #[test]
    fn watchers_see_whole_snapshots() {
        let state = SessionState::anonymous(Arc::new(MemoryCredentialStore::new()));
        let mut rx = state.subscribe();

        state
            .begin_auth()
            .unwrap()
            .succeed(identity(1), credential("t1"))
            .unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert!(seen.is_authenticated());
        assert!(seen.identity().is_some());
        assert!(seen.credential().is_some());
    }

    #[test]
    fn transport_rejection_event_drives_state() {
        let state = logged_in(Arc::new(MemoryCredentialStore::new()));
        let events = crate::traits::TransportEvents::new();
        events.subscribe(Arc::new(state.clone()));

        let (_, generation) = state.bearer().unwrap();
        events.emit(TransportEvent::CredentialRejected { generation });

        assert_eq!(state.phase(), SessionPhase::Anonymous);
    }

    #[test]
    fn debug_hides_credential() {
        let state = logged_in(Arc::new(MemoryCredentialStore::new()));
        let debug = format!("{:?}", state);
        assert!(!debug.contains("t1"));
        assert!(debug.contains("[REDACTED]"));
    }
}
