//! Session operations: login, register, profile, logout.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use nextstep_core::error::SessionError;
use nextstep_core::{
    AuthAttempt, CredentialStore, Credentials, Identity, IdentityCache, Registration, Result,
    SessionEvent, SessionSnapshot, SessionState, TransportEvents,
};

use crate::api::ApiClient;
use crate::api::endpoints::{
    self, AuthResponse, HealthStatus, LoginRequest, RegisterRequest, VersionInfo,
};
use crate::config::ClientConfig;
use crate::interceptor::Interceptor;

/// Cache key of the confirmed profile.
const PROFILE_KEY: &str = "profile";

/// Client for the NextStep session API.
///
/// Owns the [`SessionState`], the HTTP client wired to it through an
/// [`Interceptor`], and an [`IdentityCache`] of confirmed profiles. Cheap to
/// clone; clones share the same session.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use nextstep_core::Credentials;
/// use nextstep_http::{AuthClient, ClientConfig};
/// use nextstep_file::FileCredentialStore;
///
/// # async fn example() -> nextstep_core::Result<()> {
/// let store = Arc::new(FileCredentialStore::open_default()?);
/// let client = AuthClient::new(ClientConfig::from_env()?, store)?;
///
/// if !client.snapshot().is_authenticated() {
///     client.login(&Credentials::new("a@x.com", "secret")).await?;
/// }
/// let me = client.fetch_profile().await?;
/// println!("signed in as {}", me.username);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AuthClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    api: ApiClient,
    state: SessionState,
    events: TransportEvents,
    profiles: IdentityCache<Identity>,
}

impl AuthClient {
    /// Restore the session from `store` and build a client around it.
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let state = SessionState::hydrate(store)?;
        Self::with_state(config, state)
    }

    /// Build a client around an existing session.
    pub fn with_state(config: ClientConfig, state: SessionState) -> Result<Self> {
        let events = TransportEvents::new();
        events.subscribe(Arc::new(state.clone()));

        let api = ApiClient::new(&config, Interceptor::new(state.clone(), events.clone()))?;
        let profiles = IdentityCache::attach(&state);

        Ok(Self {
            inner: Arc::new(ClientInner {
                api,
                state,
                events,
                profiles,
            }),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.inner.state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Transport events raised by this client's requests.
    pub fn transport_events(&self) -> &TransportEvents {
        &self.inner.events
    }

    /// Run `hook` each time the service rejects the credential and the
    /// session is ended because of it.
    ///
    /// However many requests fail with the same credential, the hook runs
    /// once per ended session.
    pub fn on_credential_rejected<F>(&self, hook: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.inner
            .state
            .add_listener(Arc::new(move |event: &SessionEvent| {
                if event.is_rejection() {
                    hook(event);
                }
            }));
    }

    /// Exchange credentials for a session.
    ///
    /// Only legal from `Anonymous`. On failure the session returns to
    /// `Anonymous` and the error is returned unchanged.
    #[instrument(skip(self, credentials), fields(identifier = %credentials.identifier()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Identity> {
        let attempt = self.inner.state.begin_auth()?;
        let request = LoginRequest {
            email: credentials.identifier(),
            password: credentials.password(),
        };
        let outcome = self
            .inner
            .api
            .post::<_, AuthResponse>(endpoints::LOGIN, &request)
            .await;
        self.settle(attempt, outcome)
    }

    /// Create an account and start a session for it.
    ///
    /// Password confirmation is checked by the service, which reports a
    /// mismatch as a validation failure.
    #[instrument(skip(self, registration), fields(username = %registration.username()))]
    pub async fn register(&self, registration: &Registration) -> Result<Identity> {
        let attempt = self.inner.state.begin_auth()?;
        let request = RegisterRequest {
            email: registration.email(),
            username: registration.username(),
            password: registration.password(),
            confirm_password: registration.confirm_password(),
        };
        let outcome = self
            .inner
            .api
            .post::<_, AuthResponse>(endpoints::REGISTER, &request)
            .await;
        self.settle(attempt, outcome)
    }

    fn settle(&self, attempt: AuthAttempt, outcome: Result<AuthResponse>) -> Result<Identity> {
        match outcome {
            Ok(response) => {
                let (identity, credential) = response.into_parts();
                attempt.succeed(identity.clone(), credential)?;
                info!(user = %identity.id, "Authenticated");
                Ok(identity)
            }
            Err(e) => {
                debug!(error = %e, "Authentication failed");
                attempt.fail();
                Err(e)
            }
        }
    }

    /// End the session. Idempotent.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Result<()> {
        self.inner.state.logout()
    }

    /// Fetch the current user's profile and make it the session identity.
    ///
    /// A rejected credential ends the session through the interceptor. A
    /// profile that arrives after the session changed is discarded with
    /// [`SessionError::Superseded`].
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<Identity> {
        let Some((_, generation)) = self.inner.state.bearer() else {
            return Err(SessionError::NotAuthenticated.into());
        };

        let identity: Identity = self.inner.api.get(endpoints::PROFILE).await?;

        self.inner
            .state
            .identity_refreshed(generation, identity.clone())?;
        self.inner
            .profiles
            .insert(generation, identity.id, PROFILE_KEY, identity.clone());
        Ok(identity)
    }

    /// Confirm a restored session with the service.
    ///
    /// Returns `None` without a request when there is no session. A session
    /// already confirmed is returned from the cache.
    #[instrument(skip(self))]
    pub async fn revalidate(&self) -> Result<Option<Identity>> {
        let snapshot = self.snapshot();
        if !snapshot.is_authenticated() {
            return Ok(None);
        }
        if snapshot.is_revalidated() {
            if let Some(identity) = self.cached_profile() {
                return Ok(Some(identity));
            }
        }
        match self.fetch_profile().await {
            Ok(identity) => Ok(Some(identity)),
            Err(e) if e.is_auth_rejected() => {
                warn!("Restored session was rejected");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The last profile confirmed for the current identity, if any.
    pub fn cached_profile(&self) -> Option<Identity> {
        let id = self.inner.state.identity()?.id;
        self.inner.profiles.get(id, PROFILE_KEY)
    }

    /// `GET /health`.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus> {
        self.inner.api.get(endpoints::HEALTH).await
    }

    /// `GET /health/version`.
    #[instrument(skip(self))]
    pub async fn version(&self) -> Result<VersionInfo> {
        self.inner.api.get(endpoints::VERSION).await
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("base_url", self.inner.api.base_url())
            .field("state", &self.inner.state)
            .finish()
    }
}
