//! Session transition events and observers.

use super::snapshot::{SessionPhase, SessionSnapshot};

/// What caused a session transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// `Anonymous -> Authenticating`.
    BeginAuth,
    /// `Authenticating -> Authenticated`.
    AuthSucceeded,
    /// `Authenticating -> Anonymous`.
    AuthFailed,
    /// Explicit logout, from any non-anonymous phase.
    Logout,
    /// `Authenticated -> Anonymous`, driven by the transport layer.
    CredentialRejected,
    /// Identity replaced after a profile fetch; the phase is unchanged.
    IdentityRefreshed,
}

/// A committed transition, delivered to every [`SessionListener`].
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub cause: Transition,
    pub previous: SessionSnapshot,
    pub current: SessionSnapshot,
}

impl SessionEvent {
    /// True if the session moved into or out of `Authenticated`.
    pub fn crossed_authentication(&self) -> bool {
        self.previous.is_authenticated() != self.current.is_authenticated()
    }

    /// True if the identity id differs between the two snapshots.
    pub fn identity_changed(&self) -> bool {
        self.previous.identity().map(|i| i.id) != self.current.identity().map(|i| i.id)
    }

    /// True if this event ended a session because the service rejected it.
    pub fn is_rejection(&self) -> bool {
        self.cause == Transition::CredentialRejected
            && self.current.phase() == SessionPhase::Anonymous
    }
}

/// Synchronous observer of session transitions.
///
/// Listeners run right after the transition is committed, before the
/// operation that caused it returns. They may read the session but must not
/// block.
pub trait SessionListener: Send + Sync {
    fn on_session_event(&self, event: &SessionEvent);
}

impl<F> SessionListener for F
where
    F: Fn(&SessionEvent) + Send + Sync,
{
    fn on_session_event(&self, event: &SessionEvent) {
        self(event)
    }
}
