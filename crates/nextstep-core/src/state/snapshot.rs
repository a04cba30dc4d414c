//! Immutable view of the session state.

use std::fmt;

use crate::tokens::{AccessToken, Credential};
use crate::types::Identity;

/// Monotonic counter identifying one credential lifetime.
///
/// Every transition that issues, clears or supersedes a credential advances
/// the generation. Requests and auth attempts remember the generation they
/// were started under; a result is applied only if it still matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The three states of the session machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionPhase {
    /// No credential.
    Anonymous,
    /// A login or register call is outstanding.
    Authenticating,
    /// Credential and identity present and not known to be invalid.
    Authenticated,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Anonymous => "anonymous",
            SessionPhase::Authenticating => "authenticating",
            SessionPhase::Authenticated => "authenticated",
        };
        f.write_str(s)
    }
}

/// A consistent snapshot of the session.
///
/// Snapshots can only be built through the phase constructors, so
/// `is_authenticated()` holds exactly when both identity and credential are
/// present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    phase: SessionPhase,
    identity: Option<Identity>,
    credential: Option<Credential>,
    generation: Generation,
    revalidated: bool,
}

impl SessionSnapshot {
    pub(crate) fn anonymous(generation: Generation) -> Self {
        Self {
            phase: SessionPhase::Anonymous,
            identity: None,
            credential: None,
            generation,
            revalidated: false,
        }
    }

    pub(crate) fn authenticating(generation: Generation) -> Self {
        Self {
            phase: SessionPhase::Authenticating,
            identity: None,
            credential: None,
            generation,
            revalidated: false,
        }
    }

    pub(crate) fn authenticated(
        generation: Generation,
        identity: Identity,
        credential: Credential,
        revalidated: bool,
    ) -> Self {
        Self {
            phase: SessionPhase::Authenticated,
            identity: Some(identity),
            credential: Some(credential),
            generation,
            revalidated,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.credential.as_ref().map(Credential::access_token)
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }

    /// True while a login or register call is outstanding.
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Authenticating
    }

    /// False for a session restored from storage until the profile has been
    /// confirmed by the service.
    pub fn is_revalidated(&self) -> bool {
        self.revalidated
    }
}
