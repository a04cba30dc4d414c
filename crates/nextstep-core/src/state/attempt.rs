//! Guard for an outstanding login or register call.

use tracing::debug;

use crate::Result;
use crate::tokens::Credential;
use crate::types::Identity;

use super::machine::SessionState;
use super::snapshot::Generation;

/// An authentication attempt started by [`SessionState::begin_auth`].
///
/// Settle it with [`succeed`](Self::succeed) or [`fail`](Self::fail). If the
/// attempt is dropped unsettled, for example because the future driving the
/// remote call was cancelled or timed out, the session returns to
/// `Anonymous`.
#[must_use = "an unsettled attempt fails when dropped"]
#[derive(Debug)]
pub struct AuthAttempt {
    state: SessionState,
    generation: Generation,
    settled: bool,
}

impl AuthAttempt {
    pub(crate) fn new(state: SessionState, generation: Generation) -> Self {
        Self {
            state,
            generation,
            settled: false,
        }
    }

    /// The generation this attempt was started under.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Commit the attempt: `Authenticating -> Authenticated`.
    pub fn succeed(mut self, identity: Identity, credential: Credential) -> Result<()> {
        self.settled = true;
        self.state.finish_auth(self.generation, identity, credential)
    }

    /// Abandon the attempt: `Authenticating -> Anonymous`.
    pub fn fail(mut self) {
        self.settled = true;
        self.state.abort_auth(self.generation);
    }
}

impl Drop for AuthAttempt {
    fn drop(&mut self) {
        if !self.settled && self.state.abort_auth(self.generation) {
            debug!(generation = %self.generation, "Unsettled auth attempt dropped");
        }
    }
}
