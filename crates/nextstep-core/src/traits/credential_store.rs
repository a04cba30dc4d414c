//! Durable credential persistence.

use crate::Result;
use crate::tokens::Credential;
use crate::types::Identity;

/// What the credential store holds between process restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub credential: Credential,
    /// Mirror of the session identity, used to restore the session without
    /// calling the login endpoint again.
    pub identity: Option<Identity>,
}

/// Durable key-value persistence for the bearer credential and identity.
///
/// Writes must either succeed or return an error; a store that swallows a
/// failed write lets the durable and in-memory session drift apart.
///
/// Implementations are not a secret store: values are kept unencrypted.
pub trait CredentialStore: Send + Sync {
    /// Replace the stored credential and identity wholesale.
    fn put(&self, session: &StoredSession) -> Result<()>;

    /// Returns the stored session, if any.
    fn get(&self) -> Result<Option<StoredSession>>;

    /// Remove the bearer token, refresh token and identity together.
    ///
    /// Clearing an empty store is not an error.
    fn clear(&self) -> Result<()>;
}
