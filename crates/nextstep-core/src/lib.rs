//! nextstep-core - Session types, state machine and traits.
//!
//! This crate holds everything in the NextStep client session layer that
//! does not touch the network or the filesystem: the credential and identity
//! types, the [`SessionState`] machine, the [`CredentialStore`] contract and
//! the [`TransportEvents`] seam the HTTP layer reports rejections through.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nextstep_core::{MemoryCredentialStore, SessionPhase, SessionState};
//!
//! let state = SessionState::hydrate(Arc::new(MemoryCredentialStore::new())).unwrap();
//! assert_eq!(state.phase(), SessionPhase::Anonymous);
//!
//! // Logging out an anonymous session is a no-op.
//! state.logout().unwrap();
//! ```

pub mod cache;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod memory;
pub mod state;
pub mod tokens;
pub mod traits;
pub mod types;

pub use cache::IdentityCache;
pub use credentials::{Credentials, Registration};
pub use envelope::ApiEnvelope;
pub use error::Error;
pub use memory::MemoryCredentialStore;
pub use state::{
    AuthAttempt, Generation, SessionEvent, SessionListener, SessionPhase, SessionSnapshot,
    SessionState, Transition,
};
pub use tokens::{AccessToken, Credential, RefreshToken};
pub use traits::{CredentialStore, StoredSession, TransportEvent, TransportEvents, TransportListener};
pub use types::{ApiUrl, Identity, Role, UserId};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
