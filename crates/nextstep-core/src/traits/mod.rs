//! Core traits for credential persistence and transport events.

mod credential_store;
mod transport;

pub use credential_store::{CredentialStore, StoredSession};
pub use transport::{TransportEvent, TransportEvents, TransportListener};
