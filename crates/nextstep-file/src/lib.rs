//! nextstep-file - Filesystem-backed credential store.

mod credentials;
mod store;

pub use credentials::FileCredentialStore;
pub use store::FileStore;
