//! Durable [`CredentialStore`] backed by a [`FileStore`].

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::{debug, instrument, warn};

use nextstep_core::error::StorageError;
use nextstep_core::traits::{CredentialStore, StoredSession};
use nextstep_core::types::Identity;
use nextstep_core::{AccessToken, Credential, RefreshToken, Result};

use crate::store::FileStore;

/// Entry holding the bearer token.
const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Entry holding the refresh token.
const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Entry holding the identity mirror.
const IDENTITY_KEY: &str = "auth-storage.json";

/// Credential store that survives process restarts.
///
/// The bearer token, refresh token and identity are separate entries
/// written and cleared together under an exclusive lock. Values are stored
/// unencrypted with owner-only permissions; this is not a secret store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    store: FileStore,
}

impl FileCredentialStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            store: FileStore::new(root),
        }
    }

    /// Create a store in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_location()?))
    }

    /// `<data dir>/nextstep/session` on the current platform.
    pub fn default_location() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "nextstep", "nextstep").ok_or_else(|| {
            StorageError::Unavailable("could not determine data directory".to_string())
        })?;
        Ok(dirs.data_dir().join("session"))
    }

    pub fn root(&self) -> &Path {
        self.store.root()
    }

    fn read_identity(&self) -> Result<Option<Identity>> {
        let Some(content) = self.store.read(IDENTITY_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&content) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => Err(StorageError::Corrupt {
                key: IDENTITY_KEY.to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }
}

impl CredentialStore for FileCredentialStore {
    /// Every value is staged before any entry changes, so a failure while
    /// serialising or writing leaves the previous session untouched. Only
    /// the final renames can still fail part way; if one does, entries from
    /// both sessions may coexist on disk until the next `put` or `clear`.
    #[instrument(skip(self, session), fields(root = %self.store.root().display()))]
    fn put(&self, session: &StoredSession) -> Result<()> {
        let _lock = self.store.lock_exclusive()?;

        let identity = match &session.identity {
            Some(identity) => {
                let content = serde_json::to_string_pretty(identity)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Some(self.store.stage(IDENTITY_KEY, &content)?)
            }
            None => None,
        };
        let refresh = session
            .credential
            .refresh_token()
            .map(|token| self.store.stage(REFRESH_TOKEN_KEY, token.as_str()))
            .transpose()?;
        let access = self
            .store
            .stage(ACCESS_TOKEN_KEY, session.credential.access_token().as_str())?;

        match identity {
            Some(staged) => staged.commit()?,
            None => self.store.remove(IDENTITY_KEY)?,
        }
        match refresh {
            Some(staged) => staged.commit()?,
            None => self.store.remove(REFRESH_TOKEN_KEY)?,
        }
        // The access token goes last: its presence marks a complete entry.
        access.commit()?;

        debug!("Stored credential");
        Ok(())
    }

    fn get(&self) -> Result<Option<StoredSession>> {
        let _lock = self.store.lock_shared()?;

        let Some(access) = self.store.read(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };
        if access.is_empty() {
            warn!("Stored access token is empty; ignoring it");
            return Ok(None);
        }

        let refresh = self
            .store
            .read(REFRESH_TOKEN_KEY)?
            .filter(|t| !t.is_empty())
            .map(RefreshToken::new);

        Ok(Some(StoredSession {
            credential: Credential::new(AccessToken::new(access), refresh),
            identity: self.read_identity()?,
        }))
    }

    #[instrument(skip(self), fields(root = %self.store.root().display()))]
    fn clear(&self) -> Result<()> {
        let _lock = self.store.lock_exclusive()?;

        // Access token first, so an interrupted clear never leaves a
        // usable credential behind.
        self.store.remove(ACCESS_TOKEN_KEY)?;
        self.store.remove(REFRESH_TOKEN_KEY)?;
        self.store.remove(IDENTITY_KEY)?;

        debug!("Cleared stored credential");
        Ok(())
    }
}
