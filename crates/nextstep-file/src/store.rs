//! Small locked key-value store on the filesystem.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use fs2::FileExt;
use tracing::{instrument, trace};
use uuid::Uuid;

use nextstep_core::Result;
use nextstep_core::error::StorageError;

const LOCK_FILE: &str = ".lock";

/// Attempts to take the lock before reporting the store as unavailable.
const LOCK_ATTEMPTS: u32 = 5;

/// Pause between lock attempts.
const LOCK_RETRY: Duration = Duration::from_millis(10);

/// One file per key under a root directory.
///
/// Writes go to a temporary file that is renamed over the entry, so a
/// reader never sees a half-written value. A lock file serialises access
/// from several processes sharing one installation.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

/// Held while a batch of reads or writes runs; released on drop.
pub(crate) struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// A value flushed to a temporary file, waiting to replace its entry.
///
/// Dropping it uncommitted removes the temporary file.
pub(crate) struct StagedEntry {
    temp: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl StagedEntry {
    /// Rename the staged file over the entry.
    pub(crate) fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp, &self.path).map_err(StorageError::from)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedEntry {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp);
        }
    }
}

impl FileStore {
    /// Create a new file store at the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root directory path.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn open_lock(&self) -> Result<File> {
        fs::create_dir_all(&self.root).map_err(StorageError::from)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.root.join(LOCK_FILE))
            .map_err(StorageError::from)?;
        Ok(file)
    }

    /// Take the store lock exclusively, for writers.
    pub(crate) fn lock_exclusive(&self) -> Result<StoreLock> {
        self.acquire(true)
    }

    /// Take the store lock shared, for readers.
    pub(crate) fn lock_shared(&self) -> Result<StoreLock> {
        self.acquire(false)
    }

    /// Callers hold the session state lock, so this never waits on another
    /// process for more than a few short retries.
    fn acquire(&self, exclusive: bool) -> Result<StoreLock> {
        let file = self.open_lock()?;
        let contended = fs2::lock_contended_error().raw_os_error();

        for attempt in 1..=LOCK_ATTEMPTS {
            let result = if exclusive {
                FileExt::try_lock_exclusive(&file)
            } else {
                FileExt::try_lock_shared(&file)
            };
            match result {
                Ok(()) => return Ok(StoreLock { file }),
                Err(e) if e.raw_os_error() == contended => {
                    trace!(attempt, exclusive, "Store lock is busy");
                    if attempt < LOCK_ATTEMPTS {
                        thread::sleep(LOCK_RETRY);
                    }
                }
                Err(e) => return Err(StorageError::from(e).into()),
            }
        }

        Err(StorageError::Unavailable(format!(
            "{} is locked by another process",
            self.root.display()
        ))
        .into())
    }

    /// Read an entry. A missing entry is `None`, not an error.
    pub fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.entry_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from(e).into()),
        }
    }

    /// Replace an entry atomically and flush it to disk.
    #[instrument(skip(self, value))]
    pub fn write(&self, key: &str, value: &str) -> Result<()> {
        self.stage(key, value)?.commit()?;
        trace!(key, "Wrote store entry");
        Ok(())
    }

    /// Write `value` to a temporary file next to the entry without making
    /// it visible. The entry changes only when the result is committed.
    pub(crate) fn stage(&self, key: &str, value: &str) -> Result<StagedEntry> {
        fs::create_dir_all(&self.root).map_err(StorageError::from)?;

        let staged = StagedEntry {
            temp: self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4())),
            path: self.entry_path(key),
            committed: false,
        };
        let mut file = File::create(&staged.temp).map_err(StorageError::from)?;
        restrict_permissions(&file)?;
        file.write_all(value.as_bytes()).map_err(StorageError::from)?;
        file.sync_data().map_err(StorageError::from)?;
        Ok(staged)
    }

    /// Remove an entry. Removing a missing entry is not an error.
    #[instrument(skip(self))]
    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from(e).into()),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
        .map_err(StorageError::from)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &File) -> Result<()> {
    Ok(())
}
