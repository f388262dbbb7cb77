//! Durable slot for the bearer token.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::NamedTempFile;

use crate::error::SessionError;

/// File name of the token slot.
pub const TOKEN_SLOT: &str = "jwtToken";

/// Persistent backing for `SessionStore`.
///
/// `load` returns `Ok(None)` when the slot is absent. `remove` on an absent
/// slot is a no-op.
pub trait TokenStorage: Send + Sync {
    fn load(&self) -> Result<Option<String>, SessionError>;
    fn save(&self, token: &str) -> Result<(), SessionError>;
    fn remove(&self) -> Result<(), SessionError>;
}

/// Stores the token as a single file named [`TOKEN_SLOT`] under `dir`.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    dir: PathBuf,
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(TOKEN_SLOT);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, source: io::Error) -> SessionError {
        SessionError::Storage {
            path: self.path.clone(),
            source,
        }
    }

    /// Write `token` to a uniquely named file beside the slot, then rename it
    /// over the slot. On unix the temp file is created with mode 0600.
    fn write_atomic(&self, token: &str) -> io::Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(token.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        fs::create_dir_all(&self.dir).map_err(|e| self.storage_error(e))?;

        // Readers see the old or new token, never a partial one. The temp
        // file is removed on drop if the rename does not happen.
        self.write_atomic(token).map_err(|e| self.storage_error(e))?;

        tracing::trace!(path = %self.path.display(), "token slot written");
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error(e)),
        }
    }
}

/// In-process slot. Clones share the same slot, so a second `SessionStore`
/// opened over a clone observes what the first one persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStorage {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot that already holds `token`, as if persisted by an earlier run.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
