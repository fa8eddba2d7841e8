//! Credential persistence across process restarts.
//!
//! The persisted layout is one JSON document holding the bearer token and a
//! display-only copy of the user, written together and removed together.
//! Only the token is trusted after a restart; the user record is re-fetched
//! during session restore.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::User;

/// Errors that can occur reading or writing the credential store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("credential storage I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stored document is not valid JSON for the expected shape.
    #[error("credential storage is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Credentials at rest: the token plus the cached user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCredentials {
    pub token: String,
    pub user: User,
}

/// Where session credentials live between runs.
///
/// Implementations must make `store` atomic with respect to readers: a
/// concurrent `load` sees either the previous document or the new one, never
/// a torn write.
pub trait CredentialStore: Send + Sync {
    /// Read the persisted credentials, if any.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store exists but cannot be read or
    /// parsed.
    fn load(&self) -> Result<Option<PersistedCredentials>, StorageError>;

    /// Persist credentials, replacing any previous document.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the document cannot be written.
    fn store(&self, credentials: &PersistedCredentials) -> Result<(), StorageError>;

    /// Remove the persisted credentials. Removing an empty store is fine.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the document exists and cannot be
    /// removed.
    fn clear(&self) -> Result<(), StorageError>;
}

/// JSON-file credential store.
///
/// Writes go to a sibling temp file first and are renamed into place, so the
/// document on disk is always either the old one or the new one.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<PersistedCredentials>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn store(&self, credentials: &PersistedCredentials) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, serde_json::to_vec_pretty(credentials)?)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory credential store for tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<PersistedCredentials>>,
}

impl MemoryCredentialStore {
    fn lock(&self) -> MutexGuard<'_, Option<PersistedCredentials>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<PersistedCredentials>, StorageError> {
        Ok(self.lock().clone())
    }

    fn store(&self, credentials: &PersistedCredentials) -> Result<(), StorageError> {
        *self.lock() = Some(credentials.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.lock() = None;
        Ok(())
    }
}
