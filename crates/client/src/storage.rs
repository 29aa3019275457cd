//! Credential persistence.
//!
//! The bearer credential survives process restarts so a new invocation can
//! silently resume the previous session. Storage is an explicit dependency
//! injected into [`SessionManager`](crate::SessionManager) at construction;
//! there is no process-wide singleton.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// An opaque bearer token proving an authenticated session.
///
/// At most one valid value exists at a time; absence means anonymous.
/// Wraps [`SecretString`] so the token is redacted from debug output.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Create a credential from a raw token string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Expose the raw token for use in an `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Errors that can occur when reading or writing persisted credentials.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("credential storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable storage for the bearer credential.
///
/// Write on set, delete on clear; a load returning `None` means anonymous.
/// Access is synchronous and happens on every credential state change.
pub trait CredentialStore: Send + Sync {
    /// Load the persisted credential, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<Credential>, StorageError>;

    /// Persist the credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn store(&self, credential: &Credential) -> Result<(), StorageError>;

    /// Delete the persisted credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// File-backed credential store.
///
/// The token is written as plain text to a single file, created (with parent
/// directories) on first store. Used by the CLI so sessions resume across
/// invocations.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path of the backing file.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Credential::new(token)))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, credential: &Credential) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, credential.expose())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory credential store for tests and embedding.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with a token, as if persisted by a
    /// previous session.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, StorageError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .as_deref()
            .map(Credential::new))
    }

    fn store(&self, credential: &Credential) -> Result<(), StorageError> {
        *self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) =
            Some(credential.expose().to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self
            .token
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}
