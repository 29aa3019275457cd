//! Session state management.
//!
//! The session manager owns identity and credential state. Identity and
//! credential are created together at login/registration, revalidated on
//! resume, and destroyed together on logout or credential invalidation -
//! they are never split.
//!
//! State transitions are broadcast on a `tokio::sync::watch` channel so the
//! basket manager and the application shell can observe them.

use std::sync::{Arc, Mutex, PoisonError};

use shopcart_core::Email;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use crate::api::{ProfilePatch, StoreApi, User};
use crate::error::ApiError;
use crate::storage::{Credential, CredentialStore};

/// The session state machine.
///
/// `Authenticating` is transient around a login/registration round trip;
/// `Failed` records the message from the last rejected attempt so it can be
/// displayed passively.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated(User),
    Failed(String),
}

impl SessionState {
    /// The identity, when authenticated.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// True when an identity is present.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Owns identity and credential state and synchronizes both with the remote
/// service and the injected credential store.
///
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<dyn StoreApi>,
    store: Arc<dyn CredentialStore>,
    credential: Mutex<Option<Credential>>,
    tx: watch::Sender<SessionState>,
}

impl SessionManager {
    /// Create a session manager.
    ///
    /// The credential store is an explicit dependency: the CLI injects a
    /// file-backed store, tests an in-memory one.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, store: Arc<dyn CredentialStore>) -> Self {
        let (tx, _) = watch::channel(SessionState::Anonymous);
        Self {
            inner: Arc::new(SessionInner {
                api,
                store,
                credential: Mutex::new(None),
                tx,
            }),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.tx.borrow().clone()
    }

    /// Current credential, if authenticated.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.lock_credential().clone()
    }

    /// Subscribe to session state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.tx.subscribe()
    }

    /// Resume a previous session from the persisted credential.
    ///
    /// Silently validates the stored credential against the remote service.
    /// Returns `true` when the session was resumed; on validation failure the
    /// credential is discarded and the session stays anonymous.
    #[instrument(skip(self))]
    pub async fn resume(&self) -> bool {
        let persisted = match self.inner.store.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted credential");
                None
            }
        };

        let Some(credential) = persisted else {
            return false;
        };

        match self.inner.api.me(&credential).await {
            Ok(user) => {
                info!(user_id = %user.id, "Session resumed");
                *self.lock_credential() = Some(credential);
                self.set_state(SessionState::Authenticated(user));
                true
            }
            Err(e) => {
                info!(error = %e, "Persisted credential rejected, discarding");
                self.purge();
                false
            }
        }
    }

    /// Log in with email and password.
    ///
    /// Transitions to `Authenticating` for the duration of the round trip.
    /// On success, identity and credential are installed together and the
    /// credential is mirrored to durable storage. On failure the state
    /// becomes `Failed` and the error is returned so the caller can react.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] before any network call if the email
    /// or password is malformed, or the remote failure otherwise.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = Email::parse(email).map_err(|e| ApiError::Validation(e.to_string()))?;
        if password.is_empty() {
            return Err(ApiError::Validation("password cannot be empty".to_string()));
        }

        self.set_state(SessionState::Authenticating);
        match self.inner.api.login(email.as_str(), password).await {
            Ok(auth) => {
                self.install(auth.credential);
                self.set_state(SessionState::Authenticated(auth.user.clone()));
                info!(user_id = %auth.user.id, "Logged in");
                Ok(auth.user)
            }
            Err(e) => {
                // A rejected attempt leaves no usable session behind; any
                // credential from a previous login is discarded with it.
                self.discard_credential();
                self.set_state(SessionState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Register a new account and log in.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] before any network call if a field is
    /// malformed, or the remote failure otherwise.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        if name.trim().is_empty() {
            return Err(ApiError::Validation("name cannot be empty".to_string()));
        }
        let email = Email::parse(email).map_err(|e| ApiError::Validation(e.to_string()))?;
        if password.is_empty() {
            return Err(ApiError::Validation("password cannot be empty".to_string()));
        }

        self.set_state(SessionState::Authenticating);
        match self.inner.api.register(name, email.as_str(), password).await {
            Ok(auth) => {
                self.install(auth.credential);
                self.set_state(SessionState::Authenticated(auth.user.clone()));
                info!(user_id = %auth.user.id, "Registered");
                Ok(auth.user)
            }
            Err(e) => {
                self.discard_credential();
                self.set_state(SessionState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Log out, clearing identity and credential from memory and storage.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.purge();
        info!("Logged out");
    }

    /// Purge the session after the remote service rejected the credential.
    ///
    /// Same effect as [`Self::logout`]; separate entry point so callers
    /// handling a `401` from any authorized call can invalidate globally.
    #[instrument(skip(self))]
    pub fn invalidate(&self) {
        if self.lock_credential().is_some() || self.state().is_authenticated() {
            info!("Credential invalidated by remote service");
        }
        self.purge();
    }

    /// Update the profile of the authenticated user.
    ///
    /// On success the identity is replaced in place; on failure the session
    /// state is left unchanged and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] when no session is active, or
    /// the remote failure otherwise.
    #[instrument(skip(self, patch))]
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<User, ApiError> {
        if !self.state().is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }
        let credential = self.credential().ok_or(ApiError::NotAuthenticated)?;

        match self.inner.api.update_profile(&credential, patch).await {
            Ok(user) => {
                self.set_state(SessionState::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                if e.is_unauthorized() {
                    self.invalidate();
                }
                Err(e)
            }
        }
    }

    fn lock_credential(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.inner
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Install a fresh credential, mirroring it to durable storage.
    fn install(&self, credential: Credential) {
        if let Err(e) = self.inner.store.store(&credential) {
            // The in-memory session is still valid; it just won't survive a restart.
            warn!(error = %e, "Failed to persist credential");
        }
        *self.lock_credential() = Some(credential);
    }

    /// Drop the credential from memory and durable storage.
    fn discard_credential(&self) {
        *self.lock_credential() = None;
        if let Err(e) = self.inner.store.clear() {
            warn!(error = %e, "Failed to clear persisted credential");
        }
    }

    /// Clear identity and credential together.
    fn purge(&self) {
        self.discard_credential();
        self.set_state(SessionState::Anonymous);
    }

    fn set_state(&self, state: SessionState) {
        self.inner.tx.send_replace(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_accessors() {
        assert!(!SessionState::Anonymous.is_authenticated());
        assert!(SessionState::Anonymous.user().is_none());
        assert!(!SessionState::Failed("nope".to_string()).is_authenticated());
    }
}
