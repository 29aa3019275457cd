//! Basket state management.
//!
//! The basket manager mirrors the server-tracked cart. There is no local or
//! optimistic mutation: every operation sends the change to the remote
//! service and replaces the whole basket from its response, so client and
//! server cannot diverge. A failed mutation leaves the previous contents
//! untouched.
//!
//! Mutations are serialized through an internal async mutex held across the
//! round trip, so overlapping calls cannot overwrite each other's results
//! out of order.

use std::sync::{Arc, Mutex, PoisonError};

use shopcart_core::ProductId;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, instrument};

use crate::api::{Cart, StoreApi};
use crate::error::ApiError;
use crate::session::{SessionManager, SessionState};
use crate::storage::Credential;

/// The client-side view of the server-tracked cart.
pub type Basket = Cart;

#[derive(Default)]
struct BasketState {
    basket: Basket,
    error: Option<String>,
}

/// Owns the authenticated user's list of priced line items.
///
/// Depends on the [`SessionManager`] for the credential that authorizes its
/// requests; operations short-circuit locally when the session is anonymous.
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct BasketManager {
    inner: Arc<BasketInner>,
}

struct BasketInner {
    api: Arc<dyn StoreApi>,
    session: SessionManager,
    state: Mutex<BasketState>,
    /// Serializes basket round trips so a slow response cannot overwrite a
    /// newer one.
    mutation_lock: AsyncMutex<()>,
}

impl BasketManager {
    /// Create a basket manager bound to a session.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, session: SessionManager) -> Self {
        Self {
            inner: Arc::new(BasketInner {
                api,
                session,
                state: Mutex::new(BasketState::default()),
                mutation_lock: AsyncMutex::new(()),
            }),
        }
    }

    /// Current basket contents.
    #[must_use]
    pub fn snapshot(&self) -> Basket {
        self.lock_state().basket.clone()
    }

    /// Last recorded error, for passive display.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock_state().error.clone()
    }

    /// Clear the recorded error.
    pub fn clear_error(&self) {
        self.lock_state().error = None;
    }

    /// Fetch the current basket from the remote service.
    ///
    /// No-op while anonymous.
    ///
    /// # Errors
    ///
    /// Returns the remote failure; the previous basket is left unchanged.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<(), ApiError> {
        let Some(credential) = self.credential() else {
            return Ok(());
        };

        let _guard = self.inner.mutation_lock.lock().await;
        match self.inner.api.cart(&credential).await {
            Ok(cart) => {
                self.apply(cart);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Add `quantity` units of a product to the basket.
    ///
    /// While anonymous this records a local error and performs no network
    /// call.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotAuthenticated`] while anonymous, or the remote
    /// failure; the previous basket is left unchanged on failure.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        let Some(credential) = self.credential() else {
            self.lock_state().error = Some("Please login to add items to cart".to_string());
            return Err(ApiError::NotAuthenticated);
        };

        let _guard = self.inner.mutation_lock.lock().await;
        match self
            .inner
            .api
            .add_to_cart(&credential, product_id, quantity)
            .await
        {
            Ok(cart) => {
                self.apply(cart);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Set the quantity of an existing line item.
    ///
    /// Silent no-op while anonymous.
    ///
    /// # Errors
    ///
    /// Returns the remote failure; the previous basket is left unchanged.
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn update_item(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        let Some(credential) = self.credential() else {
            return Ok(());
        };

        let _guard = self.inner.mutation_lock.lock().await;
        match self
            .inner
            .api
            .update_cart_item(&credential, product_id, quantity)
            .await
        {
            Ok(cart) => {
                self.apply(cart);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Remove a line item from the basket.
    ///
    /// Silent no-op while anonymous.
    ///
    /// # Errors
    ///
    /// Returns the remote failure; the previous basket is left unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_item(&self, product_id: &ProductId) -> Result<(), ApiError> {
        let Some(credential) = self.credential() else {
            return Ok(());
        };

        let _guard = self.inner.mutation_lock.lock().await;
        match self.inner.api.remove_from_cart(&credential, product_id).await {
            Ok(cart) => {
                self.apply(cart);
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// Empty the basket on the server and locally.
    ///
    /// Silent no-op while anonymous.
    ///
    /// # Errors
    ///
    /// Returns the remote failure; the previous basket is left unchanged.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<(), ApiError> {
        let Some(credential) = self.credential() else {
            return Ok(());
        };

        let _guard = self.inner.mutation_lock.lock().await;
        match self.inner.api.clear_cart(&credential).await {
            Ok(()) => {
                self.clear_local();
                Ok(())
            }
            Err(e) => Err(self.record_failure(e)),
        }
    }

    /// React to a session transition: fetch when an identity appears, clear
    /// locally (no network call) when it disappears.
    pub async fn apply_session(&self, state: &SessionState) {
        if state.is_authenticated() {
            // Failures are already recorded in the error slot.
            let _ = self.fetch().await;
        } else {
            debug!("Identity absent, clearing basket locally");
            self.clear_local();
        }
    }

    /// Observe session transitions until the session manager is dropped.
    ///
    /// Spawn this on the runtime to keep the basket synchronized with
    /// login/logout automatically.
    pub async fn watch_session(self) {
        let mut rx = self.inner.session.subscribe();
        loop {
            let state = rx.borrow_and_update().clone();
            self.apply_session(&state).await;
            if rx.changed().await.is_err() {
                break;
            }
        }
    }

    fn credential(&self) -> Option<Credential> {
        self.inner.session.credential()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, BasketState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the whole basket from a server response.
    fn apply(&self, cart: Cart) {
        let mut state = self.lock_state();
        state.basket = cart;
        state.error = None;
    }

    fn clear_local(&self) {
        self.lock_state().basket = Basket::default();
    }

    /// Record a failure in the error slot, purging the session on a `401`.
    fn record_failure(&self, error: ApiError) -> ApiError {
        self.lock_state().error = Some(error.to_string());
        if error.is_unauthorized() {
            self.inner.session.invalidate();
            self.clear_local();
        }
        error
    }
}
