//! Shopcart client library - headless storefront over a REST commerce API.
//!
//! # Architecture
//!
//! Two cooperating state managers sit on top of a thin REST client:
//!
//! - [`SessionManager`] owns identity and credential state, persists the
//!   bearer credential through an injected [`CredentialStore`], and exposes
//!   login/register/logout/update-profile plus silent session resumption.
//! - [`BasketManager`] owns the authenticated user's priced line items. Every
//!   mutation is a round trip to the remote service; the returned cart
//!   replaces local state wholesale, so client and server can never diverge.
//!
//! The remote boundary is the [`StoreApi`] trait, implemented for production
//! by [`ApiClient`] (reqwest) and by in-memory fakes in tests. A `401` from
//! any authorized call is published as a credential-invalidation event on a
//! watch channel; the session purges identity and credential together.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shopcart_client::{ApiClient, BasketManager, ClientConfig, MemoryCredentialStore, SessionManager};
//!
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(ApiClient::new(&config)?);
//! let session = SessionManager::new(api.clone(), Arc::new(MemoryCredentialStore::new()));
//! let basket = BasketManager::new(api.clone(), session.clone());
//!
//! session.login("user@example.com", "hunter2").await?;
//! basket.fetch().await?;
//! basket.add_item(&"665f1a2b3c4d5e6f70819202".into(), 2).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod basket;
pub mod config;
pub mod error;
pub mod session;
pub mod storage;

pub use api::{ApiClient, StoreApi};
pub use basket::{Basket, BasketManager};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use session::{SessionManager, SessionState};
pub use storage::{Credential, CredentialStore, FileCredentialStore, MemoryCredentialStore};
