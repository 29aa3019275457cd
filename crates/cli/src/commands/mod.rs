//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use shopcart_client::{ApiError, Credential, SessionManager};

/// Errors specific to the command layer.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The command needs an authenticated session.
    #[error("not logged in - run `shopcart login` first")]
    NotLoggedIn,

    /// Client-side input validation failed.
    #[error("{0}")]
    InvalidInput(String),

    /// The remote call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Get the current credential or fail with a login hint.
pub fn require_credential(session: &SessionManager) -> Result<Credential, CommandError> {
    session.credential().ok_or(CommandError::NotLoggedIn)
}
