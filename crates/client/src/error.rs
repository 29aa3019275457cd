//! Error types for the storefront client.

use thiserror::Error;

/// Errors that can occur when talking to the commerce API.
///
/// `Unauthorized` is handled globally: the API client publishes a
/// credential-invalidation event and the session purges identity and
/// credential together. Everything else surfaces to the initiating caller
/// and is mirrored into the owning manager's error slot for passive display.
/// Nothing is retried automatically.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The server rejected the credential (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Request was rejected client-side before any network call.
    #[error("{0}")]
    Validation(String),

    /// Server-reported business error (e.g. out of stock).
    #[error("{message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Message extracted from the response's error envelope.
        message: String,
    },

    /// An operation requiring a credential was attempted while anonymous.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    /// True when the error means the credential is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
