//! SDK error types.
//!
//! [`ConvertError`] is the single error type returned by a conversion. Each
//! variant is terminal: nothing is retried inside the SDK, and no partial
//! output is ever produced.

use hubbridge_auth::AuthError;
use hubbridge_models::ModelError;

use crate::transport::{LinkError, TransportError};

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// Malformed or incomplete input connection string.
    #[error("invalid connection string: {0}")]
    InvalidInput(String),

    /// The shared access key is not valid base64.
    #[error("shared access key rejected: {0}")]
    InvalidKey(#[source] AuthError),

    /// The session could not be established, or no redirect arrived in time.
    #[error("connection failed: {0}")]
    ConnectFailed(#[from] TransportError),

    /// The link failed with something other than a usable redirect.
    ///
    /// The underlying error is passed through untouched.
    #[error("unexpected link error: {0}")]
    ProtocolMismatch(LinkError),

    /// A redirect arrived but its address did not name an entity path.
    #[error("cannot parse the entity path from redirect address \"{address}\"")]
    ParseFailure {
        /// The address carried by the redirect, verbatim.
        address: String,
    },
}

impl From<ModelError> for ConvertError {
    fn from(e: ModelError) -> Self {
        ConvertError::InvalidInput(e.to_string())
    }
}

impl From<AuthError> for ConvertError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidKey(_) => ConvertError::InvalidKey(e),
            AuthError::InvalidInput(msg) => ConvertError::InvalidInput(msg),
        }
    }
}
