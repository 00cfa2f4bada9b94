//! Error types for token signing.

/// Errors that can occur while building a shared access signature.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The signing key is not valid base64.
    #[error("invalid signing key: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    /// A signing argument was out of range (empty URI, zero validity).
    #[error("invalid signing input: {0}")]
    InvalidInput(String),
}
