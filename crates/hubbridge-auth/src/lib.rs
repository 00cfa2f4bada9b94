//! # Hubbridge Auth
//!
//! Time-boxed shared access signature (SAS) tokens.
//!
//! * [`sign`] / [`sign_at`] build a [`SasToken`] scoped to a resource URI.
//! * [`TokenSigner`] is the injectable capability used by the negotiator;
//!   [`SharedAccessSigner`] is the wall-clock implementation.
//! * [`verify`] recomputes a token's signature.

pub mod error;
pub mod sas;

pub use error::AuthError;
pub use sas::{SasToken, SharedAccessSigner, TokenSigner, sign, sign_at, verify};
