//! Error types for the `hubbridge-models` crate.
//!
//! Connection-string parsing returns variants of [`ModelError`].

/// Errors produced when parsing or validating model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A required key was absent or had an empty value.
    #[error("missing required field: {field}")]
    MissingField {
        /// The name of the missing key.
        field: String,
    },

    /// A non-empty segment did not have the `key=value` form.
    #[error("malformed connection string segment \"{segment}\": expected key=value")]
    MalformedSegment {
        /// The offending segment, as written.
        segment: String,
    },
}
