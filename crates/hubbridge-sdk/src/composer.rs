//! Builds the broker-compatible connection string.

use hubbridge_models::{Credential, EventHubConnectionString, RedirectInfo};

/// Combine a resolved redirect with the original signing credentials.
///
/// Only ever called after the redirect resolved, so there is nothing to
/// fail on.
pub fn compose(redirect: &RedirectInfo, credential: &Credential) -> EventHubConnectionString {
    EventHubConnectionString::new(
        redirect.hostname(),
        redirect.entity_path(),
        credential.key_name(),
        credential.key(),
    )
}
