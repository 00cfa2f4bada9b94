//! Target discovered from a link redirect.

use serde::{Deserialize, Serialize};

/// Broker host and entity path named by a redirect error.
///
/// Produced once per conversion, from exactly one redirect event, and
/// never modified afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RedirectInfo {
    hostname: String,
    entity_path: String,
}

impl RedirectInfo {
    /// Create a new `RedirectInfo`.
    pub fn new(hostname: impl Into<String>, entity_path: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            entity_path: entity_path.into(),
        }
    }

    /// Fully qualified host name of the broker namespace.
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Entity path (event hub name) on that broker.
    pub fn entity_path(&self) -> &str {
        &self.entity_path
    }
}
