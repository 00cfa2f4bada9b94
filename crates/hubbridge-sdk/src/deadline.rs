//! One time budget shared by every await of a conversion.
//!
//! Connecting, attaching the management link and waiting for the redirect
//! all draw from the same [`Deadline`], so a registry that stops answering
//! at any step cannot suspend the caller past the configured budget.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::transport::TransportError;

/// A fixed point in time, plus the budget it was derived from.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// The budget this deadline was created with.
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Await `future`, failing with [`TransportError::Timeout`] once the
    /// deadline passes.
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, TransportError> {
        tokio::time::timeout_at(self.at, future)
            .await
            .map_err(|_| TransportError::Timeout(self.budget))
    }
}
