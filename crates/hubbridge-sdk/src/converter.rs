//! High-level conversion entry point.
//!
//! [`Converter`] runs one discovery per call: it parses the input
//! connection string, negotiates a session, waits for the redirect, always
//! releases the session, and composes the output.
//!
//! # Typical usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use hubbridge_sdk::{Converter, SessionOpener};
//!
//! # async fn run(opener: impl SessionOpener + 'static) -> Result<(), hubbridge_sdk::ConvertError> {
//! let converter = Converter::new(opener).with_redirect_timeout(Duration::from_secs(5));
//! let output = converter
//!     .convert("HostName=my-hub.example-devices.net;SharedAccessKeyName=service;SharedAccessKey=S2V5MTIz")
//!     .await?;
//!
//! println!("Event hub: {}", output.entity_path());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use hubbridge_auth::{SharedAccessSigner, TokenSigner};
use hubbridge_models::{Credential, EventHubConnectionString, IotHubConnectionString};
use tracing::info;

use crate::composer::compose;
use crate::deadline::Deadline;
use crate::error::ConvertError;
use crate::negotiator::negotiate;
use crate::redirect::await_redirect;
use crate::transport::SessionOpener;

/// Budget for one conversion when no timeout is configured.
pub const DEFAULT_REDIRECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Converts device-registry connection strings into broker-compatible ones.
///
/// Holds the injected transport and signer; each call to
/// [`convert`](Self::convert) opens and releases its own session.
#[derive(Clone)]
pub struct Converter {
    opener: Arc<dyn SessionOpener>,
    signer: Arc<dyn TokenSigner>,
    redirect_timeout: Duration,
}

impl Converter {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a converter over `opener`, signing with the system clock.
    pub fn new(opener: impl SessionOpener + 'static) -> Self {
        Self {
            opener: Arc::new(opener),
            signer: Arc::new(SharedAccessSigner),
            redirect_timeout: DEFAULT_REDIRECT_TIMEOUT,
        }
    }

    /// Replace the token signer.
    #[must_use]
    pub fn with_signer(mut self, signer: impl TokenSigner + 'static) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    /// Bound one conversion: connecting, attaching the management link and
    /// waiting for the redirect all share this budget.
    #[must_use]
    pub fn with_redirect_timeout(mut self, timeout: Duration) -> Self {
        self.redirect_timeout = timeout;
        self
    }

    /// The configured redirect timeout.
    pub fn redirect_timeout(&self) -> Duration {
        self.redirect_timeout
    }

    // ------------------------------------------------------------------
    // Conversion
    // ------------------------------------------------------------------

    /// Convert a connection string of the form
    /// `HostName=…;SharedAccessKeyName=…;SharedAccessKey=…`.
    ///
    /// Input errors are reported before any network activity.
    pub async fn convert(&self, input: &str) -> Result<EventHubConnectionString, ConvertError> {
        let credential = input.parse::<IotHubConnectionString>()?.into_credential();
        self.convert_credential(&credential).await
    }

    /// Convert an already parsed credential.
    pub async fn convert_credential(
        &self,
        credential: &Credential,
    ) -> Result<EventHubConnectionString, ConvertError> {
        let deadline = Deadline::after(self.redirect_timeout);
        let mut handle = negotiate(
            self.opener.as_ref(),
            self.signer.as_ref(),
            credential,
            deadline,
        )
        .await?;

        let outcome = await_redirect(handle.events_mut(), deadline).await;
        handle.release().await;
        let redirect = outcome?;

        info!(
            host = redirect.hostname(),
            entity_path = redirect.entity_path(),
            "broker discovered"
        );
        Ok(compose(&redirect, credential))
    }
}

/// Convert `input` with default settings over `opener`.
pub async fn convert(
    opener: impl SessionOpener + 'static,
    input: &str,
) -> Result<EventHubConnectionString, ConvertError> {
    Converter::new(opener).convert(input).await
}
