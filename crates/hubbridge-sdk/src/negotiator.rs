//! Opens the discovery session and requests the management link.

use std::time::Duration;

use hubbridge_auth::TokenSigner;
use hubbridge_models::Credential;
use tracing::{debug, info};

use crate::addresses::{HubAddresses, AMQPS_PORT, TOKEN_VALIDITY_MINUTES};
use crate::deadline::Deadline;
use crate::error::ConvertError;
use crate::transport::{LinkEventStream, Session, SessionOpener, SessionOptions};

/// Upper bound on closing a session that is being released.
const RELEASE_GRACE: Duration = Duration::from_secs(5);

/// One secured session plus its management receiving link.
///
/// Single use: owned by one conversion, and released with
/// [`release`](Self::release) on every exit path.
pub struct SessionHandle {
    session: Box<dyn Session>,
    events: LinkEventStream,
}

impl SessionHandle {
    /// Events raised on the management link.
    pub fn events_mut(&mut self) -> &mut LinkEventStream {
        &mut self.events
    }

    /// Close the session, best effort.
    ///
    /// Close failures, and closes that take longer than a short grace
    /// period, are logged and dropped: by the time the session is released
    /// the outcome of the conversion is already decided.
    pub async fn release(mut self) {
        release_session(self.session.as_mut()).await;
    }
}

/// Open a session to the registry's broker endpoint and attach a receiving
/// link on its management address.
///
/// 1. Derives the registry name, SASL username and token scope from the host.
/// 2. Signs a token valid for [`TOKEN_VALIDITY_MINUTES`].
/// 3. Opens a TLS session on [`AMQPS_PORT`] with reconnection disabled.
/// 4. Requests the management link; if that fails, the session is released
///    before the error is returned.
///
/// Opening the session and attaching the link are both bounded by
/// `deadline`; expiry is reported as [`TransportError::Timeout`].
///
/// [`TransportError::Timeout`]: crate::transport::TransportError::Timeout
pub async fn negotiate(
    opener: &dyn SessionOpener,
    signer: &dyn TokenSigner,
    credential: &Credential,
    deadline: Deadline,
) -> Result<SessionHandle, ConvertError> {
    let host = credential.resource_host();
    if host.is_empty() || credential.key_name().is_empty() || credential.key().is_empty() {
        return Err(ConvertError::InvalidInput(
            "host name, key name and key are all required".into(),
        ));
    }
    let registry = HubAddresses::registry_name(host).ok_or_else(|| {
        ConvertError::InvalidInput(format!(
            "unable to extract the registry name from host \"{host}\""
        ))
    })?;

    let token = signer.sign(
        &HubAddresses::resource_uri(host),
        credential.key(),
        credential.key_name(),
        TOKEN_VALIDITY_MINUTES,
    )?;

    let options = SessionOptions {
        host: host.to_string(),
        hostname: host.to_string(),
        port: AMQPS_PORT,
        username: HubAddresses::sas_username(credential.key_name(), registry),
        password: token.into_string(),
        reconnect: false,
    };

    info!(%host, port = AMQPS_PORT, registry, "opening discovery session");
    let mut session = deadline.run(opener.open_session(&options)).await??;

    let address = HubAddresses::management_address(host);
    debug!(%address, "requesting management link");
    let attached = deadline
        .run(session.create_receiving_link(&address))
        .await
        .and_then(|link| link);
    match attached {
        Ok(events) => Ok(SessionHandle { session, events }),
        Err(e) => {
            release_session(session.as_mut()).await;
            Err(e.into())
        }
    }
}

async fn release_session(session: &mut dyn Session) {
    match tokio::time::timeout(RELEASE_GRACE, session.close()).await {
        Ok(Ok(())) => debug!("discovery session closed"),
        Ok(Err(e)) => debug!(error = %e, "ignoring session close failure"),
        Err(_) => debug!(grace = ?RELEASE_GRACE, "abandoning session close"),
    }
}
