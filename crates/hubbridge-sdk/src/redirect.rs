//! Interprets the management link's events.
//!
//! Attaching a receiving link to the registry's management address is
//! answered with an `amqp:link:redirect` error whose info map names the
//! entity's real broker. [`RedirectInterpreter`] harvests that redirect
//! instead of treating it as a failure:
//!
//! ```text
//! Opening ──link requested──► AwaitingEvent ──redirect──► Resolved
//!                                   │
//!                                   └──any other error──► Rejected
//! ```
//!
//! The machine is single shot. Only the first error event counts; anything
//! after a terminal state is ignored.

use std::sync::LazyLock;

use futures::StreamExt;
use hubbridge_models::RedirectInfo;
use regex::Regex;
use tracing::{debug, warn};

use crate::addresses::{AMQPS_PORT, REDIRECT_CONDITION};
use crate::deadline::Deadline;
use crate::error::ConvertError;
use crate::transport::{LinkError, LinkEvent, LinkEventStream, TransportError};

/// Matches `…:5671/<entity>/$management`, capturing the entity path.
static ENTITY_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i){AMQPS_PORT}/(.*)/\$management")).expect("valid entity path regex")
});

/// Where the interpreter is in its lifecycle.
#[derive(Debug)]
pub enum RedirectState {
    /// The link has not been requested yet.
    Opening,
    /// The link was requested; waiting for its first error.
    AwaitingEvent,
    /// A usable redirect was received.
    Resolved(RedirectInfo),
    /// The link failed in a way that yields no redirect.
    Rejected(ConvertError),
}

impl RedirectState {
    /// `true` for [`Resolved`](Self::Resolved) and [`Rejected`](Self::Rejected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, RedirectState::Resolved(_) | RedirectState::Rejected(_))
    }
}

/// State machine over one link's event stream.
#[derive(Debug)]
pub struct RedirectInterpreter {
    state: RedirectState,
}

impl Default for RedirectInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl RedirectInterpreter {
    /// A fresh interpreter in [`RedirectState::Opening`].
    pub fn new() -> Self {
        Self {
            state: RedirectState::Opening,
        }
    }

    /// Current state.
    pub fn state(&self) -> &RedirectState {
        &self.state
    }

    /// Record that the link attach was sent.
    pub fn link_requested(&mut self) {
        if matches!(self.state, RedirectState::Opening) {
            self.state = RedirectState::AwaitingEvent;
        }
    }

    /// Feed one event. Returns `true` once a terminal state is reached.
    pub fn on_event(&mut self, event: LinkEvent) -> bool {
        if !matches!(self.state, RedirectState::AwaitingEvent) {
            return self.state.is_terminal();
        }
        match event {
            LinkEvent::Attached => {
                debug!("management link attached, still waiting for redirect");
                false
            }
            LinkEvent::Error(error) => {
                self.state = interpret(error);
                true
            }
        }
    }

    /// The terminal outcome, or `None` if no terminal state was reached.
    pub fn into_outcome(self) -> Option<Result<RedirectInfo, ConvertError>> {
        match self.state {
            RedirectState::Resolved(info) => Some(Ok(info)),
            RedirectState::Rejected(error) => Some(Err(error)),
            RedirectState::Opening | RedirectState::AwaitingEvent => None,
        }
    }
}

fn interpret(error: LinkError) -> RedirectState {
    let (hostname, address) = match error.as_protocol() {
        Some(protocol) if protocol.condition == REDIRECT_CONDITION => (
            protocol.info_value("hostname").map(str::to_owned),
            protocol.info_value("address").unwrap_or_default().to_owned(),
        ),
        _ => {
            warn!(%error, "link failed without a redirect");
            return RedirectState::Rejected(ConvertError::ProtocolMismatch(error));
        }
    };

    let Some(hostname) = hostname.filter(|h| !h.is_empty()) else {
        warn!(%error, "redirect carries no hostname");
        return RedirectState::Rejected(ConvertError::ProtocolMismatch(error));
    };

    match parse_entity_path(&address) {
        Some(entity_path) => {
            debug!(%hostname, entity_path, "redirect resolved");
            RedirectState::Resolved(RedirectInfo::new(hostname, entity_path))
        }
        None => {
            warn!(%address, %error, "redirect address names no entity path");
            RedirectState::Rejected(ConvertError::ParseFailure { address })
        }
    }
}

/// Extract the entity path from a redirect address such as
/// `amqps://host:5671/<entity>/$management` (case-insensitive).
///
/// Returns `None` when the address does not match or the path is empty.
pub fn parse_entity_path(address: &str) -> Option<&str> {
    ENTITY_PATH
        .captures(address)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|path| !path.is_empty())
}

/// Drive a fresh interpreter over `events` until it reaches a terminal
/// state or `deadline` passes.
///
/// Expiry yields [`TransportError::Timeout`]; a stream that ends without a
/// terminal event yields [`TransportError::StreamEnded`].
pub async fn await_redirect(
    events: &mut LinkEventStream,
    deadline: Deadline,
) -> Result<RedirectInfo, ConvertError> {
    let mut interpreter = RedirectInterpreter::new();
    interpreter.link_requested();

    let drive = async {
        while let Some(event) = events.next().await {
            if interpreter.on_event(event) {
                break;
            }
        }
    };
    if let Err(expired) = deadline.run(drive).await {
        warn!(budget = ?deadline.budget(), "gave up waiting for redirect");
        return Err(expired.into());
    }

    interpreter
        .into_outcome()
        .unwrap_or(Err(TransportError::StreamEnded.into()))
}
