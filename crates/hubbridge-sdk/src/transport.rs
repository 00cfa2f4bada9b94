//! Capabilities the SDK needs from the link-layer protocol library.
//!
//! The SDK never opens sockets itself. A [`SessionOpener`] establishes a
//! secured session; the [`Session`] it returns can attach a receiving link,
//! whose lifecycle is reported as a stream of [`LinkEvent`]s.
//!
//! Implementations live outside this crate (the CLI ships one over AMQP);
//! tests use scripted in-memory fakes.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

// ---------------------------------------------------------------------------
// Session options
// ---------------------------------------------------------------------------

/// Parameters for opening one secured session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Host to connect to.
    pub host: String,
    /// Host name presented for TLS SNI and in the protocol open frame.
    pub hostname: String,
    /// TCP port.
    pub port: u16,
    /// SASL PLAIN username.
    pub username: String,
    /// SASL PLAIN password (the signed token).
    pub password: String,
    /// Whether the transport may reconnect on its own.
    pub reconnect: bool,
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("host", &self.host)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("reconnect", &self.reconnect)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Link events
// ---------------------------------------------------------------------------

/// Event reported on a receiving link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// The remote peer accepted the attach.
    Attached,
    /// The link failed.
    Error(LinkError),
}

/// Stream of events for one receiving link. The stream ending means the
/// link is gone.
pub type LinkEventStream = BoxStream<'static, LinkEvent>;

/// Error raised on a link.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    /// A structured error sent by the remote peer.
    #[error("{0}")]
    Protocol(ProtocolError),
    /// Anything else (local failure, I/O).
    #[error("{0}")]
    Transport(String),
}

impl LinkError {
    /// `true` if this is a structured protocol error.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, LinkError::Protocol(_))
    }

    /// The structured protocol error, if any.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            LinkError::Protocol(e) => Some(e),
            LinkError::Transport(_) => None,
        }
    }
}

/// A protocol-level error: condition symbol, description, and info map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolError {
    /// Condition symbol, e.g. `amqp:link:redirect`.
    pub condition: String,
    /// Free-form description supplied by the peer.
    pub description: Option<String>,
    /// String-valued entries of the error's info map.
    pub info: BTreeMap<String, String>,
}

impl ProtocolError {
    /// Create an error with the given condition and no info.
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            ..Self::default()
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an info entry.
    #[must_use]
    pub fn with_info(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info.insert(key.into(), value.into());
        self
    }

    /// Look up an info entry.
    pub fn info_value(&self, key: &str) -> Option<&str> {
        self.info.get(key).map(String::as_str)
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.condition)?;
        if let Some(description) = &self.description {
            write!(f, ": {description}")?;
        }
        if !self.info.is_empty() {
            write!(f, " {:?}", self.info)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failure to establish, use, or await a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The secured connection or session could not be opened.
    #[error("could not open session: {0}")]
    Connect(String),

    /// The receiving link could not be requested.
    #[error("could not attach link: {0}")]
    Attach(String),

    /// Closing the session failed.
    #[error("could not close session: {0}")]
    Close(String),

    /// No terminal link event arrived before the deadline.
    #[error("no redirect received within {0:?}")]
    Timeout(Duration),

    /// The link's event stream ended without a terminal event.
    #[error("link closed before a redirect was received")]
    StreamEnded,
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Opens secured sessions.
#[async_trait]
pub trait SessionOpener: Send + Sync {
    /// Open a session with the given options.
    async fn open_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn Session>, TransportError>;
}

/// One open session.
#[async_trait]
pub trait Session: Send {
    /// Request a receiving link on `address` and return its event stream.
    async fn create_receiving_link(
        &mut self,
        address: &str,
    ) -> Result<LinkEventStream, TransportError>;

    /// Close the session and its underlying connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}
