//! # Hubbridge SDK
//!
//! Derives a broker-compatible (Event Hubs style) connection string from a
//! device-registry (IoT Hub style) connection string, discovering the
//! broker host and entity path on the wire.
//!
//! The SDK provides:
//!
//! * [`Converter`] — the public entry point: parse, negotiate, await the
//!   redirect, release the session, compose.
//! * [`negotiate`] — opens the discovery session and management link.
//! * [`RedirectInterpreter`] — state machine over the link's events.
//! * [`compose`] — assembles the output string.
//! * [`SessionOpener`] / [`Session`] — the transport capabilities the SDK
//!   is given; it never opens sockets itself.
//! * [`ConvertError`] — unified error type.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use hubbridge_sdk::{Converter, SessionOpener};
//!
//! # async fn run(opener: impl SessionOpener + 'static) -> Result<(), hubbridge_sdk::ConvertError> {
//! let converter = Converter::new(opener);
//! let output = converter
//!     .convert("HostName=my-hub.example-devices.net;SharedAccessKeyName=service;SharedAccessKey=S2V5MTIz")
//!     .await?;
//! println!("{output}");
//! # Ok(())
//! # }
//! ```

pub mod addresses;
pub mod composer;
pub mod converter;
pub mod deadline;
pub mod error;
pub mod negotiator;
pub mod redirect;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use addresses::HubAddresses;
pub use composer::compose;
pub use converter::{convert, Converter, DEFAULT_REDIRECT_TIMEOUT};
pub use deadline::Deadline;
pub use error::ConvertError;
pub use negotiator::{negotiate, SessionHandle};
pub use redirect::{await_redirect, parse_entity_path, RedirectInterpreter, RedirectState};
pub use transport::{
    LinkError, LinkEvent, LinkEventStream, ProtocolError, Session, SessionOpener, SessionOptions,
    TransportError,
};

// Re-export model types so callers need only this crate.
pub use hubbridge_models::{
    Credential, EventHubConnectionString, IotHubConnectionString, RedirectInfo,
};
