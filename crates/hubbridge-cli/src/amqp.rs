//! [`SessionOpener`] over `fe2o3-amqp`.
//!
//! Opens a TLS connection with SASL PLAIN, begins one session and attaches
//! receiving links on request. An attach the remote peer answers with an
//! error (the registry's redirect) is delivered as a single
//! [`LinkEvent::Error`]; an attach that succeeds yields
//! [`LinkEvent::Attached`] and then stays silent, leaving the caller's
//! deadline in charge.

use async_trait::async_trait;
use fe2o3_amqp::connection::ConnectionHandle;
use fe2o3_amqp::link::ReceiverAttachError;
use fe2o3_amqp::sasl_profile::SaslProfile;
use fe2o3_amqp::session::SessionHandle;
use fe2o3_amqp::types::definitions::{self, ErrorCondition};
use fe2o3_amqp::types::primitives::{Symbol, Value};
use fe2o3_amqp::{Connection, Receiver};
use futures::stream::{self, StreamExt};
use hubbridge_sdk::{
    LinkError, LinkEvent, LinkEventStream, ProtocolError, Session, SessionOpener, SessionOptions,
    TransportError,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Opens AMQP 1.0 sessions over TLS.
///
/// `fe2o3-amqp` connections never reconnect on their own, so every session
/// is single shot regardless of [`SessionOptions::reconnect`].
#[derive(Debug, Default, Clone, Copy)]
pub struct AmqpSessionOpener;

#[async_trait]
impl SessionOpener for AmqpSessionOpener {
    async fn open_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn Session>, TransportError> {
        if options.reconnect {
            warn!("automatic reconnection is not supported, opening a single-shot connection");
        }

        let url = format!("amqps://{}:{}", options.host, options.port);
        let container_id = format!("hubbridge-{}", Uuid::new_v4());
        debug!(%url, %container_id, username = %options.username, "opening AMQP connection");

        let mut connection = Connection::builder()
            .container_id(container_id)
            .hostname(options.hostname.as_str())
            .sasl_profile(SaslProfile::Plain {
                username: options.username.clone(),
                password: options.password.clone(),
            })
            .open(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let session = match fe2o3_amqp::Session::begin(&mut connection).await {
            Ok(session) => session,
            Err(e) => {
                if let Err(close_err) = connection.close().await {
                    debug!(error = %close_err, "ignoring connection close failure");
                }
                return Err(TransportError::Connect(e.to_string()));
            }
        };

        Ok(Box::new(AmqpSession {
            connection,
            session,
            receiver: None,
        }))
    }
}

/// One AMQP connection with a single session.
struct AmqpSession {
    connection: ConnectionHandle<()>,
    session: SessionHandle<()>,
    receiver: Option<Receiver>,
}

#[async_trait]
impl Session for AmqpSession {
    async fn create_receiving_link(
        &mut self,
        address: &str,
    ) -> Result<LinkEventStream, TransportError> {
        let name = format!("hubbridge-receiver-{}", Uuid::new_v4());
        match Receiver::attach(&mut self.session, name, address.to_string()).await {
            Ok(receiver) => {
                self.receiver = Some(receiver);
                Ok(stream::iter([LinkEvent::Attached])
                    .chain(stream::pending())
                    .boxed())
            }
            Err(ReceiverAttachError::RemoteClosedWithError(error)) => {
                let event = LinkEvent::Error(LinkError::Protocol(protocol_error(error)));
                Ok(stream::iter([event]).boxed())
            }
            Err(other) => {
                let event = LinkEvent::Error(LinkError::Transport(other.to_string()));
                Ok(stream::iter([event]).boxed())
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if let Some(receiver) = self.receiver.take() {
            if let Err(e) = receiver.close().await {
                debug!(error = %e, "ignoring receiver detach failure");
            }
        }
        let ended = self.session.end().await;
        let closed = self.connection.close().await;
        ended.map_err(|e| TransportError::Close(e.to_string()))?;
        closed.map_err(|e| TransportError::Close(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Error conversion
// ---------------------------------------------------------------------------

/// Flatten an AMQP error into the SDK's [`ProtocolError`], keeping the
/// string-valued info entries.
fn protocol_error(error: definitions::Error) -> ProtocolError {
    let mut converted = ProtocolError::new(condition_symbol(&error.condition));
    converted.description = error.description;
    if let Some(info) = &error.info {
        for (key, value) in info.iter() {
            if let Some(text) = value_text(value) {
                converted.info.insert(key.0.clone(), text);
            }
        }
    }
    converted
}

/// The condition's wire symbol, e.g. `amqp:link:redirect`.
fn condition_symbol(condition: &ErrorCondition) -> String {
    let symbol = match condition {
        ErrorCondition::AmqpError(e) => Symbol::from(e),
        ErrorCondition::ConnectionError(e) => Symbol::from(e),
        ErrorCondition::SessionError(e) => Symbol::from(e),
        ErrorCondition::LinkError(e) => Symbol::from(e),
        ErrorCondition::Custom(symbol) => symbol.clone(),
    };
    symbol.0
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Symbol(s) => Some(s.0.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fe2o3_amqp::types::definitions::{AmqpError, Fields, LinkError as AmqpLinkError};
    use hubbridge_sdk::addresses::REDIRECT_CONDITION;

    #[test]
    fn redirect_condition_maps_to_its_symbol() {
        assert_eq!(
            condition_symbol(&ErrorCondition::LinkError(AmqpLinkError::Redirect)),
            REDIRECT_CONDITION
        );
    }

    #[test]
    fn other_conditions_use_wire_symbols() {
        assert_eq!(
            condition_symbol(&ErrorCondition::LinkError(AmqpLinkError::Stolen)),
            "amqp:link:stolen"
        );
        assert_eq!(
            condition_symbol(&ErrorCondition::AmqpError(AmqpError::UnauthorizedAccess)),
            "amqp:unauthorized-access"
        );
        assert_eq!(
            condition_symbol(&ErrorCondition::Custom(Symbol::from("com.example:busy"))),
            "com.example:busy"
        );
    }

    #[test]
    fn redirect_info_survives_conversion() {
        let mut info = Fields::default();
        info.insert(
            Symbol::from("hostname"),
            Value::String("broker.example.net".to_string()),
        );
        info.insert(
            Symbol::from("address"),
            Value::Symbol(Symbol::from("amqps://reg.example.net:5671/myhub/$management")),
        );
        info.insert(Symbol::from("network-host"), Value::Bool(true));
        let error = definitions::Error {
            condition: ErrorCondition::LinkError(AmqpLinkError::Redirect),
            description: Some("link redirected".to_string()),
            info: Some(info),
        };

        let converted = protocol_error(error);
        assert_eq!(converted.condition, REDIRECT_CONDITION);
        assert_eq!(converted.description.as_deref(), Some("link redirected"));
        assert_eq!(converted.info_value("hostname"), Some("broker.example.net"));
        assert_eq!(
            converted.info_value("address"),
            Some("amqps://reg.example.net:5671/myhub/$management")
        );
        assert_eq!(converted.info_value("network-host"), None);
        assert_eq!(converted.info.len(), 2);
    }

    #[test]
    fn string_values_are_kept() {
        assert_eq!(
            value_text(&Value::String("broker.example.net".into())),
            Some("broker.example.net".to_string())
        );
        assert_eq!(value_text(&Value::Bool(true)), None);
    }
}
