//! Scripted in-memory transport for tests.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use crate::addresses::REDIRECT_CONDITION;
use crate::transport::{
    LinkError, LinkEvent, LinkEventStream, ProtocolError, Session, SessionOpener, SessionOptions,
    TransportError,
};

/// base64 of `Key123`.
pub(crate) const KEY: &str = "S2V5MTIz";

/// What the fake transport was asked to do.
#[derive(Debug, Default)]
pub(crate) struct Recorded {
    pub options: Vec<SessionOptions>,
    pub addresses: Vec<String>,
    pub closes: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct Faults {
    connect: bool,
    attach: bool,
    close: bool,
    hang: bool,
    stall_connect: bool,
    stall_attach: bool,
    stall_close: bool,
}

/// Opener whose single session replays a fixed list of link events.
pub(crate) struct ScriptedOpener {
    events: Mutex<Option<Vec<LinkEvent>>>,
    recorded: Arc<Mutex<Recorded>>,
    faults: Faults,
}

impl ScriptedOpener {
    pub fn new(events: Vec<LinkEvent>) -> Self {
        Self {
            events: Mutex::new(Some(events)),
            recorded: Arc::default(),
            faults: Faults::default(),
        }
    }

    pub fn failing_connect(mut self) -> Self {
        self.faults.connect = true;
        self
    }

    pub fn failing_attach(mut self) -> Self {
        self.faults.attach = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.faults.close = true;
        self
    }

    /// Keep the event stream open after the scripted events.
    pub fn hanging(mut self) -> Self {
        self.faults.hang = true;
        self
    }

    /// Never answer the connection attempt.
    pub fn stalling_connect(mut self) -> Self {
        self.faults.stall_connect = true;
        self
    }

    /// Never answer the link attach.
    pub fn stalling_attach(mut self) -> Self {
        self.faults.stall_attach = true;
        self
    }

    /// Never answer the close.
    pub fn stalling_close(mut self) -> Self {
        self.faults.stall_close = true;
        self
    }

    pub fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap()
    }
}

#[async_trait]
impl SessionOpener for ScriptedOpener {
    async fn open_session(
        &self,
        options: &SessionOptions,
    ) -> Result<Box<dyn Session>, TransportError> {
        self.recorded.lock().unwrap().options.push(options.clone());
        if self.faults.stall_connect {
            std::future::pending::<()>().await;
        }
        if self.faults.connect {
            return Err(TransportError::Connect("connection refused".into()));
        }
        Ok(Box::new(ScriptedSession {
            events: self.events.lock().unwrap().take().unwrap_or_default(),
            recorded: Arc::clone(&self.recorded),
            faults: self.faults,
        }))
    }
}

struct ScriptedSession {
    events: Vec<LinkEvent>,
    recorded: Arc<Mutex<Recorded>>,
    faults: Faults,
}

#[async_trait]
impl Session for ScriptedSession {
    async fn create_receiving_link(
        &mut self,
        address: &str,
    ) -> Result<LinkEventStream, TransportError> {
        self.recorded.lock().unwrap().addresses.push(address.to_string());
        if self.faults.stall_attach {
            std::future::pending::<()>().await;
        }
        if self.faults.attach {
            return Err(TransportError::Attach("link name in use".into()));
        }
        let scripted = stream::iter(std::mem::take(&mut self.events));
        if self.faults.hang {
            Ok(scripted.chain(stream::pending()).boxed())
        } else {
            Ok(scripted.boxed())
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.recorded.lock().unwrap().closes += 1;
        if self.faults.stall_close {
            std::future::pending::<()>().await;
        }
        if self.faults.close {
            return Err(TransportError::Close("connection already reset".into()));
        }
        Ok(())
    }
}

/// A redirect error event with the given info entries.
pub(crate) fn redirect(hostname: Option<&str>, address: Option<&str>) -> LinkEvent {
    let mut error = ProtocolError::new(REDIRECT_CONDITION).with_description("link redirected");
    if let Some(hostname) = hostname {
        error = error.with_info("hostname", hostname);
    }
    if let Some(address) = address {
        error = error.with_info("address", address);
    }
    LinkEvent::Error(LinkError::Protocol(error))
}
