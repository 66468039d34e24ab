//! One WebSocket connection per sprint session.
//!
//! The transport never interprets frames. Everything it observes after the
//! socket opens is forwarded, in receipt order, on the event channel handed out
//! by [`TransportFactory::open`]: zero or more [`TransportEvent::Message`], at
//! most one [`TransportEvent::Error`], then exactly one [`TransportEvent::Closed`].

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use shared::{domain::SessionId, protocol::StartSprint};
use tokio::{sync::mpsc, time::Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::ClientSettings, error::TransportError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Message(String),
    Error(String),
    Closed,
}

pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

#[async_trait]
pub trait SessionTransport: Send {
    async fn connect(&mut self, session_id: &SessionId) -> Result<(), TransportError>;
    fn send(&mut self, command: &StartSprint) -> Result<(), TransportError>;
    fn disconnect(&mut self);
}

/// Creates a fresh transport, with its own event channel, for every session.
pub trait TransportFactory: Send + Sync {
    type Transport: SessionTransport;

    fn open(&self) -> (Self::Transport, TransportEvents);
}

enum Link {
    Idle,
    Open { outbound: mpsc::UnboundedSender<Message> },
    Closed,
}

pub struct WsTransport {
    base_url: Url,
    connect_timeout: Duration,
    close_timeout: Duration,
    events: mpsc::UnboundedSender<TransportEvent>,
    link: Link,
}

impl WsTransport {
    pub fn new(
        base_url: Url,
        connect_timeout: Duration,
        close_timeout: Duration,
    ) -> (Self, TransportEvents) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let transport = Self {
            base_url,
            connect_timeout,
            close_timeout,
            events,
            link: Link::Idle,
        };
        (transport, events_rx)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.link, Link::Open { .. })
    }
}

/// `{base}/ws/sprint/{session_id}`, keeping any path prefix on the base URL.
pub fn sprint_endpoint(base_url: &Url, session_id: &SessionId) -> Result<Url, TransportError> {
    let mut endpoint = base_url.clone();
    endpoint
        .path_segments_mut()
        .map_err(|()| TransportError::InvalidEndpoint(base_url.to_string()))?
        .pop_if_empty()
        .extend(["ws", "sprint", session_id.as_str()]);
    Ok(endpoint)
}

#[async_trait]
impl SessionTransport for WsTransport {
    async fn connect(&mut self, session_id: &SessionId) -> Result<(), TransportError> {
        if !matches!(self.link, Link::Idle) {
            return Err(TransportError::Reused);
        }
        let endpoint = sprint_endpoint(&self.base_url, session_id)?;
        let endpoint_str = endpoint.to_string();

        let connected =
            tokio::time::timeout(self.connect_timeout, connect_async(endpoint.as_str()))
                .await
                .map_err(|_| TransportError::ConnectTimeout {
                    endpoint: endpoint_str.clone(),
                    timeout_ms: self.connect_timeout.as_millis() as u64,
                })?;
        let (ws_stream, _) = connected.map_err(|err| TransportError::Connect {
            endpoint: endpoint_str.clone(),
            reason: err.to_string(),
        })?;
        info!(%session_id, endpoint = %endpoint_str, "sprint: websocket connected");

        let (mut ws_writer, mut ws_reader) = ws_stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<Message>();
        let events = self.events.clone();
        let close_timeout = self.close_timeout;
        let session_id = session_id.clone();

        tokio::spawn(async move {
            let mut close_deadline: Option<Instant> = None;
            loop {
                tokio::select! {
                    outgoing = outbound_rx.recv(), if close_deadline.is_none() => match outgoing {
                        Some(message) => {
                            if let Err(err) = ws_writer.send(message).await {
                                let _ = events.send(TransportEvent::Error(format!(
                                    "websocket send failed: {err}"
                                )));
                                break;
                            }
                        }
                        None => {
                            debug!(%session_id, "sprint: closing websocket");
                            let _ = ws_writer.close().await;
                            close_deadline = Some(Instant::now() + close_timeout);
                        }
                    },
                    incoming = ws_reader.next() => match incoming {
                        Some(Ok(Message::Text(text))) => {
                            let _ = events.send(TransportEvent::Message(text));
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            if close_deadline.is_none() {
                                let _ = events.send(TransportEvent::Error(format!(
                                    "websocket receive failed: {err}"
                                )));
                            }
                            break;
                        }
                    },
                    _ = tokio::time::sleep_until(close_deadline.unwrap_or_else(Instant::now)),
                        if close_deadline.is_some() =>
                    {
                        warn!(%session_id, "sprint: close handshake timed out");
                        break;
                    }
                }
            }
            info!(%session_id, "sprint: websocket closed");
            let _ = events.send(TransportEvent::Closed);
        });

        self.link = Link::Open { outbound };
        Ok(())
    }

    fn send(&mut self, command: &StartSprint) -> Result<(), TransportError> {
        let Link::Open { outbound } = &self.link else {
            return Err(TransportError::NotConnected);
        };
        let text = serde_json::to_string(command)?;
        outbound
            .send(Message::Text(text))
            .map_err(|_| TransportError::NotConnected)
    }

    fn disconnect(&mut self) {
        // Dropping the outbound sender is what tells the connection task to close.
        self.link = Link::Closed;
    }
}

#[derive(Debug, Clone)]
pub struct WsTransportFactory {
    base_url: Url,
    connect_timeout: Duration,
    close_timeout: Duration,
}

impl WsTransportFactory {
    pub fn new(base_url: Url) -> Self {
        let defaults = ClientSettings::default();
        Self {
            base_url,
            connect_timeout: Duration::from_millis(defaults.connect_timeout_ms),
            close_timeout: Duration::from_millis(defaults.close_timeout_ms),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, TransportError> {
        let base_url = Url::parse(&settings.coordinator_url).map_err(|err| {
            TransportError::InvalidEndpoint(format!("{}: {err}", settings.coordinator_url))
        })?;
        if !matches!(base_url.scheme(), "ws" | "wss") {
            return Err(TransportError::InvalidEndpoint(format!(
                "{} must use ws:// or wss://",
                settings.coordinator_url
            )));
        }
        Ok(Self {
            base_url,
            connect_timeout: Duration::from_millis(settings.connect_timeout_ms),
            close_timeout: Duration::from_millis(settings.close_timeout_ms),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl TransportFactory for WsTransportFactory {
    type Transport = WsTransport;

    fn open(&self) -> (WsTransport, TransportEvents) {
        WsTransport::new(
            self.base_url.clone(),
            self.connect_timeout,
            self.close_timeout,
        )
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
