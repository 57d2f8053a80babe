use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::TransportError;

/// Close code for a connection that ended without a closing handshake.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Something that happened on a [`Transport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established. This is always the first event.
    Open,
    /// A text record from the server.
    Message(String),
    /// Something went wrong. A `Close` event follows.
    Error(String),
    /// The connection is gone. No events follow.
    Close {
        code: u16,
        reason: String,
        was_clean: bool,
    },
}

/// A bidirectional, message-based connection to the game server.
pub trait Transport: Send {
    fn send(&mut self, text: String) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// The next event. `None` means the connection ended without a `Close` event.
    ///
    /// Must be cancel-safe: dropping the future before it completes must not
    /// lose an event.
    fn recv(&mut self) -> impl Future<Output = Option<TransportEvent>> + Send;

    /// Starts closing the connection. A `Close` event follows.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// A [`Transport`] over a WebSocket connection (`ws://` or `wss://`).
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    opened: bool,
    closing_by_us: bool,
    pending_close: Option<TransportEvent>,
    closed: bool,
}

impl WebSocketTransport {
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (stream, _response) = tokio_tungstenite::connect_async(url).await?;
        debug!(url, "WebSocket handshake completed");
        Ok(Self {
            stream,
            opened: false,
            closing_by_us: false,
            pending_close: None,
            closed: false,
        })
    }

    fn finish(&mut self, event: TransportEvent) -> Option<TransportEvent> {
        self.closed = true;
        Some(event)
    }
}

impl Transport for WebSocketTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(WsMessage::Text(text)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        if !self.opened {
            self.opened = true;
            return Some(TransportEvent::Open);
        }
        if let Some(event) = self.pending_close.take() {
            return self.finish(event);
        }
        if self.closed {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return Some(TransportEvent::Message(text)),
                Some(Ok(WsMessage::Close(frame))) => {
                    // 1005: no status code was present in the close frame
                    let (code, reason) = frame
                        .map(|frame| (u16::from(frame.code), frame.reason.into_owned()))
                        .unwrap_or((1005, String::new()));
                    return self.finish(TransportEvent::Close {
                        code,
                        reason,
                        was_clean: true,
                    });
                }
                // Pings are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed))
                | None => {
                    let event = if self.closing_by_us {
                        TransportEvent::Close {
                            code: 1000,
                            reason: String::new(),
                            was_clean: true,
                        }
                    } else {
                        TransportEvent::Close {
                            code: ABNORMAL_CLOSURE,
                            reason: String::new(),
                            was_clean: false,
                        }
                    };
                    return self.finish(event);
                }
                Some(Err(err)) => {
                    self.pending_close = Some(TransportEvent::Close {
                        code: ABNORMAL_CLOSURE,
                        reason: err.to_string(),
                        was_clean: false,
                    });
                    return Some(TransportEvent::Error(err.to_string()));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closing_by_us = true;
        self.stream.close(None).await?;
        Ok(())
    }
}
