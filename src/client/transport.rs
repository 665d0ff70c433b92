//! Websocket transport for the notification channel, reconnecting with backoff.

use crate::client::notifications::{Transport, TransportEvent};
use crate::client::ClientError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, warn};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WsTransport {
    url: String,
    socket: Option<Socket>,
    /// failed or lost connections since the last successful connect
    attempts: u32,
    closed: bool,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            socket: None,
            attempts: 0,
            closed: false,
        }
    }

    fn backoff(&self) -> Duration {
        let secs = 1_u64 << self.attempts.saturating_sub(1).min(5);
        Duration::from_secs(secs).min(MAX_BACKOFF)
    }

    fn lost(&mut self, reason: String) -> TransportEvent {
        self.socket = None;
        self.attempts = 1;
        TransportEvent::Disconnect(reason)
    }
}

#[async_trait(?Send)]
impl Transport for WsTransport {
    async fn next_event(&mut self) -> Option<TransportEvent> {
        loop {
            if self.closed {
                return None;
            }
            if self.socket.is_none() {
                if self.attempts > 0 {
                    tokio::time::sleep(self.backoff()).await;
                }
                return match connect_async(self.url.as_str()).await {
                    Ok((socket, _)) => {
                        self.socket = Some(socket);
                        self.attempts = 0;
                        Some(TransportEvent::Connect)
                    }
                    Err(tungstenite::Error::Http(res)) if res.status() == tungstenite::http::StatusCode::UNAUTHORIZED => {
                        // retrying cannot fix a rejected token
                        self.closed = true;
                        Some(TransportEvent::ConnectError("unauthorized".to_string()))
                    }
                    Err(e) => {
                        self.attempts += 1;
                        warn!("connect attempt {} failed, {}", self.attempts, e);
                        Some(TransportEvent::ConnectError(e.to_string()))
                    }
                };
            }
            let Some(socket) = self.socket.as_mut() else {
                continue;
            };
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return Some(TransportEvent::Message(text.as_str().to_owned())),
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame.map_or_else(|| "closed by server".to_string(), |f| f.reason.as_str().to_owned());
                    return Some(self.lost(reason));
                }
                // pings are answered by tungstenite itself
                Some(Ok(other)) => debug!("ignoring {:?}", other),
                Some(Err(e)) => return Some(self.lost(e.to_string())),
                None => return Some(self.lost("connection closed".to_string())),
            }
        }
    }

    async fn send(&mut self, text: String) -> Result<(), ClientError> {
        let socket = self.socket.as_mut().ok_or_else(|| ClientError::Network {
            reason: "not connected".to_string(),
        })?;
        socket
            .send(Message::text(text))
            .await
            .map_err(|e| ClientError::Network { reason: e.to_string() })
    }

    async fn close(&mut self) {
        self.closed = true;
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                debug!("close handshake failed, {}", e);
            }
        }
    }
}
