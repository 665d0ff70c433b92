//! Staff dashboard subscription to new guest tickets.
//!
//! A [`Subscription`] is an explicit handle: it is opened over a
//! [`Transport`], yields typed [`ChannelEvent`]s and ends on [`Subscription::close`]
//! or when its cancellation token fires. Reconnecting is left to the transport.

use crate::client::ClientError;
use crate::server::model::ticket::{ClientFrame, ServerFrame, TicketNotification};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Lifecycle and payload events as a socket library reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Connect,
    ConnectError(String),
    Message(String),
    Disconnect(String),
}

#[async_trait(?Send)]
pub trait Transport {
    /// `None` once the transport is finished for good.
    async fn next_event(&mut self) -> Option<TransportEvent>;
    async fn send(&mut self, text: String) -> Result<(), ClientError>;
    async fn close(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Error(String),
    TicketCreated(TicketNotification),
    Disconnected(String),
}

/// Where ticket alerts surface.
pub trait AlertSink {
    fn toast(&self, title: &str, body: &str);
    fn play_sound(&self);
}

/// Audio may only start after a user gesture; the same cue is reused after that.
#[derive(Debug, Clone, Default)]
pub struct AudioGate(Arc<AtomicBool>);

impl AudioGate {
    pub fn unlock(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_unlocked(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct NotificationChannel;

impl NotificationChannel {
    pub fn open<T: Transport, S: AlertSink>(transport: T, sink: S) -> Subscription<T, S> {
        Subscription {
            transport,
            sink,
            audio: AudioGate::default(),
            cancel: CancellationToken::new(),
            closed: false,
        }
    }
}

pub struct Subscription<T: Transport, S: AlertSink> {
    transport: T,
    sink: S,
    audio: AudioGate,
    cancel: CancellationToken,
    closed: bool,
}

impl<T: Transport, S: AlertSink> Subscription<T, S> {
    /// Token that ends the subscription from elsewhere.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn audio(&self) -> AudioGate {
        self.audio.clone()
    }

    pub fn unlock_audio(&self) {
        self.audio.unlock();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Next typed event, `None` after close.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            if self.closed {
                return None;
            }
            let event = tokio::select! {
                _ = self.cancel.cancelled() => None,
                event = self.transport.next_event() => event,
            };
            let Some(event) = event else {
                self.shutdown().await;
                return None;
            };
            match event {
                TransportEvent::Connect => {
                    if let Err(e) = self.join().await {
                        warn!("failed to join the managers room, {}", e);
                        return Some(ChannelEvent::Error(e.to_string()));
                    }
                    info!("notification channel connected");
                    return Some(ChannelEvent::Connected);
                }
                TransportEvent::ConnectError(reason) => return Some(ChannelEvent::Error(reason)),
                TransportEvent::Disconnect(reason) => {
                    info!("notification channel disconnected, {}", reason);
                    return Some(ChannelEvent::Disconnected(reason));
                }
                TransportEvent::Message(text) => match serde_json::from_str::<ServerFrame>(&text) {
                    Ok(ServerFrame::NewTicket(notification)) => {
                        self.alert(&notification);
                        return Some(ChannelEvent::TicketCreated(notification));
                    }
                    Err(e) => debug!("ignoring unknown frame, {}", e),
                },
            }
        }
    }

    async fn join(&mut self) -> Result<(), ClientError> {
        let frame = serde_json::to_string(&ClientFrame::JoinManagersRoom).map_err(|e| ClientError::Unexpected {
            status: 0,
            reason: e.to_string(),
        })?;
        self.transport.send(frame).await
    }

    fn alert(&self, notification: &TicketNotification) {
        let title = format!(
            "New request from room {} ({})",
            notification.ticket.room_number, notification.ticket.guest_info.name
        );
        self.sink.toast(&title, &notification.message);
        if self.audio.is_unlocked() {
            self.sink.play_sound();
        }
    }

    async fn shutdown(&mut self) {
        if !self.closed {
            self.closed = true;
            self.cancel.cancel();
            self.transport.close().await;
        }
    }

    pub async fn close(&mut self) {
        self.shutdown().await;
    }
}
