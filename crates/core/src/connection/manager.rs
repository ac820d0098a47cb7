//! # Connection Manager
//!
//! Owns the single WebSocket to the ideation backend.
//!
//! ## Architecture
//!
//! ```text
//! ConnectionManager                  Socket Task
//!     │                                   │
//!     ├─── ConnectionCommand::Send ─────▶ ├── write text frame
//!     │                                   │
//!     │ ◀──── ConnectionEvent::Frame ─────┤ ◀── parsed inbound frame
//!     │ ◀──── ConnectionEvent::Closed ────┤
//!     │                                   ├── backoff, reconnect
//!     │ ◀──── ConnectionEvent::Opened ────┤
//!     │
//!     └─── ConnectionCommand::Close ────▶ └── close handshake, exit
//! ```
//!
//! Status is published through a `watch` channel so `send` can refuse
//! synchronously while the socket is not open.

use super::backoff::ReconnectPolicy;
use crate::error::{IdeationError, Result};
use crate::swarm::events::{parse_frame, InboundFrame};
use futures::{SinkExt, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

/// Lifecycle of the socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Open => "open",
            ConnectionStatus::Closed => "closed",
        })
    }
}

/// Everything the socket task reports
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A connection attempt started
    Connecting { attempt: u32 },
    /// Socket is open and accepts frames
    Opened,
    /// A well-formed inbound frame
    Frame(InboundFrame),
    /// Socket-level failure (handshake, I/O, protocol)
    Failed { error: String },
    /// Socket closed, by either side
    Closed { reason: Option<String> },
    /// Waiting before the next connection attempt
    Reconnecting { attempt: u32, delay: Duration },
}

/// Commands sent from the manager to the socket task
#[derive(Debug)]
enum ConnectionCommand {
    Send(String),
    Close,
}

enum SessionEnd {
    ClosedByClient,
    ClosedByServer(Option<String>),
    Failed(String),
}

/// Handle to the socket task
pub struct ConnectionManager {
    command_tx: mpsc::Sender<ConnectionCommand>,
    status_rx: watch::Receiver<ConnectionStatus>,
    task_handle: JoinHandle<()>,
}

impl ConnectionManager {
    /// Start connecting to `url`.
    ///
    /// Returns the manager and the receiver for every event the socket
    /// produces. Must be called inside a tokio runtime.
    pub fn connect(
        url: Url,
        policy: ReconnectPolicy,
    ) -> Result<(Self, mpsc::Receiver<ConnectionEvent>)> {
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(IdeationError::InvalidUrl {
                url: url.to_string(),
                reason: "scheme must be ws or wss".to_string(),
            });
        }

        let (command_tx, command_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = mpsc::channel(256);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Connecting);

        let task_handle = tokio::spawn(run_socket(
            url,
            policy,
            command_rx,
            status_tx,
            event_tx,
        ));

        Ok((
            Self {
                command_tx,
                status_rx,
                task_handle,
            },
            event_rx,
        ))
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_rx.borrow()
    }

    pub fn is_open(&self) -> bool {
        self.status() == ConnectionStatus::Open
    }

    /// Queue one text frame. Fails with `NotConnected` unless the socket is open.
    pub fn send(&self, frame: String) -> Result<()> {
        if !self.is_open() {
            return Err(IdeationError::NotConnected);
        }
        self.command_tx
            .try_send(ConnectionCommand::Send(frame))
            .map_err(|_| IdeationError::NotConnected)
    }

    /// Ask the socket task to close. Idempotent.
    pub fn close(&self) {
        let _ = self.command_tx.try_send(ConnectionCommand::Close);
    }

    /// Close and wait for the socket task to finish
    pub async fn shutdown(self) {
        self.close();
        let _ = self.task_handle.await;
    }
}

async fn run_socket(
    url: Url,
    policy: ReconnectPolicy,
    mut command_rx: mpsc::Receiver<ConnectionCommand>,
    status_tx: watch::Sender<ConnectionStatus>,
    event_tx: mpsc::Sender<ConnectionEvent>,
) {
    // Retries since the socket was last open
    let mut retries: u32 = 0;

    loop {
        let attempt = retries + 1;
        let _ = status_tx.send(ConnectionStatus::Connecting);
        let _ = event_tx.send(ConnectionEvent::Connecting { attempt }).await;
        tracing::info!(url = %url, attempt, "Connecting to ideation backend");

        let connect = connect_async(url.as_str());
        tokio::pin!(connect);
        let connected = loop {
            tokio::select! {
                result = &mut connect => break Some(result),
                command = command_rx.recv() => match command {
                    Some(ConnectionCommand::Send(_)) => {
                        tracing::warn!("Dropping frame sent before the socket opened");
                    }
                    Some(ConnectionCommand::Close) | None => break None,
                },
            }
        };

        let end = match connected {
            None => SessionEnd::ClosedByClient,
            Some(Err(e)) => SessionEnd::Failed(e.to_string()),
            Some(Ok((socket, _response))) => {
                retries = 0;
                let _ = status_tx.send(ConnectionStatus::Open);
                let _ = event_tx.send(ConnectionEvent::Opened).await;
                tracing::info!(url = %url, "WebSocket connected");

                let (mut sink, mut stream) = socket.split();
                loop {
                    tokio::select! {
                        command = command_rx.recv() => match command {
                            Some(ConnectionCommand::Send(text)) => {
                                tracing::debug!(bytes = text.len(), "Sending frame");
                                if let Err(e) = sink.send(Message::Text(text)).await {
                                    break SessionEnd::Failed(e.to_string());
                                }
                            }
                            Some(ConnectionCommand::Close) | None => {
                                let _ = sink.send(Message::Close(None)).await;
                                break SessionEnd::ClosedByClient;
                            }
                        },
                        incoming = stream.next() => match incoming {
                            Some(Ok(Message::Text(text))) => {
                                if let Some(frame) = on_text(&text) {
                                    let _ = event_tx.send(ConnectionEvent::Frame(frame)).await;
                                }
                            }
                            Some(Ok(Message::Close(frame))) => {
                                break SessionEnd::ClosedByServer(
                                    frame.map(|f| f.reason.to_string()).filter(|r| !r.is_empty()),
                                );
                            }
                            Some(Ok(Message::Binary(data))) => {
                                tracing::warn!(bytes = data.len(), "Dropping binary frame");
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => break SessionEnd::Failed(e.to_string()),
                            None => break SessionEnd::ClosedByServer(None),
                        },
                    }
                }
            }
        };

        let _ = status_tx.send(ConnectionStatus::Closed);
        match end {
            SessionEnd::ClosedByClient => {
                tracing::info!("WebSocket closed by client");
                let _ = event_tx.send(ConnectionEvent::Closed { reason: None }).await;
                return;
            }
            SessionEnd::ClosedByServer(reason) => {
                tracing::info!(reason = ?reason, "WebSocket disconnected");
                let _ = event_tx.send(ConnectionEvent::Closed { reason }).await;
            }
            SessionEnd::Failed(error) => {
                tracing::error!(error = %error, "WebSocket error");
                let _ = event_tx.send(ConnectionEvent::Failed { error }).await;
                let _ = event_tx.send(ConnectionEvent::Closed { reason: None }).await;
            }
        }

        retries += 1;
        let attempt = retries;
        let Some(delay) = policy.delay_for(attempt) else {
            tracing::warn!(retries = attempt - 1, "Giving up on the ideation backend");
            return;
        };
        tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
        let _ = event_tx
            .send(ConnectionEvent::Reconnecting { attempt, delay })
            .await;

        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => break,
                command = command_rx.recv() => match command {
                    Some(ConnectionCommand::Send(_)) => {
                        tracing::warn!("Dropping frame sent while reconnecting");
                    }
                    Some(ConnectionCommand::Close) | None => {
                        let _ = event_tx.send(ConnectionEvent::Closed { reason: None }).await;
                        return;
                    }
                },
            }
        }
    }
}

/// Decode one inbound text frame; malformed frames are logged and dropped
fn on_text(text: &str) -> Option<InboundFrame> {
    match parse_frame(text) {
        Ok(frame) => {
            tracing::debug!(kind = frame.message.kind(), "Received frame");
            Some(frame)
        }
        Err(e) => {
            tracing::warn!(error = %e, frame = %text, "Failed to parse socket message");
            None
        }
    }
}
