//! Push-channel transports for the dashboard feed.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::FeedError;

/// Lifecycle and payload events surfaced by a transport, in the order the
/// transport produced them.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// The channel is open; the subscription may be sent.
    Opened,
    /// One inbound text frame.
    Frame(String),
    /// Transport-level error. Before `Opened` this means the connection
    /// could not be established; afterwards it usually precedes `Closed`.
    Failed(String),
    /// The channel closed, for any reason including manual teardown.
    Closed,
}

/// Seam between the feed manager and the concrete socket client.
///
/// `start` kicks off the connection attempt and must not fail for
/// connectivity reasons; those surface on the event stream.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn start(&self) -> Result<(), FeedError>;
    async fn next_event(&self) -> Option<TransportEvent>;
    async fn send_text(&self, payload: String) -> Result<(), FeedError>;
    async fn shutdown(&self);
}

/// Inert transport for tests and unconfigured environments.
#[derive(Default)]
pub struct NoopTransport;

#[async_trait]
impl PushTransport for NoopTransport {
    async fn start(&self) -> Result<(), FeedError> {
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        None
    }

    async fn send_text(&self, _payload: String) -> Result<(), FeedError> {
        Err(FeedError::NotStarted)
    }

    async fn shutdown(&self) {}
}

/// WebSocket transport backed by tokio-tungstenite.
pub struct WsTransport {
    endpoint: String,
    started: AtomicBool,
    cancel: CancellationToken,
    events_tx: mpsc::Sender<TransportEvent>,
    events_rx: Mutex<mpsc::Receiver<TransportEvent>>,
    outbound_tx: mpsc::Sender<String>,
    outbound_rx: Mutex<Option<mpsc::Receiver<String>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl WsTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        let (outbound_tx, outbound_rx) = mpsc::channel(32);
        Self {
            endpoint: endpoint.into(),
            started: AtomicBool::new(false),
            cancel: CancellationToken::new(),
            events_tx,
            events_rx: Mutex::new(events_rx),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
            task: Mutex::new(None),
        }
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    async fn start(&self) -> Result<(), FeedError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let outbound_rx = self
            .outbound_rx
            .lock()
            .await
            .take()
            .ok_or(FeedError::NotStarted)?;
        let task = tokio::spawn(run_loop(
            self.endpoint.clone(),
            outbound_rx,
            self.events_tx.clone(),
            self.cancel.clone(),
        ));
        *self.task.lock().await = Some(task);
        Ok(())
    }

    async fn next_event(&self) -> Option<TransportEvent> {
        self.events_rx.lock().await.recv().await
    }

    async fn send_text(&self, payload: String) -> Result<(), FeedError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(FeedError::NotStarted);
        }
        self.outbound_tx
            .send(payload)
            .await
            .map_err(|_| FeedError::ChannelClosed)
    }

    async fn shutdown(&self) {
        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            let _ = task.await;
        }
    }
}

async fn run_loop(
    endpoint: String,
    mut outbound_rx: mpsc::Receiver<String>,
    events: mpsc::Sender<TransportEvent>,
    cancel: CancellationToken,
) {
    let connect = tokio::select! {
        _ = cancel.cancelled() => return,
        result = connect_async(endpoint.as_str()) => result,
    };

    let stream = match connect {
        Ok((stream, _response)) => stream,
        Err(err) => {
            warn!(target: "feed-transport", %err, endpoint = %endpoint, "websocket connect failed");
            let _ = events.send(TransportEvent::Failed(err.to_string())).await;
            let _ = events.send(TransportEvent::Closed).await;
            return;
        }
    };

    debug!(target: "feed-transport", endpoint = %endpoint, "websocket established");
    if events.send(TransportEvent::Opened).await.is_err() {
        return;
    }

    let (mut sink, mut source) = stream.split();
    let mut outbound_open = true;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                let _ = events.send(TransportEvent::Closed).await;
                break;
            }
            outbound = outbound_rx.recv(), if outbound_open => {
                match outbound {
                    Some(payload) => {
                        if let Err(err) = sink.send(Message::Text(payload.into())).await {
                            warn!(target: "feed-transport", %err, "websocket send failed");
                        }
                    }
                    None => outbound_open = false,
                }
            }
            frame = source.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if events.send(TransportEvent::Frame(text.to_string())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = sink.send(Message::Pong(payload)).await;
                    }
                    // Binary and pong frames are not part of the dashboard protocol.
                    Some(Ok(Message::Pong(_) | Message::Binary(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = events.send(TransportEvent::Closed).await;
                        break;
                    }
                    Some(Err(err)) => {
                        warn!(target: "feed-transport", %err, "websocket stream error");
                        let _ = events.send(TransportEvent::Failed(err.to_string())).await;
                        let _ = events.send(TransportEvent::Closed).await;
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn noop_transport_yields_nothing_and_rejects_sends() {
        let transport = NoopTransport;
        transport.start().await.expect("noop start");
        assert!(transport.next_event().await.is_none());
        assert!(matches!(
            transport.send_text("{}".to_string()).await,
            Err(FeedError::NotStarted)
        ));
    }

    #[tokio::test]
    async fn send_before_start_is_rejected() {
        let transport = WsTransport::new("ws://127.0.0.1:9337/feed");
        assert!(matches!(
            transport.send_text("{}".to_string()).await,
            Err(FeedError::NotStarted)
        ));
    }
}
