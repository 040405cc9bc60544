//! Forwards graph events to a streaming client.
//!
//! The relay pulls one event at a time from the graph and hands it to a
//! [`FrameSink`]. It stops without emitting anything when the client goes
//! away or the turn is cancelled, and emits exactly one error frame when the
//! graph fails. No event is pulled after the sink reports the client gone.

use anyhow::Result;
use async_trait::async_trait;
use axum::response::sse::Event;
use chatgraph_graph::GraphEvent;
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

/// One unit sent to the client
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    /// Wire form of a graph event, `{"<node>": {...}}`
    Event(String),
    /// Terminal fault; the payload is `{"error": "<message>"}`
    Error(String),
}

impl RelayFrame {
    pub fn payload(&self) -> String {
        match self {
            RelayFrame::Event(data) => data.clone(),
            RelayFrame::Error(message) => serde_json::json!({ "error": message }).to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RelayFrame::Error(_))
    }

    pub fn into_sse(self) -> Event {
        Event::default().data(self.payload())
    }
}

/// How a relay run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    Completed { forwarded: usize },
    Disconnected { forwarded: usize },
    Cancelled { forwarded: usize },
    Failed { forwarded: usize },
}

/// Destination of relayed frames
#[async_trait]
pub trait FrameSink: Send {
    /// Liveness probe, checked before every pull
    fn is_connected(&self) -> bool;

    /// Deliver a frame; `false` means the client is gone
    async fn send(&mut self, frame: RelayFrame) -> bool;
}

#[async_trait]
impl FrameSink for mpsc::Sender<RelayFrame> {
    fn is_connected(&self) -> bool {
        !self.is_closed()
    }

    async fn send(&mut self, frame: RelayFrame) -> bool {
        mpsc::Sender::send(self, frame).await.is_ok()
    }
}

fn interrupted(forwarded: usize) -> RelayOutcome {
    tracing::warn!(forwarded, "Streaming progress has been interrupted");
    RelayOutcome::Cancelled { forwarded }
}

fn disconnected(forwarded: usize) -> RelayOutcome {
    tracing::debug!(forwarded, "Client disconnected, stopping relay");
    RelayOutcome::Disconnected { forwarded }
}

/// Pull `events` into `sink` until the graph ends, the client leaves, or `cancel` fires
pub async fn relay<S, K>(events: S, sink: &mut K, cancel: &CancellationToken) -> RelayOutcome
where
    S: Stream<Item = Result<GraphEvent>>,
    K: FrameSink + ?Sized,
{
    futures::pin_mut!(events);
    let mut forwarded = 0usize;

    loop {
        if !sink.is_connected() {
            return disconnected(forwarded);
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return interrupted(forwarded),
            item = events.next() => item,
        };

        let frame = match next {
            None => return RelayOutcome::Completed { forwarded },
            Some(Ok(event)) => match event.to_json() {
                Ok(value) => RelayFrame::Event(value.to_string()),
                Err(e) => RelayFrame::Error(format!("Failed to encode event from '{}': {}", event.node, e)),
            },
            Some(Err(e)) => RelayFrame::Error(format!("{:#}", e)),
        };
        let is_error = frame.is_error();
        if let RelayFrame::Error(message) = &frame {
            tracing::error!(error = %message, forwarded, "Graph stream failed");
        }

        let delivered = tokio::select! {
            biased;
            _ = cancel.cancelled() => return interrupted(forwarded),
            delivered = sink.send(frame) => delivered,
        };

        if !delivered {
            return disconnected(forwarded);
        }
        if is_error {
            return RelayOutcome::Failed { forwarded };
        }
        forwarded += 1;
    }
}

/// Run [`relay`] on a background task and expose the frames as a stream.
///
/// The channel holds a single frame, so the graph advances only as fast as
/// the client reads. When `timeout` elapses the turn is cancelled.
pub fn spawn_relay<S>(events: S, cancel: CancellationToken, timeout: Option<Duration>) -> ReceiverStream<RelayFrame>
where
    S: Stream<Item = Result<GraphEvent>> + Send + 'static,
{
    let (mut tx, rx) = mpsc::channel(1);

    if let Some(timeout) = timeout {
        let watchdog = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    tracing::warn!(timeout_secs = timeout.as_secs(), "Stream timeout reached");
                    watchdog.cancel();
                }
                _ = watchdog.cancelled() => {}
            }
        });
    }

    tokio::spawn(async move {
        let outcome = relay(events, &mut tx, &cancel).await;
        tracing::info!(?outcome, "Relay finished");
        // Releases the watchdog
        cancel.cancel();
    });

    ReceiverStream::new(rx)
}
