//! WebSocket transport to the device.
//!
//! [`connect`] performs the handshake and splits the stream into two tasks:
//!
//! ```text
//!             ┌──────────── reader task ────────────┐
//!  device ──► │ Text → TransportEvent::Message      │ ──► event loop
//!             │ Close / error / EOF → Closed        │
//!             └─────────────────────────────────────┘
//!             ┌──────────── writer task ────────────┐
//!  device ◄── │ String → Text frame                 │ ◄── ChannelSink
//!             │ all senders dropped → Close frame   │
//!             └─────────────────────────────────────┘
//! ```
//!
//! `TransportEvent::Opened` is queued before the reader task starts, so it is
//! always the first event the loop sees.
//!
//! The application layer only ever sees a [`ChannelSink`] and a receiver of
//! [`TransportEvent`]s, so it never depends on tokio-tungstenite.

use std::fmt::Display;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, info, trace, warn};

use motorlink_core::{CommandSink, SendError};

use crate::application::TransportEvent;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can occur while opening the connection.
#[derive(Debug, Error)]
pub enum TransportError {
    /// TCP connect or WebSocket handshake failed.
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: WsError,
    },
}

// ── Outbound sink ─────────────────────────────────────────────────────────────

/// [`CommandSink`] that hands frames to the writer task.
///
/// Never blocks.  Once the writer task has stopped every send fails with
/// [`SendError::Closed`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Wraps the sending half of a writer channel.
    pub fn new(tx: mpsc::UnboundedSender<String>) -> Self {
        Self { tx }
    }
}

impl CommandSink for ChannelSink {
    fn send_text(&mut self, text: String) -> Result<(), SendError> {
        self.tx.send(text).map_err(|_| SendError::Closed)
    }
}

// ── Connection ────────────────────────────────────────────────────────────────

/// An open connection, already split into its channel ends.
#[derive(Debug)]
pub struct WsConnection {
    /// Outbound frames.  Drop every clone to close the connection.
    pub sink: ChannelSink,
    /// Inbound events, starting with `Opened` and ending with `Closed`.
    pub events: mpsc::Receiver<TransportEvent>,
    /// Finishes after the Close frame has been sent.
    pub writer: JoinHandle<()>,
    /// Finishes after the connection is gone.
    pub reader: JoinHandle<()>,
}

/// Opens a WebSocket connection to `url`.
///
/// `event_capacity` bounds the inbound event channel.  When the event loop
/// falls behind, the reader waits instead of buffering without limit.
///
/// # Errors
///
/// Returns [`TransportError::Connect`] if the TCP connection or the
/// WebSocket handshake fails.
pub async fn connect(url: &str, event_capacity: usize) -> Result<WsConnection, TransportError> {
    let (ws_stream, response) =
        connect_async(url)
            .await
            .map_err(|source| TransportError::Connect {
                url: url.to_string(),
                source,
            })?;
    info!("connected to {url} (HTTP {})", response.status());

    let (ws_tx, ws_rx) = ws_stream.split();
    let (event_tx, events) = mpsc::channel(event_capacity.max(1));
    let (out_tx, out_rx) = mpsc::unbounded_channel();

    // The receiver is held locally, so this cannot fail.
    let _ = event_tx.send(TransportEvent::Opened).await;

    let reader = tokio::spawn(read_frames(ws_rx, event_tx));
    let writer = tokio::spawn(write_frames(ws_tx, out_rx));

    Ok(WsConnection {
        sink: ChannelSink::new(out_tx),
        events,
        writer,
        reader,
    })
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

/// Forwards inbound frames as [`TransportEvent`]s until the connection ends,
/// then sends `Closed`.
pub async fn read_frames<R>(mut ws_rx: R, event_tx: mpsc::Sender<TransportEvent>)
where
    R: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    loop {
        let ws_msg = match ws_rx.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                debug!("WebSocket closed");
                break;
            }
            Some(Err(e)) => {
                warn!("WebSocket error: {e}");
                break;
            }
            None => {
                debug!("WebSocket stream ended");
                break;
            }
        };

        match ws_msg {
            WsMessage::Text(text) => {
                if event_tx.send(TransportEvent::Message(text)).await.is_err() {
                    debug!("event loop gone; reader stopping");
                    return;
                }
            }
            WsMessage::Binary(_) => {
                warn!("unexpected binary WebSocket frame (ignored)");
            }
            WsMessage::Ping(data) => {
                trace!("WebSocket ping ({} bytes)", data.len());
            }
            WsMessage::Pong(_) => {
                trace!("WebSocket pong received");
            }
            WsMessage::Close(frame) => {
                debug!("WebSocket Close frame received: {frame:?}");
                break;
            }
            WsMessage::Frame(_) => {
                trace!("raw frame (ignored)");
            }
        }
    }

    let _ = event_tx.send(TransportEvent::Closed).await;
}

/// Writes queued frames as Text messages.  When every sender is dropped,
/// sends a Close frame and closes the sink.
pub async fn write_frames<W>(mut ws_tx: W, mut out_rx: mpsc::UnboundedReceiver<String>)
where
    W: Sink<WsMessage> + Unpin,
    W::Error: Display,
{
    while let Some(text) = out_rx.recv().await {
        if let Err(e) = ws_tx.send(WsMessage::Text(text)).await {
            debug!("WebSocket write failed: {e}");
            return;
        }
    }

    debug!("sending WebSocket Close frame");
    if let Err(e) = ws_tx.send(WsMessage::Close(None)).await {
        debug!("failed to send Close frame: {e}");
    }
    let _ = ws_tx.close().await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn test_channel_sink_forwards_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx);

        sink.send_text("hello".to_string()).unwrap();

        assert_eq!(rx.try_recv().unwrap(), "hello");
    }

    #[test]
    fn test_channel_sink_reports_closed_after_writer_stops() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sink = ChannelSink::new(tx);
        drop(rx);

        assert_eq!(sink.send_text("late".to_string()), Err(SendError::Closed));
    }

    #[tokio::test]
    async fn test_read_frames_forwards_text_and_ends_with_closed() {
        // Arrange: text, a binary frame to ignore, more text, then Close
        let frames = stream::iter(vec![
            Ok(WsMessage::Text("one".to_string())),
            Ok(WsMessage::Binary(vec![1, 2, 3])),
            Ok(WsMessage::Text("two".to_string())),
            Ok(WsMessage::Close(None)),
            Ok(WsMessage::Text("after close".to_string())),
        ]);
        let (event_tx, mut event_rx) = mpsc::channel(8);

        // Act
        read_frames(frames, event_tx).await;

        // Assert
        let mut events = Vec::new();
        while let Some(event) = event_rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                TransportEvent::Message("one".to_string()),
                TransportEvent::Message("two".to_string()),
                TransportEvent::Closed,
            ]
        );
    }

    #[tokio::test]
    async fn test_read_frames_treats_stream_error_as_closed() {
        let frames = stream::iter(vec![Err(WsError::ConnectionClosed)]);
        let (event_tx, mut event_rx) = mpsc::channel(2);

        read_frames(frames, event_tx).await;

        assert_eq!(event_rx.recv().await, Some(TransportEvent::Closed));
    }
}
