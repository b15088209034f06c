//! # Transport Module
//!
//! Delivers semantic frames to the remote listener over a persistent WebSocket.
//!
//! `emit` never touches the network. It encodes the frame and pushes it onto a
//! bounded queue; a background task owns the connection and writes queued
//! frames in order. When the queue is full the frame is dropped, so the
//! sampling loop never stalls behind a slow listener. Delivery is at-most-once:
//! nothing is acknowledged or retried.
//!
//! ## Connection Lifecycle
//!
//! 1. [`WebSocketTransport::connect`] opens the first connection (fails fast)
//! 2. Frames flow until the listener hangs up or a write fails
//! 3. The task retries every `reconnect_interval`, discarding frames meanwhile
//! 4. Dropping the transport closes the connection
//!
//! Messages pushed by the listener are logged at debug level.
//!
//! ## Wire Format
//!
//! One JSON text message per frame, tagged with the event name:
//!
//! ```json
//! {"event": "gamepad_input", "buttons": {"jump": true}, "axes": {"steer": 0.5}}
//! ```

use futures::{SinkExt, StreamExt};
use serde::Serialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::{PadlinkError, Result};
use crate::mapping::SemanticFrame;

/// Default event name carried by every frame.
pub const DEFAULT_EVENT_NAME: &str = "gamepad_input";

type ListenerStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One-way, non-blocking frame sink.
pub trait Transport: Send {
    /// Hands `frame` to the channel under `event`.
    ///
    /// Must return immediately. An error means this frame was dropped; the
    /// caller is not expected to retry.
    fn emit(&self, event: &str, frame: &SemanticFrame) -> Result<()>;
}

#[derive(Serialize)]
struct Envelope<'a> {
    event: &'a str,
    #[serde(flatten)]
    data: &'a SemanticFrame,
}

/// Encodes one event-tagged frame as a JSON text message.
pub fn encode_event(event: &str, frame: &SemanticFrame) -> Result<String> {
    Ok(serde_json::to_string(&Envelope { event, data: frame })?)
}

/// WebSocket transport to a fixed listener URL.
#[derive(Debug)]
pub struct WebSocketTransport {
    queue: mpsc::Sender<String>,
    url: String,
}

impl WebSocketTransport {
    /// Connects to `url` and starts the writer task.
    ///
    /// `queue_capacity` bounds the frames waiting to be written; extra frames
    /// are dropped by [`Transport::emit`].
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the first connection cannot be established.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use padlink::transport::WebSocketTransport;
    /// use std::time::Duration;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let transport =
    ///         WebSocketTransport::connect("ws://127.0.0.1:8000/ws", 8, Duration::from_secs(1)).await?;
    ///     println!("Streaming to {}", transport.url());
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(url: &str, queue_capacity: usize, reconnect_interval: Duration) -> Result<Self> {
        let stream = open(url).await?;
        info!("Streaming frames to {}", url);

        let (queue, frames) = mpsc::channel(queue_capacity.max(1));
        tokio::spawn(run_channel(url.to_string(), stream, frames, reconnect_interval));

        Ok(Self {
            queue,
            url: url.to_string(),
        })
    }

    /// Listener URL frames are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WebSocketTransport {
    fn emit(&self, event: &str, frame: &SemanticFrame) -> Result<()> {
        let text = encode_event(event, frame)?;
        self.queue.try_send(text).map_err(queue_error)
    }
}

fn queue_error(error: TrySendError<String>) -> PadlinkError {
    match error {
        TrySendError::Full(_) => PadlinkError::Transport("Send queue full, frame dropped".to_string()),
        TrySendError::Closed(_) => PadlinkError::Transport("Listener channel closed".to_string()),
    }
}

async fn open(url: &str) -> Result<ListenerStream> {
    let (stream, _response) = connect_async(url)
        .await
        .map_err(|e| PadlinkError::Transport(format!("Failed to connect to {}: {}", url, e)))?;
    Ok(stream)
}

/// How one connection ended.
enum SessionEnd {
    /// The listener went away; reconnect.
    Lost,
    /// The transport was dropped; stop.
    Closed,
}

/// Owns the connection for the lifetime of the transport.
async fn run_channel(
    url: String,
    mut stream: ListenerStream,
    mut frames: mpsc::Receiver<String>,
    reconnect_interval: Duration,
) {
    loop {
        if let SessionEnd::Closed = run_session(stream, &mut frames).await {
            debug!("Transport dropped, connection to {} closed", url);
            return;
        }

        stream = match reconnect(&url, &mut frames, reconnect_interval).await {
            Some(stream) => stream,
            None => return,
        };
    }
}

async fn run_session(stream: ListenerStream, frames: &mut mpsc::Receiver<String>) -> SessionEnd {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("Listener connection lost: {}", e);
                        return SessionEnd::Lost;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    return SessionEnd::Closed;
                }
            },

            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => debug!("Listener message: {}", text),
                Some(Ok(Message::Ping(payload))) => {
                    let _ = sink.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    warn!("Listener closed the connection");
                    return SessionEnd::Lost;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("Listener connection lost: {}", e);
                    return SessionEnd::Lost;
                }
            },
        }
    }
}

/// Retries until connected, discarding queued frames while offline.
///
/// Returns `None` once the transport has been dropped.
async fn reconnect(
    url: &str,
    frames: &mut mpsc::Receiver<String>,
    reconnect_interval: Duration,
) -> Option<ListenerStream> {
    let mut discarded: u64 = 0;

    loop {
        let pause = tokio::time::sleep(reconnect_interval);
        tokio::pin!(pause);

        loop {
            tokio::select! {
                _ = &mut pause => break,
                frame = frames.recv() => match frame {
                    Some(_) => discarded += 1,
                    None => return None,
                },
            }
        }

        match open(url).await {
            Ok(stream) => {
                info!("Reconnected to {} ({} frames dropped while offline)", url, discarded);
                return Some(stream);
            }
            Err(e) => debug!("Listener still unreachable: {}", e),
        }
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Transport that records every emitted frame.
    #[derive(Clone, Default)]
    pub struct RecordingTransport {
        pub sent: Arc<Mutex<Vec<(String, SemanticFrame)>>>,
        pub fail: Arc<Mutex<bool>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn frames(&self) -> Vec<SemanticFrame> {
            self.sent.lock().unwrap().iter().map(|(_, f)| f.clone()).collect()
        }

        pub fn events(&self) -> Vec<String> {
            self.sent.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
        }

        pub fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }
    }

    impl Transport for RecordingTransport {
        fn emit(&self, event: &str, frame: &SemanticFrame) -> Result<()> {
            if *self.fail.lock().unwrap() {
                return Err(PadlinkError::Transport("Mock send error".to_string()));
            }
            self.sent
                .lock()
                .unwrap()
                .push((event.to_string(), frame.clone()));
            Ok(())
        }
    }
}
