//! Chat echo over a post's comment channel.
//!
//! DESIGN
//! ======
//! One websocket per channel, split in two halves:
//! - `ChatReceiver::pump` appends every inbound text frame to a
//!   `MessageLog`, in arrival order, one entry per frame.
//! - `ChatSender::send` queues a text frame for a writer task. Sends are
//!   fire-and-forget: no acknowledgement and no backpressure.
//!
//! There is no reconnection. When the socket closes or errors, `pump`
//! returns and later sends are dropped.

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info};

use crate::config::{ClientConfig, ConfigError};
use crate::page::MessageLog;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Opens comment channels on one server.
#[derive(Debug, Clone, Default)]
pub struct ChatClient {
    config: ClientConfig,
}

impl ChatClient {
    #[must_use]
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Join the comment channel of post `pid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL has no websocket equivalent or the
    /// handshake fails.
    pub async fn join(&self, pid: i64) -> Result<(ChatSender, ChatReceiver), ChatError> {
        let url = self.config.channel_url(pid)?;
        connect(&url).await
    }
}

/// Open a websocket at `url` and split it into sender and receiver halves.
///
/// # Errors
///
/// Returns `ChatError::Connect` if the handshake fails.
pub async fn connect(url: &str) -> Result<(ChatSender, ChatReceiver), ChatError> {
    let (socket, _) = connect_async(url)
        .await
        .map_err(|e| ChatError::Connect(Box::new(e)))?;
    info!(%url, "chat: connected");

    let (mut sink, stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = sink.send(Message::Text(text.into())).await {
                debug!(error = %e, "chat: send failed, writer stopping");
                return;
            }
        }
        let _ = sink.close().await;
    });

    Ok((ChatSender { tx }, ChatReceiver { stream }))
}

/// Sending half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChatSender {
    tx: mpsc::UnboundedSender<String>,
}

impl ChatSender {
    /// Transmit `text` as one frame.
    pub fn send(&self, text: &str) {
        if self.tx.send(text.to_owned()).is_err() {
            debug!("chat: socket closed, dropping frame");
        }
    }
}

/// Receiving half.
pub struct ChatReceiver {
    stream: SplitStream<Socket>,
}

impl ChatReceiver {
    /// Append inbound text frames to `log` until the socket closes or
    /// errors. Returns the number of frames appended.
    pub async fn pump(&mut self, log: &mut dyn MessageLog) -> usize {
        let mut appended = 0_usize;
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    log.append(text.as_str());
                    appended = appended.saturating_add(1);
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "chat: receive failed");
                    break;
                }
            }
        }
        info!(appended, "chat: channel closed");
        appended
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
