//! Agent WebSocket Link
//!
//! Connects to the learning agent and bridges its socket onto two mpsc
//! channels so the simulation loop never awaits the network. A dropped
//! connection or an unreadable frame simply means no message arrives.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::network::protocol::{AgentInbound, AgentOutbound};

/// Channel depth in each direction.
const CHANNEL_CAPACITY: usize = 256;

/// Agent link errors.
#[derive(Debug, Error)]
pub enum AgentLinkError {
    /// Could not open the socket.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Writer task is gone.
    #[error("Agent link closed")]
    Closed,

    /// Outbound queue is full; message dropped.
    #[error("Agent link backlogged")]
    Backlogged,
}

/// Live connection to the agent.
pub struct AgentLink {
    outgoing: mpsc::Sender<AgentOutbound>,
    incoming: mpsc::Receiver<AgentInbound>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl AgentLink {
    /// Connect to `url` and start the reader and writer tasks.
    pub async fn connect(url: &str) -> Result<Self, AgentLinkError> {
        info!("Connecting to agent at {}...", url);
        let (ws_stream, _) = connect_async(url).await?;
        info!("Agent connected");

        let (mut write, mut read) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<AgentOutbound>(CHANNEL_CAPACITY);
        let (incoming_tx, incoming_rx) = mpsc::channel::<AgentInbound>(CHANNEL_CAPACITY);

        let reader = tokio::spawn(async move {
            while let Some(msg_result) = read.next().await {
                match msg_result {
                    Ok(Message::Text(text)) => match AgentInbound::parse(&text) {
                        Ok(message) => {
                            if incoming_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Failed to parse agent message: {} - {}", e, text);
                        }
                    },
                    Ok(Message::Close(_)) => {
                        info!("Agent closed connection");
                        break;
                    }
                    Err(e) => {
                        error!("WebSocket read error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            debug!("Agent reader ended");
        });

        let writer = tokio::spawn(async move {
            while let Some(message) = outgoing_rx.recv().await {
                let json = match message.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to encode agent message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json)).await {
                    error!("Failed to send agent message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
            debug!("Agent writer ended");
        });

        Ok(Self {
            outgoing: outgoing_tx,
            incoming: incoming_rx,
            reader,
            writer,
        })
    }

    /// Queue a message without waiting.
    pub fn send(&self, message: AgentOutbound) -> Result<(), AgentLinkError> {
        self.outgoing.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AgentLinkError::Backlogged,
            mpsc::error::TrySendError::Closed(_) => AgentLinkError::Closed,
        })
    }

    /// Next inbound message; `None` once the agent is gone.
    pub async fn recv(&mut self) -> Option<AgentInbound> {
        self.incoming.recv().await
    }

    /// Whether the socket is still being read.
    pub fn is_connected(&self) -> bool {
        !self.reader.is_finished() && !self.writer.is_finished()
    }
}

impl Drop for AgentLink {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tokio_tungstenite::accept_async;

    #[tokio::test]
    async fn test_link_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let agent = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            ws.send(Message::Text("garbage".to_string())).await.unwrap();
            ws.send(Message::Text(r#"{"event":"new_generation","data":3}"#.to_string()))
                .await
                .unwrap();

            loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => return text,
                    Some(Ok(_)) => continue,
                    other => panic!("unexpected frame: {:?}", other),
                }
            }
        });

        let mut link = AgentLink::connect(&format!("ws://{}", addr)).await.unwrap();
        // The malformed frame is skipped
        assert_eq!(link.recv().await, Some(AgentInbound::NewGeneration(3)));

        link.send(AgentOutbound::ModelInit(3)).unwrap();
        let received = agent.await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&received).unwrap();
        assert_eq!(json["event"], "model_init");
        assert_eq!(json["data"], 3);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = AgentLink::connect(&format!("ws://{}", addr)).await;
        assert!(matches!(result, Err(AgentLinkError::WebSocket(_))));
    }
}
