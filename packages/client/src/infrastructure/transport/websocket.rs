//! WebSocket transport backed by tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use crate::domain::{ChannelAddress, Connector, Transport, TransportError};

/// Build the realtime channel URL:
/// `{base}/{session_key}/{participant_id}?participant_name=..&participant_email=..`
pub fn channel_url(base_url: &str, address: &ChannelAddress) -> Result<Url, TransportError> {
    let mut url =
        Url::parse(base_url).map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;

    url.path_segments_mut()
        .map_err(|_| TransportError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .push(address.session_key.as_str())
        .push(address.participant_id.as_str());

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("participant_name", &address.participant_name);
        query.append_pair(
            "participant_email",
            address.participant_email.as_deref().unwrap_or(""),
        );
    }

    Ok(url)
}

/// Opens WebSocket connections under a base URL such as `ws://host/ws`.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    base_url: String,
}

impl WebSocketConnector {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, address: &ChannelAddress) -> Result<Box<dyn Transport>, TransportError> {
        let url = channel_url(&self.base_url, address)?;
        tracing::debug!("Opening realtime channel {}", url);

        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        tracing::debug!(
            "Realtime channel handshake completed with status {}",
            response.status()
        );

        Ok(Box::new(WebSocketTransport::new(stream)))
    }
}

/// A connected WebSocket.
///
/// After a receive error the stream is treated as closed, so the next
/// `recv` yields `None` instead of repeating the error.
pub struct WebSocketTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    failed: bool,
}

impl WebSocketTransport {
    pub fn new(stream: WebSocketStream<MaybeTlsStream<TcpStream>>) -> Self {
        Self {
            stream,
            failed: false,
        }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        if self.failed {
            return None;
        }

        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Binary(data)) => {
                    tracing::debug!("Ignoring {} bytes of binary data", data.len());
                }
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server closed the connection: {:?}", frame);
                    return None;
                }
                // Ping / Pong / raw frames are handled by tungstenite itself.
                Ok(_) => {}
                Err(e) => {
                    self.failed = true;
                    return Some(Err(TransportError::Receive(e.to_string())));
                }
            }
        }

        None
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}
