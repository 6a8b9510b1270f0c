//! Realtime channel ports.
//!
//! The engine never touches a WebSocket directly. It asks a [`Connector`]
//! for a [`Transport`] and drives it from a per-socket task, so tests can
//! substitute scripted transports.

use async_trait::async_trait;

use super::{
    error::TransportError,
    identity::ParticipantIdentity,
    value_object::{ParticipantId, SessionKey},
};

/// Outbound heartbeat text.
pub const HEARTBEAT_PING: &str = "ping";

/// Inbound heartbeat acknowledgment text.
pub const HEARTBEAT_PONG: &str = "pong";

/// Where and as whom to open a realtime connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAddress {
    pub session_key: SessionKey,
    pub participant_id: ParticipantId,
    pub participant_name: String,
    pub participant_email: Option<String>,
}

impl ChannelAddress {
    pub fn new(identity: &ParticipantIdentity, session_key: &SessionKey) -> Self {
        Self {
            session_key: session_key.clone(),
            participant_id: identity.participant_id.clone(),
            participant_name: identity.display_name.clone(),
            participant_email: identity.email.clone(),
        }
    }
}

/// A connected, text-oriented realtime channel.
///
/// `recv` must be cancel-safe: it is raced against timers in `select!`.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Next inbound text frame. `None` once the channel has closed.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens realtime connections.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, address: &ChannelAddress) -> Result<Box<dyn Transport>, TransportError>;
}
