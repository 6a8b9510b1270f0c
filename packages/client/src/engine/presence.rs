//! Session presence channel.
//!
//! ## 責務
//!
//! - (session, participant) ごとに高々 1 本のリアルタイム接続を保持する
//! - 接続に成功したセッションキーを永続化し、再起動後の自動再参加に使う
//! - ソケットタスクからのイベントを解釈し、エンジンへのシグナルに変換する
//!
//! ## 設計ノート
//!
//! 新しい接続を開く前に必ず既存の接続を閉じます。ソケットごとに新しい
//! [`SocketId`] を割り当て、[`ConnectionState`] に記録された ID 以外からの
//! イベントはすべて破棄します。

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{
    domain::{
        ACTIVE_SESSION_STORAGE_KEY, ChannelAddress, ConnectionState, Connector, KeyValueStore,
        ParticipantIdentity, QuizEvent, RosterChange, RosterUpdate, SessionKey, SocketId,
        TransportError,
    },
    infrastructure::dto::websocket::{InboundFrame, InboundMessage, parse_inbound},
};

use super::socket::{ChannelEvent, SocketHandle};

/// Result of a join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Already open for the requested session; nothing was done.
    AlreadyOpen,
    /// A new connection was opened.
    Opened,
}

/// What a channel event means for the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceSignal {
    Quiz(QuizEvent),
    MeetingEnded(SessionKey),
    Roster(RosterUpdate),
    TransportError(String),
    /// The authoritative socket closed without a `leave`.
    ConnectionLost(SessionKey),
    /// Heartbeat acknowledgment, unrecognized message, or stale socket.
    Ignored,
}

pub struct PresenceChannel {
    identity: ParticipantIdentity,
    connector: Arc<dyn Connector>,
    storage: Arc<dyn KeyValueStore>,
    heartbeat_interval: Duration,
    state: ConnectionState,
    socket: Option<SocketHandle>,
    last_socket_id: SocketId,
    channel_tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl PresenceChannel {
    /// Create a channel. Socket events are delivered to `channel_tx`.
    pub fn new(
        identity: ParticipantIdentity,
        connector: Arc<dyn Connector>,
        storage: Arc<dyn KeyValueStore>,
        heartbeat_interval: Duration,
        channel_tx: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Self {
        Self {
            identity,
            connector,
            storage,
            heartbeat_interval,
            state: ConnectionState::default(),
            socket: None,
            last_socket_id: SocketId::new(0),
            channel_tx,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn connected_session_key(&self) -> Option<&SessionKey> {
        self.state.connected_session_key()
    }

    /// Open the channel for `session_key`.
    ///
    /// Any existing connection is closed first. On failure the state returns
    /// to `Disconnected` and the durable session key is left as it was.
    pub async fn join(&mut self, session_key: SessionKey) -> Result<JoinOutcome, TransportError> {
        if self.state.is_open_for(&session_key) {
            tracing::debug!("Already connected to session {}", session_key);
            return Ok(JoinOutcome::AlreadyOpen);
        }

        self.close_socket().await;

        let socket_id = self.last_socket_id.next();
        self.last_socket_id = socket_id;
        self.state.begin_connect(session_key.clone(), socket_id);

        let address = ChannelAddress::new(&self.identity, &session_key);
        tracing::info!(
            "Connecting to session {} as '{}' ({})",
            session_key,
            self.identity.participant_id,
            socket_id
        );

        let transport = match self.connector.connect(&address).await {
            Ok(transport) => transport,
            Err(e) => {
                tracing::warn!("Failed to connect to session {}: {}", session_key, e);
                self.state.reset();
                return Err(e);
            }
        };

        self.state.mark_open(socket_id);
        self.socket = Some(SocketHandle::spawn(
            socket_id,
            transport,
            self.heartbeat_interval,
            self.channel_tx.clone(),
        ));

        if let Err(e) = self
            .storage
            .set(ACTIVE_SESSION_STORAGE_KEY, session_key.as_str())
        {
            tracing::warn!("Failed to persist session key: {}", e);
        }

        tracing::info!("Connected to session {} ({})", session_key, socket_id);
        Ok(JoinOutcome::Opened)
    }

    /// Close the connection and forget the session, durably.
    pub async fn leave(&mut self) {
        self.close_socket().await;

        if let Err(e) = self.storage.remove(ACTIVE_SESSION_STORAGE_KEY) {
            tracing::warn!("Failed to clear persisted session key: {}", e);
        }
        self.state.reset();
    }

    /// Close the connection but keep the durable session key.
    pub async fn disconnect(&mut self) {
        self.close_socket().await;
        self.state.reset();
    }

    /// Session to rejoin automatically at startup, if any.
    ///
    /// Only roles that auto-rejoin qualify, and a session that is already
    /// open is not rejoined.
    pub fn rejoin_candidate(&self) -> Option<SessionKey> {
        if !self.identity.role.auto_rejoins() {
            return None;
        }

        let stored = match self.storage.get(ACTIVE_SESSION_STORAGE_KEY) {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!("Failed to read persisted session key: {}", e);
                return None;
            }
        };

        match SessionKey::new(stored) {
            Ok(key) if self.state.is_open_for(&key) => None,
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!("Ignoring invalid persisted session key: {}", e);
                None
            }
        }
    }

    /// Interpret one socket event.
    pub fn handle_event(&mut self, event: ChannelEvent) -> PresenceSignal {
        if !self.state.is_authoritative(event.socket()) {
            tracing::debug!("Dropping event from stale {}", event.socket());
            return PresenceSignal::Ignored;
        }

        match event {
            ChannelEvent::Message { text, .. } => self.handle_message(&text),
            ChannelEvent::Error { reason, .. } => PresenceSignal::TransportError(reason),
            ChannelEvent::Closed { socket } => {
                let session_key = self.state.session_key().cloned();
                self.state.on_closed(socket);
                self.socket = None;
                match session_key {
                    Some(key) => {
                        tracing::info!("Connection to session {} lost", key);
                        PresenceSignal::ConnectionLost(key)
                    }
                    None => PresenceSignal::Ignored,
                }
            }
        }
    }

    fn handle_message(&self, text: &str) -> PresenceSignal {
        let Some(session_key) = self.state.connected_session_key() else {
            return PresenceSignal::Ignored;
        };

        match parse_inbound(text) {
            InboundFrame::Pong | InboundFrame::Unrecognized => PresenceSignal::Ignored,
            InboundFrame::Message(InboundMessage::Quiz(payload)) => {
                PresenceSignal::Quiz(payload.into_event(session_key))
            }
            InboundFrame::Message(InboundMessage::MeetingEnded) => {
                PresenceSignal::MeetingEnded(session_key.clone())
            }
            InboundFrame::Message(InboundMessage::ParticipantJoined(payload)) => {
                PresenceSignal::Roster(payload.into_update(RosterChange::Joined, text))
            }
            InboundFrame::Message(InboundMessage::ParticipantLeft(payload)) => {
                PresenceSignal::Roster(payload.into_update(RosterChange::Left, text))
            }
        }
    }

    async fn close_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            tracing::debug!("Closing {}", socket.id());
            socket.close().await;
        }
    }
}
