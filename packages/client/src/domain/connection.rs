//! Connection state machine for the presence channel.
//!
//! `Disconnected → Connecting → Open → Closed → Disconnected`
//!
//! `Closed` means the authoritative socket went away without a `leave`; it
//! keeps no session identity and behaves like `Disconnected` for `join`.
//!
//! Every socket gets a fresh [`SocketId`]. Only the socket id recorded here
//! is authoritative; events tagged with any other id come from a superseded
//! socket and must be dropped.

use std::fmt;

use super::value_object::SessionKey;

/// Identifier of one realtime connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketId(u64);

impl SocketId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "socket#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SocketStatus {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closed,
}

impl fmt::Display for SocketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SocketStatus::Disconnected => "disconnected",
            SocketStatus::Connecting => "connecting",
            SocketStatus::Open => "open",
            SocketStatus::Closed => "closed",
        };
        f.write_str(label)
    }
}

/// In-memory connection identity. Only `session_key` is ever persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionState {
    session_key: Option<SessionKey>,
    status: SocketStatus,
    socket: Option<SocketId>,
}

impl ConnectionState {
    pub fn session_key(&self) -> Option<&SessionKey> {
        self.session_key.as_ref()
    }

    pub fn status(&self) -> SocketStatus {
        self.status
    }

    pub fn socket(&self) -> Option<SocketId> {
        self.socket
    }

    pub fn is_open(&self) -> bool {
        self.status == SocketStatus::Open
    }

    /// Session key of the open connection, if any.
    pub fn connected_session_key(&self) -> Option<&SessionKey> {
        if self.is_open() {
            self.session_key.as_ref()
        } else {
            None
        }
    }

    pub fn is_open_for(&self, session_key: &SessionKey) -> bool {
        self.is_open() && self.session_key.as_ref() == Some(session_key)
    }

    pub fn is_authoritative(&self, socket: SocketId) -> bool {
        self.socket == Some(socket)
    }

    /// Start a new attempt. Any previous socket stops being authoritative.
    pub fn begin_connect(&mut self, session_key: SessionKey, socket: SocketId) {
        self.session_key = Some(session_key);
        self.status = SocketStatus::Connecting;
        self.socket = Some(socket);
    }

    /// Mark `socket` open. Ignored unless it is the pending attempt.
    pub fn mark_open(&mut self, socket: SocketId) -> bool {
        if self.status == SocketStatus::Connecting && self.is_authoritative(socket) {
            self.status = SocketStatus::Open;
            true
        } else {
            false
        }
    }

    /// Handle a close of `socket`.
    ///
    /// Returns `true` if the socket was authoritative and the state was
    /// cleared; a close from a stale socket leaves the state untouched.
    pub fn on_closed(&mut self, socket: SocketId) -> bool {
        if !self.is_authoritative(socket) {
            return false;
        }
        self.session_key = None;
        self.status = SocketStatus::Closed;
        self.socket = None;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
