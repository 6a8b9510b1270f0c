//! Roster notifications forwarded from the realtime channel.
//!
//! The engine does not track the roster; it only passes these through to
//! whoever renders the participant list.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    Joined,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterUpdate {
    pub change: RosterChange,
    /// Best-effort label of the participant (name, falling back to id)
    pub participant: Option<String>,
    /// Original message text for consumers that need the full payload
    pub raw: String,
}
