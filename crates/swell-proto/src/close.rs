//! Close-code interpretation for gateway connections.
//!
//! The gateway reports why it closed a connection through the websocket
//! close code. Codes fall into four families: resumable interruptions,
//! expired sessions that need a fresh identify, authorization refusals, and
//! everything else, which is fatal.

/// Normal closure.
pub const NORMAL: u16 = 1000;
/// Endpoint going away (server restart, load shed).
pub const GOING_AWAY: u16 = 1001;
/// Close frame carried no status code.
pub const NO_STATUS: u16 = 1005;
/// Unspecified server fault.
pub const UNKNOWN_ERROR: u16 = 4000;
/// The session can no longer be resumed; identify again.
pub const SESSION_EXPIRED: u16 = 4006;
/// The client answered a heartbeat with a stale sequence number.
pub const INVALID_SEQUENCE: u16 = 4007;
/// The account is not authorized for its configured intents.
pub const UNAUTHORIZED_INTENTS: u16 = 4014;

/// How the client should react to a connection close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosePolicy {
    /// Resume the interrupted session.
    Resume,
    /// Discard the session and identify from scratch.
    Fresh,
    /// Halt: the configured intents were refused.
    Forbidden,
    /// Halt: unclassified closure.
    Fatal,
}

impl ClosePolicy {
    /// Classify a close code.
    #[must_use]
    pub const fn for_code(code: u16) -> Self {
        match code {
            NORMAL | GOING_AWAY | UNKNOWN_ERROR | INVALID_SEQUENCE => Self::Resume,
            SESSION_EXPIRED => Self::Fresh,
            UNAUTHORIZED_INTENTS => Self::Forbidden,
            _ => Self::Fatal,
        }
    }

    /// Check whether this policy permanently ends the client.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Forbidden | Self::Fatal)
    }
}
