//! Dispatch event envelope and presence payloads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the event that completes session establishment.
pub const READY_EVENT: &str = "ready";

/// One application-level event delivered by a dispatch frame.
///
/// The payload schema belongs to the event in question; the envelope only
/// carries the name and an opaque JSON value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchEvent {
    /// Event name (snake_case).
    pub name: String,
    /// Event payload.
    #[serde(default)]
    pub data: Value,
}

impl DispatchEvent {
    /// Create an event envelope.
    #[must_use]
    pub fn new(name: impl Into<String>, data: Value) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Check whether this is the session-establishing ready event.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.name == READY_EVENT
    }

    /// Session id carried by a ready event, if present.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.data.get("session_id").and_then(Value::as_str)
    }
}

/// Availability advertised to other users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    /// Active and reachable.
    Online,
    /// Connected but inactive.
    Idle,
    /// Connected, notifications suppressed.
    Busy,
    /// Appears offline.
    Offline,
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Busy => "busy",
            Self::Offline => "offline",
        };
        write!(f, "{s}")
    }
}

/// Presence announced on the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Presence {
    /// Availability status.
    pub status: PresenceStatus,
    /// Free-form activity text, if any.
    pub activity: Option<String>,
}

impl Presence {
    /// Create a presence with no activity.
    #[must_use]
    pub const fn new(status: PresenceStatus) -> Self {
        Self {
            status,
            activity: None,
        }
    }

    /// Set the activity text.
    #[must_use]
    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }
}
