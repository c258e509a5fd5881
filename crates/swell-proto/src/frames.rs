//! Gateway frame definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ProtoError;
use crate::events::{DispatchEvent, Presence};

/// Protocol version advertised in identify frames.
pub const PROTOCOL_VERSION: u32 = 1;

/// Frames sent from gateway to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ServerFrame {
    /// First frame of every connection.
    Hello {
        /// Heartbeat cadence in milliseconds.
        heartbeat_interval_ms: u64,
    },
    /// Application event.
    Dispatch {
        /// Sequence number.
        seq: u64,
        /// Event envelope.
        event: DispatchEvent,
    },
    /// Demand for an immediate heartbeat.
    HeartbeatRequest {
        /// Sequence number to echo.
        seq: u64,
    },
    /// Instruction to drop the connection and resume.
    Reconnect,
    /// Session rejected.
    InvalidSession {
        /// Whether the session can still be resumed.
        resumable: bool,
    },
    /// Heartbeat acknowledgement.
    HeartbeatAck {
        /// Server time, omitted by older gateway versions.
        #[serde(default)]
        server_time: Option<DateTime<Utc>>,
    },
}

impl ServerFrame {
    /// Create a hello frame.
    #[must_use]
    pub const fn hello(heartbeat_interval_ms: u64) -> Self {
        Self::Hello {
            heartbeat_interval_ms,
        }
    }

    /// Create a dispatch frame.
    #[must_use]
    pub const fn dispatch(seq: u64, event: DispatchEvent) -> Self {
        Self::Dispatch { seq, event }
    }

    /// Create a heartbeat request.
    #[must_use]
    pub const fn heartbeat_request(seq: u64) -> Self {
        Self::HeartbeatRequest { seq }
    }

    /// Create an invalid-session frame.
    #[must_use]
    pub const fn invalid_session(resumable: bool) -> Self {
        Self::InvalidSession { resumable }
    }

    /// Create a heartbeat ack stamped with the current time.
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self::HeartbeatAck {
            server_time: Some(Utc::now()),
        }
    }

    /// Frame kind tag, as it appears on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Dispatch { .. } => "dispatch",
            Self::HeartbeatRequest { .. } => "heartbeat_request",
            Self::Reconnect => "reconnect",
            Self::InvalidSession { .. } => "invalid_session",
            Self::HeartbeatAck { .. } => "heartbeat_ack",
        }
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

/// Frames sent from client to gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ClientFrame {
    /// Open a brand-new session.
    Identify {
        /// Account token.
        token: String,
        /// Event-class subscription bitmask.
        intents: u64,
        /// Protocol version.
        protocol_version: u32,
    },
    /// Continue an interrupted session.
    Resume {
        /// Account token.
        token: String,
        /// Session to resume.
        session_id: String,
        /// Last sequence number processed.
        seq: u64,
    },
    /// Keepalive.
    Heartbeat {
        /// Latest sequence number processed, zero when none.
        seq: u64,
    },
    /// Presence change.
    PresenceUpdate {
        /// New presence.
        presence: Presence,
    },
}

impl ClientFrame {
    /// Create an identify frame.
    #[must_use]
    pub fn identify(token: impl Into<String>, intents: u64) -> Self {
        Self::Identify {
            token: token.into(),
            intents,
            protocol_version: PROTOCOL_VERSION,
        }
    }

    /// Create a resume frame.
    #[must_use]
    pub fn resume(token: impl Into<String>, session_id: impl Into<String>, seq: u64) -> Self {
        Self::Resume {
            token: token.into(),
            session_id: session_id.into(),
            seq,
        }
    }

    /// Create a heartbeat frame.
    #[must_use]
    pub const fn heartbeat(seq: u64) -> Self {
        Self::Heartbeat { seq }
    }

    /// Create a presence-update frame.
    #[must_use]
    pub const fn presence_update(presence: Presence) -> Self {
        Self::PresenceUpdate { presence }
    }

    /// Frame kind tag, as it appears on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Identify { .. } => "identify",
            Self::Resume { .. } => "resume",
            Self::Heartbeat { .. } => "heartbeat",
            Self::PresenceUpdate { .. } => "presence_update",
        }
    }

    /// Validate frame contents before transmission.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is structurally invalid.
    pub fn validate(&self) -> Result<(), ProtoError> {
        match self {
            Self::Identify { token, .. } => {
                if token.is_empty() {
                    return Err(ProtoError::Validation("token cannot be empty".to_string()));
                }
            }
            Self::Resume {
                token, session_id, ..
            } => {
                if token.is_empty() {
                    return Err(ProtoError::Validation("token cannot be empty".to_string()));
                }
                if session_id.is_empty() {
                    return Err(ProtoError::Validation(
                        "session_id cannot be empty".to_string(),
                    ));
                }
            }
            Self::Heartbeat { .. } | Self::PresenceUpdate { .. } => {}
        }
        Ok(())
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(json).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}
