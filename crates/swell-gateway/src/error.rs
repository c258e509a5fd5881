//! Error types for the swell-gateway crate.

use thiserror::Error;

/// Failures at the websocket transport boundary.
///
/// Messages are carried as strings so scripted transports in tests never
/// need to construct websocket library errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be opened.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The stream failed mid-read or mid-write.
    #[error("transport error: {0}")]
    Stream(String),

    /// The stream ended without a close notification.
    #[error("connection ended without close notification")]
    AbruptEnd,
}

/// Errors surfaced to the caller on the event stream.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway did not open the connection with a hello frame.
    #[error("could not connect: gateway did not greet with hello")]
    Handshake,

    /// An inbound payload could not be decoded.
    #[error("failed to decode gateway payload: {0}")]
    Parse(String),

    /// The gateway refused the configured intents.
    #[error("gateway rejected session: intents not authorized (close code {code})")]
    Forbidden {
        /// Close code reported by the gateway.
        code: u16,
    },

    /// The gateway closed the connection with an unrecognized code.
    #[error("gateway connection closed: code {code} ({reason})")]
    Closed {
        /// Close code reported by the gateway.
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

/// Errors returned by the public client API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The client has halted; frames can no longer be queued.
    #[error("gateway client is no longer running")]
    Halted,

    /// Configuration could not be loaded or failed validation.
    #[error("config error: {0}")]
    Config(String),
}
