//! Inbound frame decoding.

use tracing::warn;

use swell_proto::ServerFrame;

use crate::error::TransportError;
use crate::transport::{ConnectionRx, RawMessage};

/// One item read from the gateway, after decoding.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Incoming {
    /// A well-formed gateway frame.
    Frame(ServerFrame),
    /// A text payload that failed to decode.
    ParseError(String),
    /// The gateway closed the connection.
    Closed {
        /// Close status code.
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

/// Read and decode the next item from the connection.
///
/// Transport failures propagate as errors; malformed payloads and close
/// notifications are data the session loop classifies itself.
pub(crate) async fn next_frame<R: ConnectionRx>(rx: &mut R) -> Result<Incoming, TransportError> {
    match rx.recv().await? {
        RawMessage::Text(text) => match ServerFrame::from_json(&text) {
            Ok(frame) => Ok(Incoming::Frame(frame)),
            Err(e) => {
                warn!(payload = %text, error = %e, "failed to decode gateway payload");
                Ok(Incoming::ParseError(e.to_string()))
            }
        },
        RawMessage::Closed { code, reason } => Ok(Incoming::Closed { code, reason }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Read half that replays a fixed script.
    struct ScriptRx {
        script: VecDeque<Result<RawMessage, TransportError>>,
    }

    impl ScriptRx {
        fn new(script: Vec<Result<RawMessage, TransportError>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl ConnectionRx for ScriptRx {
        async fn recv(&mut self) -> Result<RawMessage, TransportError> {
            self.script
                .pop_front()
                .unwrap_or(Err(TransportError::AbruptEnd))
        }
    }

    #[tokio::test]
    async fn test_text_decodes_to_frame() {
        let mut rx = ScriptRx::new(vec![Ok(RawMessage::Text(
            r#"{"op": "hello", "heartbeat_interval_ms": 45000}"#.to_string(),
        ))]);

        let incoming = next_frame(&mut rx).await.expect("should read");
        assert_eq!(
            incoming,
            Incoming::Frame(ServerFrame::hello(45_000))
        );
    }

    #[tokio::test]
    async fn test_malformed_text_becomes_parse_error() {
        let mut rx = ScriptRx::new(vec![Ok(RawMessage::Text("not json".to_string()))]);

        let incoming = next_frame(&mut rx).await.expect("should read");
        assert!(matches!(incoming, Incoming::ParseError(_)));
    }

    #[tokio::test]
    async fn test_unknown_op_becomes_parse_error() {
        let mut rx = ScriptRx::new(vec![Ok(RawMessage::Text(
            r#"{"op": "mystery"}"#.to_string(),
        ))]);

        let incoming = next_frame(&mut rx).await.expect("should read");
        assert!(matches!(incoming, Incoming::ParseError(_)));
    }

    #[tokio::test]
    async fn test_close_passes_through() {
        let mut rx = ScriptRx::new(vec![Ok(RawMessage::Closed {
            code: 4006,
            reason: "session expired".to_string(),
        })]);

        let incoming = next_frame(&mut rx).await.expect("should read");
        assert_eq!(
            incoming,
            Incoming::Closed {
                code: 4006,
                reason: "session expired".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let mut rx = ScriptRx::new(vec![Err(TransportError::Stream("reset".to_string()))]);

        let result = next_frame(&mut rx).await;
        assert_eq!(result, Err(TransportError::Stream("reset".to_string())));
    }

    #[tokio::test]
    async fn test_exhausted_script_ends_abruptly() {
        let mut rx = ScriptRx::new(vec![]);

        let result = next_frame(&mut rx).await;
        assert_eq!(result, Err(TransportError::AbruptEnd));
    }
}
