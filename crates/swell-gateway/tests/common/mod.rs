//! Shared machinery for gateway integration tests.
//!
//! [`ScriptedConnector`] hands the client a sequence of fake connections,
//! each replaying a fixed feed of frames, closes, and faults. Everything
//! the client sends is captured with a timestamp so tests can assert on
//! ordering and pacing under a paused clock.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use swell_gateway::error::TransportError;
use swell_gateway::transport::{Connection, ConnectionRx, ConnectionTx, Connector, RawMessage};
use swell_gateway::GatewayConfig;
use swell_proto::{DispatchEvent, ServerFrame, READY_EVENT};

/// One scripted item on a fake connection's read side.
pub enum Feed {
    /// Deliver a text payload.
    Text(String),
    /// Deliver a close notification.
    Close {
        /// Close status code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// Fail the read with a transport error.
    Fault(TransportError),
}

pub fn frame(frame: &ServerFrame) -> Feed {
    Feed::Text(frame.to_json().expect("frame should encode"))
}

pub fn hello(interval_ms: u64) -> Feed {
    frame(&ServerFrame::hello(interval_ms))
}

pub fn ready(seq: u64, session_id: &str) -> Feed {
    frame(&ServerFrame::dispatch(
        seq,
        DispatchEvent::new(READY_EVENT, serde_json::json!({ "session_id": session_id })),
    ))
}

pub fn chat(seq: u64, name: &str) -> Feed {
    frame(&ServerFrame::dispatch(
        seq,
        DispatchEvent::new(name, serde_json::json!({})),
    ))
}

pub fn close(code: u16, reason: &str) -> Feed {
    Feed::Close {
        code,
        reason: reason.to_string(),
    }
}

/// The stream dies without a close notification.
pub fn dropped() -> Feed {
    Feed::Fault(TransportError::AbruptEnd)
}

#[derive(Default)]
struct Recorder {
    connects: Vec<Instant>,
    sent: Vec<Vec<(Instant, String)>>,
}

/// Read-side view of everything the client did to the fake transport.
#[derive(Clone)]
pub struct RecorderHandle(Arc<Mutex<Recorder>>);

impl RecorderHandle {
    /// Number of connection attempts, successful or not.
    pub fn connect_count(&self) -> usize {
        self.0.lock().connects.len()
    }

    /// Timestamps of every connection attempt.
    pub fn connect_times(&self) -> Vec<Instant> {
        self.0.lock().connects.clone()
    }

    /// Frames sent on the given connection, in order.
    pub fn sent(&self, conn: usize) -> Vec<String> {
        self.0
            .lock()
            .sent
            .get(conn)
            .map(|frames| frames.iter().map(|(_, json)| json.clone()).collect())
            .unwrap_or_default()
    }

    /// Frames sent on the given connection with their send times.
    pub fn sent_timed(&self, conn: usize) -> Vec<(Instant, String)> {
        self.0.lock().sent.get(conn).cloned().unwrap_or_default()
    }

    /// Wait until a frame containing `needle` has been sent on `conn`.
    pub async fn wait_for_sent(&self, conn: usize, needle: &str) -> String {
        tokio::time::timeout(Duration::from_secs(300), async {
            loop {
                let hit = self
                    .sent(conn)
                    .into_iter()
                    .find(|json| json.contains(needle));
                if let Some(json) = hit {
                    return json;
                }
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("'{needle}' was never sent on connection {conn}"))
    }

    /// Wait until at least `count` frames have been sent on `conn`.
    pub async fn wait_for_sent_count(&self, conn: usize, count: usize) {
        tokio::time::timeout(Duration::from_secs(300), async {
            while self.sent(conn).len() < count {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "connection {conn} sent only {} of {count} expected frames",
                self.sent(conn).len()
            )
        });
    }

    /// Wait until `count` connection attempts have been made.
    pub async fn wait_for_connects(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(300), async {
            while self.connect_count() < count {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "saw only {} of {count} expected connection attempts",
                self.connect_count()
            )
        });
    }
}

/// Connector that replays a fixed list of scripted connections.
pub struct ScriptedConnector {
    scripts: Arc<Mutex<VecDeque<Vec<Feed>>>>,
    recorder: Arc<Mutex<Recorder>>,
}

impl ScriptedConnector {
    pub fn new(scripts: Vec<Vec<Feed>>) -> (Self, RecorderHandle) {
        let recorder = Arc::new(Mutex::new(Recorder::default()));
        (
            Self {
                scripts: Arc::new(Mutex::new(scripts.into())),
                recorder: Arc::clone(&recorder),
            },
            RecorderHandle(recorder),
        )
    }
}

impl Connector for ScriptedConnector {
    type Conn = ScriptedConn;

    async fn connect(&self) -> Result<ScriptedConn, TransportError> {
        let index = {
            let mut rec = self.recorder.lock();
            rec.connects.push(Instant::now());
            rec.sent.push(Vec::new());
            rec.sent.len() - 1
        };

        match self.scripts.lock().pop_front() {
            Some(script) => Ok(ScriptedConn {
                feed: script.into(),
                recorder: Arc::clone(&self.recorder),
                index,
            }),
            None => Err(TransportError::Connect(
                "no scripted connection left".to_string(),
            )),
        }
    }
}

pub struct ScriptedConn {
    feed: VecDeque<Feed>,
    recorder: Arc<Mutex<Recorder>>,
    index: usize,
}

impl Connection for ScriptedConn {
    type Tx = ScriptedTx;
    type Rx = ScriptedRx;

    fn split(self) -> (ScriptedTx, ScriptedRx) {
        (
            ScriptedTx {
                recorder: self.recorder,
                index: self.index,
            },
            ScriptedRx { feed: self.feed },
        )
    }
}

pub struct ScriptedTx {
    recorder: Arc<Mutex<Recorder>>,
    index: usize,
}

impl ConnectionTx for ScriptedTx {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.recorder.lock().sent[self.index].push((Instant::now(), text));
        Ok(())
    }
}

pub struct ScriptedRx {
    feed: VecDeque<Feed>,
}

impl ConnectionRx for ScriptedRx {
    async fn recv(&mut self) -> Result<RawMessage, TransportError> {
        match self.feed.pop_front() {
            Some(Feed::Text(text)) => Ok(RawMessage::Text(text)),
            Some(Feed::Close { code, reason }) => Ok(RawMessage::Closed { code, reason }),
            Some(Feed::Fault(e)) => Err(e),
            // Script exhausted: the connection stays open but silent.
            None => std::future::pending().await,
        }
    }
}

/// Install a test subscriber once per binary.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig::new("wss://gateway.test.invalid", "test-token")
}
