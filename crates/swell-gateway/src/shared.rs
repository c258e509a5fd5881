//! Shared state and the caller-facing handle.
//!
//! The supervisor, the per-connection session loop, and the caller all see
//! the same [`Shared`] cells: the last observed sequence number, the last
//! known session ID, the desired presence, and the coarse connection state.
//! The caller side of the client is [`GatewayHandle`]; the client side of
//! the same channels is the crate-private [`CallerLink`].

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use swell_proto::{ClientFrame, DispatchEvent, Presence};

use crate::error::{ClientError, GatewayError};

/// An event delivered to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// A dispatched application event.
    Dispatch(DispatchEvent),
    /// A session-level problem the caller should know about.
    Error(GatewayError),
}

/// State of the gateway connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected.
    Disconnected,
    /// Attempting to connect.
    Connecting,
    /// Connected with a live session.
    Connected,
    /// Connection failed, will retry.
    Reconnecting,
    /// Halted permanently.
    Stopped,
}

/// Atomic wrapper for connection state.
#[derive(Debug)]
pub(crate) struct AtomicConnectionState(AtomicU32);

impl AtomicConnectionState {
    /// Create a new atomic state.
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self(AtomicU32::new(state as u32))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        match self.0.load(Ordering::SeqCst) {
            0 => ConnectionState::Disconnected,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Reconnecting,
            _ => ConnectionState::Stopped,
        }
    }

    /// Store a new state.
    pub fn store(&self, state: ConnectionState) {
        self.0.store(state as u32, Ordering::SeqCst);
    }
}

/// Cells shared between the supervisor, the session loop, and the handle.
///
/// The sequence number and session ID survive individual connections; a
/// resume snapshot is read from here after a transport fault, possibly
/// long after the session that wrote them is gone.
#[derive(Debug)]
pub(crate) struct Shared {
    last_seq: AtomicU64,
    session_id: RwLock<String>,
    presence: RwLock<Option<Presence>>,
    state: AtomicConnectionState,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            last_seq: AtomicU64::new(0),
            session_id: RwLock::new(String::new()),
            presence: RwLock::new(None),
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
        }
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq.load(Ordering::SeqCst)
    }

    pub fn store_seq(&self, seq: u64) {
        self.last_seq.store(seq, Ordering::SeqCst);
    }

    /// Last known session ID, empty if no ready event has arrived yet.
    pub fn session_id(&self) -> String {
        self.session_id.read().clone()
    }

    pub fn set_session_id(&self, id: &str) {
        *self.session_id.write() = id.to_string();
    }

    pub fn presence(&self) -> Option<Presence> {
        self.presence.read().clone()
    }

    pub fn set_presence(&self, presence: Presence) {
        *self.presence.write() = Some(presence);
    }

    pub fn state(&self) -> ConnectionState {
        self.state.load()
    }

    pub fn set_state(&self, state: ConnectionState) {
        self.state.store(state);
    }
}

/// Caller-facing handle to a running gateway client.
///
/// Events arrive through [`next_event`](Self::next_event); frames queued
/// with [`send`](Self::send) go out once the current connection has opened
/// its user-send gate, paced to the outbound budget. Dropping the handle
/// halts the client: the next event the session tries to publish finds the
/// channel closed and the client winds down.
pub struct GatewayHandle {
    events: mpsc::UnboundedReceiver<GatewayEvent>,
    sends: mpsc::UnboundedSender<ClientFrame>,
    shared: Arc<Shared>,
}

/// Client-side ends of the handle channels.
#[derive(Clone)]
pub(crate) struct CallerLink {
    pub(crate) events_tx: mpsc::UnboundedSender<GatewayEvent>,
    pub(crate) user_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ClientFrame>>>,
}

impl GatewayHandle {
    pub(crate) fn new(shared: Arc<Shared>) -> (Self, CallerLink) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (sends, user_rx) = mpsc::unbounded_channel();

        let handle = Self {
            events,
            sends,
            shared,
        };
        let link = CallerLink {
            events_tx,
            user_rx: Arc::new(tokio::sync::Mutex::new(user_rx)),
        };

        (handle, link)
    }

    /// Receive the next event, or `None` once the client has halted.
    pub async fn next_event(&mut self) -> Option<GatewayEvent> {
        self.events.recv().await
    }

    /// Queue a frame for sending.
    ///
    /// The frame waits until the current connection accepts user sends and
    /// the outbound pacer reaches it. Frames queued across a reconnect are
    /// kept and sent on the next connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the client has halted.
    pub fn send(&self, frame: ClientFrame) -> Result<(), ClientError> {
        self.sends.send(frame).map_err(|_| ClientError::Halted)
    }

    /// Set the presence announced at the start of each connection.
    ///
    /// The stored presence is read once per connection, right when user
    /// sends open. To change presence mid-connection, queue a
    /// [`ClientFrame::PresenceUpdate`] with [`send`](Self::send) as well.
    pub fn set_presence(&self, presence: Presence) {
        self.shared.set_presence(presence);
    }

    /// Last sequence number observed from the gateway.
    #[must_use]
    pub fn last_seq(&self) -> u64 {
        self.shared.last_seq()
    }

    /// Session ID from the most recent ready event, if any.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        let id = self.shared.session_id();
        if id.is_empty() { None } else { Some(id) }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Check if the client currently holds a live session.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared.state() == ConnectionState::Connected
    }
}
