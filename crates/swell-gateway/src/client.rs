//! Auto-reconnecting gateway client.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{info, warn};

use swell_proto::ClientFrame;

use crate::config::GatewayConfig;
use crate::error::TransportError;
use crate::session::{run_session, LifecycleState, SessionOutcome};
use crate::shared::{CallerLink, ConnectionState, GatewayHandle, Shared};
use crate::transport::{Connector, WsConnector};

/// Auto-reconnecting gateway client.
///
/// The client owns the connect/identify/resume lifecycle; the paired
/// [`GatewayHandle`] is how the caller receives events and queues frames.
/// Typical use spawns [`run`](Self::run) and keeps the handle:
///
/// ```no_run
/// use swell_gateway::{GatewayClient, GatewayConfig};
///
/// # async fn example() {
/// let config = GatewayConfig::new("wss://gateway.swell.chat", "token");
/// let (client, mut handle) = GatewayClient::new(config);
/// tokio::spawn(client.run());
///
/// while let Some(event) = handle.next_event().await {
///     println!("{event:?}");
/// }
/// # }
/// ```
pub struct GatewayClient<C: Connector = WsConnector> {
    config: GatewayConfig,
    connector: C,
    shared: Arc<Shared>,
    link: CallerLink,
}

impl GatewayClient<WsConnector> {
    /// Create a client and its caller handle.
    #[must_use]
    pub fn new(config: GatewayConfig) -> (Self, GatewayHandle) {
        let connector = WsConnector::new(config.url.clone());
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> GatewayClient<C> {
    /// Create a client over a custom connector.
    #[must_use]
    pub fn with_connector(config: GatewayConfig, connector: C) -> (Self, GatewayHandle) {
        let shared = Arc::new(Shared::new());
        let (handle, link) = GatewayHandle::new(Arc::clone(&shared));

        (
            Self {
                config,
                connector,
                shared,
                link,
            },
            handle,
        )
    }

    /// Run the client until it halts.
    ///
    /// Halting is final: a fatal close, a failed handshake, or a dropped
    /// handle all end here, and the caller builds a new client after fixing
    /// the cause. Transport faults never halt; each one retries after a
    /// randomized backoff, resuming from the last known session.
    pub async fn run(self) {
        let mut state = LifecycleState::Start;

        loop {
            let opening = match state {
                LifecycleState::Start => {
                    // A fresh session starts its sequence numbering over.
                    self.shared.store_seq(0);
                    info!("starting a fresh gateway session");
                    ClientFrame::identify(self.config.token.clone(), self.config.intents)
                }
                LifecycleState::Reconnect {
                    session_id,
                    last_seq,
                } => {
                    info!(session_id = %session_id, last_seq, "resuming gateway session");
                    ClientFrame::resume(self.config.token.clone(), session_id, last_seq)
                }
                LifecycleState::Closed => break,
            };

            self.shared.set_state(ConnectionState::Connecting);

            state = match self.connector.connect().await {
                Ok(conn) => {
                    self.shared.set_state(ConnectionState::Connected);
                    match run_session(conn, opening, &self.shared, &self.link).await {
                        SessionOutcome::Next(next) => next,
                        SessionOutcome::Fault(fault) => self.backoff(&fault).await,
                    }
                }
                Err(fault) => self.backoff(&fault).await,
            };
        }

        self.shared.set_state(ConnectionState::Stopped);
        info!("gateway client halted");
    }

    /// Sleep out a randomized backoff, then retry from a resume snapshot.
    async fn backoff(&self, fault: &TransportError) -> LifecycleState {
        self.shared.set_state(ConnectionState::Reconnecting);

        let delay = self.config.backoff.delay();
        warn!(
            error = %fault,
            delay_secs = delay.as_secs(),
            "gateway connection failed; retrying"
        );
        sleep(delay).await;

        LifecycleState::Reconnect {
            session_id: self.shared.session_id(),
            last_seq: self.shared.last_seq(),
        }
    }
}
