//! Per-connection session loop.
//!
//! One call to [`run_session`] owns one connection from handshake to
//! teardown: it validates the hello greeting, spawns the heartbeat and
//! writer tasks, classifies every inbound frame, and reports where the
//! supervisor should go next.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use swell_proto::{ClientFrame, ClosePolicy, ServerFrame};

use crate::error::{GatewayError, TransportError};
use crate::heartbeat::{spawn_heartbeat, STARTUP_GRACE};
use crate::receiver::{next_frame, Incoming};
use crate::shared::{CallerLink, GatewayEvent, Shared};
use crate::transport::Connection;
use crate::writer::spawn_writer;

/// Where the supervisor goes after a session ends with a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LifecycleState {
    /// Open a brand-new session with an identify frame.
    Start,
    /// Continue an earlier session with a resume frame.
    Reconnect {
        /// Session to resume, empty if none was ever assigned.
        session_id: String,
        /// Last sequence number processed.
        last_seq: u64,
    },
    /// Halt the client for good.
    Closed,
}

/// How one connection ended.
#[derive(Debug)]
pub(crate) enum SessionOutcome {
    /// The session reached a verdict; the supervisor moves there at once.
    Next(LifecycleState),
    /// The transport failed mid-flight; the supervisor backs off first.
    Fault(TransportError),
}

/// Silence budget for an established session.
fn read_timeout(interval_ms: u64) -> Duration {
    Duration::from_millis(interval_ms + interval_ms / 2)
}

/// Drive one connection to completion.
///
/// `opening` is the identify or resume frame the supervisor chose for this
/// attempt; it is queued ahead of user traffic and paced like every other
/// outbound frame.
pub(crate) async fn run_session<C: Connection>(
    conn: C,
    opening: ClientFrame,
    shared: &Arc<Shared>,
    link: &CallerLink,
) -> SessionOutcome {
    let (tx, mut rx) = conn.split();

    // The heartbeat interval is unknown until hello arrives, so the
    // handshake read carries no deadline.
    let interval_ms = match next_frame(&mut rx).await {
        Ok(Incoming::Frame(ServerFrame::Hello {
            heartbeat_interval_ms,
        })) => heartbeat_interval_ms,
        Ok(Incoming::ParseError(msg)) => {
            publish(link, GatewayEvent::Error(GatewayError::Parse(msg)));
            return SessionOutcome::Next(LifecycleState::Closed);
        }
        Ok(other) => {
            warn!(?other, "gateway did not open with hello");
            publish(link, GatewayEvent::Error(GatewayError::Handshake));
            return SessionOutcome::Next(LifecycleState::Closed);
        }
        Err(fault) => return SessionOutcome::Fault(fault),
    };

    info!(interval_ms, "gateway session open");

    let (gate_tx, gate_rx) = watch::channel(false);
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    let heartbeat_task = spawn_heartbeat(
        STARTUP_GRACE,
        Duration::from_millis(interval_ms),
        Arc::clone(shared),
        control_tx.clone(),
    );
    let writer_task = spawn_writer(
        tx,
        control_rx,
        Arc::clone(&link.user_rx),
        gate_rx,
        Arc::clone(shared),
    );

    // The opening identify or resume rides the control queue like any
    // other system frame.
    let _ = control_tx.send(opening);

    let deadline = read_timeout(interval_ms);
    let outcome = loop {
        let incoming = match timeout(deadline, next_frame(&mut rx)).await {
            Err(_) => {
                warn!("gateway went silent past the read deadline; reconnecting");
                break SessionOutcome::Next(resume_point(shared));
            }
            Ok(Err(fault)) => break SessionOutcome::Fault(fault),
            Ok(Ok(incoming)) => incoming,
        };

        match incoming {
            Incoming::Frame(ServerFrame::Hello { .. }) => {
                warn!("unexpected hello mid-session; ignoring");
            }
            Incoming::Frame(ServerFrame::Dispatch { seq, event }) => {
                shared.store_seq(seq);
                debug!(seq, name = %event.name, "dispatch received");

                if event.is_ready() {
                    match event.session_id() {
                        Some(id) => shared.set_session_id(id),
                        None => warn!("ready event carried no session id"),
                    }
                } else {
                    // First ordinary dispatch means replay has caught up.
                    let _ = gate_tx.send(true);
                }

                if !publish(link, GatewayEvent::Dispatch(event)) {
                    break SessionOutcome::Next(LifecycleState::Closed);
                }
            }
            Incoming::Frame(ServerFrame::HeartbeatRequest { seq }) => {
                shared.store_seq(seq);
                let _ = control_tx.send(ClientFrame::heartbeat(seq));
            }
            Incoming::Frame(ServerFrame::Reconnect) => {
                info!("gateway asked for a reconnect");
                break SessionOutcome::Next(resume_point(shared));
            }
            Incoming::Frame(ServerFrame::InvalidSession { resumable }) => {
                info!(resumable, "gateway invalidated the session");
                break SessionOutcome::Next(if resumable {
                    resume_point(shared)
                } else {
                    LifecycleState::Start
                });
            }
            Incoming::Frame(ServerFrame::HeartbeatAck { .. }) => {
                debug!("heartbeat acknowledged");
            }
            Incoming::ParseError(msg) => {
                publish(link, GatewayEvent::Error(GatewayError::Parse(msg)));
                break SessionOutcome::Next(LifecycleState::Closed);
            }
            Incoming::Closed { code, reason } => {
                break close_verdict(code, reason, shared, link);
            }
        }
    };

    // Both background tasks die with the session, whatever the exit path.
    heartbeat_task.abort();
    writer_task.abort();

    outcome
}

/// Classify a close notification into the next lifecycle state.
fn close_verdict(
    code: u16,
    reason: String,
    shared: &Shared,
    link: &CallerLink,
) -> SessionOutcome {
    let policy = ClosePolicy::for_code(code);
    info!(code, reason = %reason, ?policy, "gateway closed the connection");

    match policy {
        ClosePolicy::Resume => SessionOutcome::Next(resume_point(shared)),
        ClosePolicy::Fresh => SessionOutcome::Next(LifecycleState::Start),
        ClosePolicy::Forbidden => {
            publish(link, GatewayEvent::Error(GatewayError::Forbidden { code }));
            SessionOutcome::Next(LifecycleState::Closed)
        }
        ClosePolicy::Fatal => {
            publish(link, GatewayEvent::Error(GatewayError::Closed { code, reason }));
            SessionOutcome::Next(LifecycleState::Closed)
        }
    }
}

/// Snapshot the resume coordinates from the shared cells.
fn resume_point(shared: &Shared) -> LifecycleState {
    LifecycleState::Reconnect {
        session_id: shared.session_id(),
        last_seq: shared.last_seq(),
    }
}

/// Hand an event to the caller. Returns `false` once the handle is gone.
fn publish(link: &CallerLink, event: GatewayEvent) -> bool {
    link.events_tx.send(event).is_ok()
}
