//! Paced outbound writer.
//!
//! All frames leaving a connection go through one writer task, which
//! enforces the outbound budget by sleeping between sends. System frames
//! (identify, resume, heartbeats) flow on the control queue and are always
//! eligible; caller frames wait behind a gate the session opens once the
//! connection has caught up on replayed events.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, warn};

use swell_proto::ClientFrame;

use crate::shared::Shared;
use crate::transport::ConnectionTx;

/// Minimum gap between outbound frames.
///
/// A full minute at this pace stays safely under the 120-frames-per-minute
/// ceiling the gateway enforces.
pub(crate) const SEND_SPACING: Duration = Duration::from_micros(516_667);

/// Spawn the writer task for one connection.
pub(crate) fn spawn_writer<T: ConnectionTx>(
    tx: T,
    control_rx: mpsc::UnboundedReceiver<ClientFrame>,
    user_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ClientFrame>>>,
    gate: watch::Receiver<bool>,
    shared: Arc<Shared>,
) -> JoinHandle<()> {
    tokio::spawn(run_writer(tx, control_rx, user_rx, gate, shared))
}

/// Writer loop body, separated from the spawn for direct testing.
///
/// The sleep sits at the top of every iteration so the pacing clock
/// restarts after each send, even when a queue read blocks for longer
/// than one spacing period.
pub(crate) async fn run_writer<T: ConnectionTx>(
    mut tx: T,
    mut control_rx: mpsc::UnboundedReceiver<ClientFrame>,
    user_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ClientFrame>>>,
    mut gate: watch::Receiver<bool>,
    shared: Arc<Shared>,
) {
    // Phase 1: only control frames go out until the session opens the gate.
    loop {
        sleep(SEND_SPACING).await;

        // Biased: control frames already queued drain ahead of the gate flip,
        // so the opening identify or resume cannot be overtaken.
        let frame = tokio::select! {
            biased;

            frame = control_rx.recv() => match frame {
                Some(frame) => frame,
                None => {
                    debug!("control queue closed; writer ending");
                    return;
                }
            },
            _ = gate.changed() => {
                if *gate.borrow() {
                    break;
                }
                continue;
            }
        };

        if !send_frame(&mut tx, &frame).await {
            return;
        }
    }

    // Announce the stored presence, if any, ahead of queued caller frames.
    if let Some(presence) = shared.presence() {
        if !send_frame(&mut tx, &ClientFrame::presence_update(presence)).await {
            return;
        }
    }
    debug!("user sends enabled; writer entering mixed phase");

    // Phase 2: control and caller queues drain together. Once the caller
    // queue closes (handle dropped) only control frames are polled, so a
    // closed queue cannot spin the loop.
    let mut user_open = true;
    loop {
        sleep(SEND_SPACING).await;

        let frame = if user_open {
            let mut user = user_rx.lock().await;
            tokio::select! {
                frame = control_rx.recv() => match frame {
                    Some(frame) => frame,
                    None => {
                        debug!("control queue closed; writer ending");
                        return;
                    }
                },
                frame = user.recv() => match frame {
                    Some(frame) => frame,
                    None => {
                        user_open = false;
                        continue;
                    }
                },
            }
        } else {
            match control_rx.recv().await {
                Some(frame) => frame,
                None => {
                    debug!("control queue closed; writer ending");
                    return;
                }
            }
        };

        if !send_frame(&mut tx, &frame).await {
            return;
        }
    }
}

/// Encode and send one frame. Returns `false` when the transport is gone.
async fn send_frame<T: ConnectionTx>(tx: &mut T, frame: &ClientFrame) -> bool {
    let json = match frame.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "failed to encode outbound frame; dropping it");
            return true;
        }
    };

    debug!(kind = frame.kind(), "sending frame");
    if let Err(e) = tx.send(json).await {
        warn!(error = %e, "transport rejected outbound frame; writer ending");
        return false;
    }

    true
}
