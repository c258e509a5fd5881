//! Periodic heartbeat task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use swell_proto::ClientFrame;

use crate::shared::Shared;

/// Delay before the first heartbeat of a connection.
///
/// Gives the opening identify or resume frame room to go out first even
/// though both ride the same paced control queue.
pub(crate) const STARTUP_GRACE: Duration = Duration::from_secs(3);

/// Spawn the heartbeat task for one connection.
///
/// After `grace`, a heartbeat carrying the sequence number current at that
/// moment is queued every `interval`. The task ends on its own when the
/// control queue closes, and is aborted when the session ends.
pub(crate) fn spawn_heartbeat(
    grace: Duration,
    interval: Duration,
    shared: Arc<Shared>,
    control_tx: mpsc::UnboundedSender<ClientFrame>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(grace).await;

        let mut ticker = tokio::time::interval(interval);
        loop {
            // First tick completes immediately, so beats land at grace,
            // grace + interval, grace + 2 * interval, ...
            ticker.tick().await;

            let seq = shared.last_seq();
            if control_tx.send(ClientFrame::heartbeat(seq)).is_err() {
                debug!("control queue closed; heartbeat task ending");
                return;
            }
            debug!(seq, "heartbeat queued");
        }
    })
}
