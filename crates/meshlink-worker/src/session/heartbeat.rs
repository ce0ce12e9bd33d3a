use std::sync::Arc;

use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use meshlink_core::protocol::ClientFrame;

use crate::channel::state::ChannelState;

/// Send `ping` on every tick while a connection is held.
pub(crate) async fn ping_loop(
    state: Arc<ChannelState>,
    cancel: CancellationToken,
    every: Duration,
) {
    let mut tick = interval_at(Instant::now() + every, every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tick.tick() => {}
        }

        let Some(conn) = state.conn.current().await else {
            continue;
        };
        if let Err(e) = conn.send_frame(&ClientFrame::Ping).await {
            if !cancel.is_cancelled() {
                tracing::warn!(error = %e, conn_id = conn.id(), "ping failed");
            }
        }
    }
}
