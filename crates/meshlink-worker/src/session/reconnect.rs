use std::sync::Arc;

use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::channel::state::ChannelState;
use crate::session::{connect_and_authenticate, Session};

/// Re-run the handshake on every tick while no connection is held.
///
/// Fixed cadence, no backoff. A handshake in flight is abandoned when the
/// session is cancelled.
pub(crate) async fn reconnect_loop(state: Arc<ChannelState>, session: Session, every: Duration) {
    let mut tick = interval_at(Instant::now() + every, every);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = session.token().cancelled() => return,
            _ = tick.tick() => {}
        }

        if state.conn.is_connected().await {
            continue;
        }

        tracing::info!("attempting reconnect");
        tokio::select! {
            _ = session.token().cancelled() => return,
            res = connect_and_authenticate(&state, &session) => {
                if let Err(e) = res {
                    tracing::warn!(error = %e, code = e.code().as_str(), "reconnect failed");
                }
            }
        }
    }
}
