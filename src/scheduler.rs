use crate::handler::LightSensorHandler;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Spawn the recurring poll task for a handler.
///
/// Fixed-delay semantics: the first tick fires one full interval after
/// startup, and a poll that overruns pushes the next tick out instead of
/// bunching ticks up.
pub fn spawn_poll_task(
    handler: Arc<LightSensorHandler>,
    refresh: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!("[scheduler] polling every {:?}", refresh);
        let mut ticker = interval_at(Instant::now() + refresh, refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            handler.poll().await;
        }
    })
}
