//! Fixed-interval cycle scheduling.
//!
//! Each hazard kind runs in its own task on its own interval, so a slow or
//! failing kind never delays or fails another.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::Intervals;
use crate::models::HazardKind;
use crate::pipeline::Pipeline;

// ---

/// Spawn one polling loop per entry of `kinds`.
pub fn spawn_schedules(
    pipeline: Arc<Pipeline>,
    intervals: Intervals,
    kinds: &[HazardKind],
) -> Vec<JoinHandle<()>> {
    // ---
    kinds
        .iter()
        .map(|&kind| {
            let period = Duration::from_secs(intervals.for_kind(kind).max(1));
            tracing::info!("Scheduling {} cycle every {:?}", kind, period);
            tokio::spawn(run_schedule(pipeline.clone(), kind, period))
        })
        .collect()
}

async fn run_schedule(pipeline: Arc<Pipeline>, kind: HazardKind, period: Duration) {
    // ---
    let mut ticker = tokio::time::interval(period);
    // A cycle that overruns its period skips the missed ticks instead of
    // bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(e) = pipeline.run_cycle(kind).await {
            tracing::warn!("Scheduled {} cycle failed, retrying next tick: {}", kind, e);
        }
    }
}
