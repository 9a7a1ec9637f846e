use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::scheduler::Scheduler;

/// Runs scheduling cycles on a fixed interval until `stop` is cancelled. A
/// failed cycle is logged and never kills the loop, matching the original
/// background thread's "catch and continue" behavior. The stop signal is
/// only observed between cycles (spec §5): a cycle already underway runs to
/// completion, there is no mid-cycle cancellation.
pub fn spawn(scheduler: Arc<Scheduler>, stop: CancellationToken) -> tokio::task::JoinHandle<()> {
    let interval = Duration::from_secs(scheduler.config().cycle_interval_seconds);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = stop.cancelled() => {
                    tracing::info!("scheduling driver stopping");
                    break;
                }
            }

            match scheduler.run_cycle().await {
                Ok(stats) if stats.assigned > 0 || stats.requeued > 0 => {
                    tracing::info!(
                        assigned = stats.assigned,
                        requeued = stats.requeued,
                        skipped_throttle = stats.skipped_throttle,
                        skipped_area_lock = stats.skipped_area_lock,
                        skipped_no_worker = stats.skipped_no_worker,
                        "scheduling cycle"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "scheduling cycle failed");
                }
            }
        }
    })
}
