//! The claim/work/release loop executed by every pool worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::pile::Pile;
use super::stage::StageCounters;

/// Everything one worker needs. Piles and counters are shared handles; the
/// rest is owned per worker.
pub(crate) struct WorkerContext {
    pub(crate) stage: String,
    pub(crate) worker: usize,
    pub(crate) input: Pile,
    pub(crate) output: Pile,
    pub(crate) terminal: Pile,
    pub(crate) total_items: u64,
    pub(crate) work_duration: Duration,
    pub(crate) poll_interval: Duration,
    pub(crate) shutdown: Arc<AtomicBool>,
    pub(crate) counters: Arc<StageCounters>,
}

/// Run until the pipeline is globally finished.
///
/// An empty input pile is NOT a reason to exit: upstream pools may still be
/// producing into it. The only exit conditions are global - the terminal
/// pile reaching `total_items`, or the orchestrator's shutdown flag.
pub(crate) async fn run(ctx: WorkerContext) {
    tracing::debug!(stage = %ctx.stage, worker = ctx.worker, "worker started");

    let mut processed: u64 = 0;
    loop {
        if ctx.input.try_claim() {
            ctx.counters.claimed.fetch_add(1, Ordering::SeqCst);

            // Simulated processing; a real system would do the actual work
            // here between claim and release.
            tokio::time::sleep(ctx.work_duration).await;

            ctx.output.release();
            ctx.counters.released.fetch_add(1, Ordering::SeqCst);
            processed += 1;

            // Drain the input before re-checking global state - more work
            // may have just arrived from upstream.
            continue;
        }

        if ctx.shutdown.load(Ordering::SeqCst) || ctx.terminal.peek() == ctx.total_items {
            break;
        }

        // Bounded wait, not a hot spin.
        tokio::time::sleep(ctx.poll_interval).await;
    }

    tracing::debug!(stage = %ctx.stage, worker = ctx.worker, processed, "worker exiting");
}
