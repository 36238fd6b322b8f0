//! Stage definition: one processing step with its own worker pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::pile::Pile;

/// One pipeline step, bound to its input and output piles.
///
/// Immutable once the pipeline starts; only the piles it references mutate.
/// Both piles are shared with the adjacent stages - a stage never owns a
/// pile exclusively.
pub struct Stage {
    pub(crate) name: String,
    pub(crate) input: Pile,
    pub(crate) output: Pile,
    pub(crate) work_duration: Duration,
    pub(crate) pool_size: usize,
    pub(crate) counters: Arc<StageCounters>,
}

impl Stage {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name)
            .field("pool_size", &self.pool_size)
            .field("work_duration", &self.work_duration)
            .finish()
    }
}

/// Monotonic per-stage counters. Lock-free, never reset.
///
/// `claimed - released` is the stage's in-flight estimate: units taken from
/// the input pile but not yet added to the output pile. Reading two atomics
/// is not one atomic operation, so the estimate can be off by one unit per
/// worker that is mid-claim or mid-release; it is exact when the stage is
/// idle.
#[derive(Debug, Default)]
pub(crate) struct StageCounters {
    pub(crate) claimed: AtomicU64,
    pub(crate) released: AtomicU64,
}

impl StageCounters {
    pub(crate) fn in_flight(&self) -> u64 {
        // claimed is incremented strictly before released for any given
        // unit, so reading released first keeps the difference from
        // underflowing.
        let released = self.released.load(Ordering::SeqCst);
        let claimed = self.claimed.load(Ordering::SeqCst);
        claimed.saturating_sub(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_tracks_claim_release_delta() {
        let counters = StageCounters::default();
        assert_eq!(counters.in_flight(), 0);

        counters.claimed.fetch_add(3, Ordering::SeqCst);
        assert_eq!(counters.in_flight(), 3);

        counters.released.fetch_add(3, Ordering::SeqCst);
        assert_eq!(counters.in_flight(), 0);
    }
}
