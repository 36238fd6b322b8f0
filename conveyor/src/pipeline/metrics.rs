//! Run reports and live progress snapshots.

/// Per-stage totals for a finished run.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: String,
    pub pool_size: usize,
    /// Units this stage's pool released into its output pile over the run.
    pub items_processed: u64,
}

/// Summary returned once a pipeline run completes.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub total_items: u64,
    pub total_duration_ms: u128,
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Items a named stage pushed to its output pile over the whole run.
    pub fn stage_processed(&self, name: &str) -> Option<u64> {
        self.stages
            .iter()
            .find(|stage| stage.name == name)
            .map(|stage| stage.items_processed)
    }
}

/// Point-in-time view of one stage while the pipeline runs.
#[derive(Debug, Clone)]
pub struct StageProgress {
    pub name: String,
    /// Units waiting in this stage's input pile.
    pub pending: u64,
    /// Units claimed by this stage's pool but not yet released downstream.
    pub in_flight: u64,
}

/// Point-in-time view of the whole pipeline.
///
/// Pile counts and in-flight counters are read one at a time, so the
/// snapshot can be off by at most one unit per worker mid-claim or
/// mid-release. It is exact once the pipeline is idle.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub stages: Vec<StageProgress>,
    /// Sum of per-stage in-flight estimates.
    pub in_flight: u64,
    /// Units in the terminal pile.
    pub done: u64,
}

impl ProgressSnapshot {
    /// Units visible anywhere in the pipeline at snapshot time.
    ///
    /// Conservation: this equals the pipeline's total volume, up to the
    /// per-worker snapshot skew described above.
    pub fn accounted(&self) -> u64 {
        self.stages.iter().map(|stage| stage.pending).sum::<u64>() + self.in_flight + self.done
    }

    /// One-line backlog summary for progress logs, e.g. `wash:37 dry:12 iron:3`.
    pub fn pending_summary(&self) -> String {
        self.stages
            .iter()
            .map(|stage| format!("{}:{}", stage.name, stage.pending))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
