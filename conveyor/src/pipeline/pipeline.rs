//! Pipeline construction and orchestration.
//!
//! The orchestrator owns the ordered stage list, spawns each stage's worker
//! pool, polls the terminal pile for global completion, and joins every
//! worker before returning. It never blocks on an individual item.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::future::try_join_all;

use super::metrics::{PipelineReport, ProgressSnapshot, StageProgress, StageReport};
use super::pile::Pile;
use super::stage::{Stage, StageCounters};
use super::worker::{self, WorkerContext};
use crate::errors::{ConveyorError, ConveyorResult};
use crate::options::PipelineOptions;

/// A staged worker-pool pipeline.
///
/// Construction builds the pile chain and binds stages to it; nothing runs
/// until [`Pipeline::run`] is called. All shared mutable state lives in the
/// piles and the per-stage counters - the pipeline object itself is immutable
/// after construction and safe to share across tasks.
pub struct Pipeline {
    stages: Vec<Stage>,
    total_items: u64,
    poll_interval: Duration,
    terminal: Pile,
    shutdown: Arc<AtomicBool>,
    started: AtomicBool,
}

impl Pipeline {
    /// Build a pipeline from a validated plan.
    ///
    /// Validate Early: every configuration problem is rejected here, before
    /// a single worker exists. The first stage's input pile is seeded with
    /// the full work volume; every other pile starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`ConveyorError::Config`] if the stage list is empty or any
    /// stage has `pool_size` 0 (a stage with no workers can never drain its
    /// input, which would hang the pipeline by starvation).
    pub fn new(options: PipelineOptions) -> ConveyorResult<Self> {
        options.validate()?;

        let mut input = Pile::new(options.total_items);
        let mut stages = Vec::with_capacity(options.stages.len());
        for stage_options in &options.stages {
            let output = Pile::new(0);
            stages.push(Stage {
                name: stage_options.name.clone(),
                input: input.clone(),
                output: output.clone(),
                work_duration: stage_options.work_duration(),
                pool_size: stage_options.pool_size,
                counters: Arc::new(StageCounters::default()),
            });
            input = output;
        }

        // The loop leaves `input` holding the last stage's output pile.
        let terminal = input;

        Ok(Self {
            stages,
            total_items: options.total_items,
            poll_interval: options.poll_interval(),
            terminal,
            shutdown: Arc::new(AtomicBool::new(false)),
            started: AtomicBool::new(false),
        })
    }

    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Total workers across all stage pools.
    pub fn worker_count(&self) -> usize {
        self.stages.iter().map(|stage| stage.pool_size).sum()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run the pipeline to completion.
    ///
    /// Spawns every stage's worker pool, then polls the terminal pile at the
    /// configured cadence, logging per-stage progress. Once the terminal
    /// count reaches `total_items`, every worker observes completion on its
    /// own next check; the orchestrator flips the shutdown flag and joins
    /// them all before returning.
    ///
    /// A pipeline runs once. A second call returns
    /// [`ConveyorError::InvalidState`].
    pub async fn run(&self) -> ConveyorResult<PipelineReport> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ConveyorError::InvalidState(
                "pipeline has already run".into(),
            ));
        }

        let run_start = Instant::now();

        // Fast path: with no work volume the terminal pile already holds the
        // whole (empty) run. No workers, no idle polling.
        if self.total_items == 0 {
            tracing::info!("no work to feed, pipeline already complete");
            return Ok(self.report(run_start));
        }

        // Flip the shutdown flag on every exit path, including this future
        // being dropped mid-run, so no worker outlives the orchestrator.
        let _release_workers = ShutdownGuard(Arc::clone(&self.shutdown));

        let mut handles = Vec::with_capacity(self.worker_count());
        for stage in &self.stages {
            for worker_id in 0..stage.pool_size {
                let ctx = WorkerContext {
                    stage: stage.name.clone(),
                    worker: worker_id,
                    input: stage.input.clone(),
                    output: stage.output.clone(),
                    terminal: self.terminal.clone(),
                    total_items: self.total_items,
                    work_duration: stage.work_duration,
                    poll_interval: self.poll_interval,
                    shutdown: Arc::clone(&self.shutdown),
                    counters: Arc::clone(&stage.counters),
                };
                handles.push(tokio::spawn(worker::run(ctx)));
            }
            tracing::debug!(
                stage = %stage.name,
                pool_size = stage.pool_size,
                "spawned worker pool"
            );
        }

        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;

            let snapshot = self.snapshot();
            tracing::info!(
                done = snapshot.done,
                in_flight = snapshot.in_flight,
                "progress: {}",
                snapshot.pending_summary()
            );

            if snapshot.done == self.total_items {
                break;
            }
        }

        // Terminal count reached: conservation forces every pile and every
        // in-flight slot to zero, so each worker exits on its next check.
        // The flag just spares them one last poll sleep.
        self.shutdown.store(true, Ordering::SeqCst);

        try_join_all(handles)
            .await
            .map_err(|e| ConveyorError::Internal(format!("worker task failed: {e}")))?;

        let report = self.report(run_start);
        tracing::info!(
            total_items = report.total_items,
            elapsed_ms = %report.total_duration_ms,
            "pipeline complete"
        );
        Ok(report)
    }

    /// Point-in-time progress view across every pile and pool.
    ///
    /// See [`ProgressSnapshot`] for the accuracy caveat; use it for
    /// monitoring and tests, never to drive claim decisions.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let stages: Vec<StageProgress> = self
            .stages
            .iter()
            .map(|stage| StageProgress {
                name: stage.name.clone(),
                pending: stage.input.peek(),
                in_flight: stage.counters.in_flight(),
            })
            .collect();

        let in_flight = stages.iter().map(|stage| stage.in_flight).sum();

        ProgressSnapshot {
            stages,
            in_flight,
            done: self.terminal.peek(),
        }
    }

    fn report(&self, run_start: Instant) -> PipelineReport {
        PipelineReport {
            total_items: self.total_items,
            total_duration_ms: run_start.elapsed().as_millis(),
            stages: self
                .stages
                .iter()
                .map(|stage| StageReport {
                    name: stage.name.clone(),
                    pool_size: stage.pool_size,
                    items_processed: stage.counters.released.load(Ordering::SeqCst),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .field("total_items", &self.total_items)
            .finish()
    }
}

/// Releases workers if the run future is dropped before joining.
struct ShutdownGuard(Arc<AtomicBool>);

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::options::StageOptions;

    fn stage(name: &str, work_duration_ms: u64, pool_size: usize) -> StageOptions {
        StageOptions {
            name: name.into(),
            work_duration_ms,
            pool_size,
        }
    }

    fn plan(total_items: u64, stages: Vec<StageOptions>) -> PipelineOptions {
        PipelineOptions {
            total_items,
            stages,
            poll_interval_ms: 2,
        }
    }

    #[test]
    fn test_pool_size_zero_rejected_before_spawn() {
        let options = plan(10, vec![stage("wash", 1, 1), stage("dry", 1, 0)]);
        let err = Pipeline::new(options).unwrap_err();
        assert!(matches!(err, ConveyorError::Config(_)));
    }

    #[tokio::test]
    async fn test_zero_items_completes_immediately() {
        let pipeline = Pipeline::new(plan(0, vec![stage("wash", 5, 1)])).unwrap();

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.total_items, 0);
        assert_eq!(report.stage_processed("wash"), Some(0));

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.done, 0);
        assert_eq!(snapshot.accounted(), 0);
    }

    #[tokio::test]
    async fn test_second_run_rejected() {
        let pipeline = Pipeline::new(plan(0, vec![stage("wash", 1, 1)])).unwrap();
        pipeline.run().await.unwrap();

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, ConveyorError::InvalidState(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_laundry_scenario_completes() {
        let options = plan(
            100,
            vec![stage("wash", 8, 1), stage("dry", 4, 1), stage("iron", 2, 1)],
        );
        let pipeline = Pipeline::new(options).unwrap();

        let report = tokio::time::timeout(Duration::from_secs(30), pipeline.run())
            .await
            .expect("pipeline should terminate")
            .unwrap();

        assert_eq!(report.total_items, 100);
        for name in ["wash", "dry", "iron"] {
            assert_eq!(report.stage_processed(name), Some(100));
        }

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.done, 100);
        assert_eq!(snapshot.in_flight, 0);
        for stage in &snapshot.stages {
            assert_eq!(stage.pending, 0, "pile '{}' should be drained", stage.name);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_uneven_pools_still_complete() {
        let options = plan(
            200,
            vec![stage("parse", 1, 4), stage("transform", 2, 2), stage("emit", 4, 8)],
        );
        let pipeline = Pipeline::new(options).unwrap();

        let report = tokio::time::timeout(Duration::from_secs(30), pipeline.run())
            .await
            .expect("pipeline should terminate")
            .unwrap();

        assert_eq!(report.stage_processed("emit"), Some(200));
        assert_eq!(pipeline.snapshot().done, 200);
    }

    /// Conservation: at every sampled instant the units visible across all
    /// piles plus the in-flight estimate stay within one unit per worker of
    /// the total volume, and match it exactly once the run is over.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_conservation_under_load() {
        const TOTAL: u64 = 300;

        let options = plan(TOTAL, vec![stage("first", 1, 4), stage("second", 1, 4)]);
        let pipeline = Arc::new(Pipeline::new(options).unwrap());
        let skew = pipeline.worker_count() as u64;

        let runner = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.run().await })
        };

        while !runner.is_finished() {
            let accounted = pipeline.snapshot().accounted();
            assert!(
                accounted + skew >= TOTAL && accounted <= TOTAL + skew,
                "conservation violated: accounted {accounted} for total {TOTAL}"
            );
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let report = tokio::time::timeout(Duration::from_secs(30), runner)
            .await
            .expect("pipeline should terminate")
            .unwrap()
            .unwrap();
        assert_eq!(report.total_items, TOTAL);

        let snapshot = pipeline.snapshot();
        assert_eq!(snapshot.done, TOTAL);
        assert_eq!(snapshot.in_flight, 0);
        assert_eq!(snapshot.accounted(), TOTAL);
    }
}
