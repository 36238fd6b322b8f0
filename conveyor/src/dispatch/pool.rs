//! Fixed-size worker pool with predicate-routed dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::future::try_join_all;
use tokio::task::JoinHandle;

use super::handler::BoxedHandler;
use super::queue::WorkQueue;
use crate::errors::{ConveyorError, ConveyorResult};

/// Predicate marking the distinguished stop item. A worker that pops a
/// matching item flips the pool-wide stop flag instead of processing it.
pub type SentinelPredicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Pool configuration.
#[derive(Debug, Clone)]
pub struct DispatchPoolOptions {
    /// Number of workers popping from the shared queue.
    pub pool_size: usize,
    /// Backoff between polls when the queue is empty.
    pub poll_interval_ms: u64,
}

impl Default for DispatchPoolOptions {
    fn default() -> Self {
        Self {
            pool_size: 4,
            poll_interval_ms: 10,
        }
    }
}

/// Per-handler dispatch counts. Lock-free, never reset.
pub struct DispatchStats {
    handlers: Vec<(String, AtomicU64)>,
    unrouted: AtomicU64,
}

impl DispatchStats {
    fn new(names: Vec<String>) -> Self {
        Self {
            handlers: names
                .into_iter()
                .map(|name| (name, AtomicU64::new(0)))
                .collect(),
            unrouted: AtomicU64::new(0),
        }
    }

    fn record(&self, index: usize) {
        self.handlers[index].1.fetch_add(1, Ordering::Relaxed);
    }

    fn record_unrouted(&self) {
        self.unrouted.fetch_add(1, Ordering::Relaxed);
    }

    /// Items routed to the named handler so far.
    pub fn dispatched(&self, handler: &str) -> Option<u64> {
        self.handlers
            .iter()
            .find(|(name, _)| name == handler)
            .map(|(_, count)| count.load(Ordering::Relaxed))
    }

    /// Items routed to any handler so far.
    pub fn total_dispatched(&self) -> u64 {
        self.handlers
            .iter()
            .map(|(_, count)| count.load(Ordering::Relaxed))
            .sum()
    }

    /// Items no handler accepted (logged and dropped).
    pub fn unrouted(&self) -> u64 {
        self.unrouted.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for DispatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchStats")
            .field("total_dispatched", &self.total_dispatched())
            .field("unrouted", &self.unrouted())
            .finish()
    }
}

/// A running pool of workers popping one shared queue.
///
/// Unlike the staged pipeline there is no output chaining and no
/// conservation law; the pool runs until a sentinel item is observed or
/// [`DispatchPool::shutdown`] is called, then [`DispatchPool::join`] waits
/// for every worker to exit.
pub struct DispatchPool<T> {
    queue: WorkQueue<T>,
    stop: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<DispatchStats>,
}

impl<T: Send + 'static> DispatchPool<T> {
    /// Spawn the worker pool against a shared queue.
    ///
    /// Workers race on `queue`, routing each popped item to the first
    /// handler in `handlers` that accepts it. If `sentinel` is set, a
    /// matching item stops the whole pool; the sentinel itself is never
    /// handed to a handler.
    ///
    /// # Errors
    ///
    /// Returns [`ConveyorError::Config`] for an empty handler list or
    /// `pool_size` 0 - a pool with no workers can never drain the queue.
    pub fn spawn(
        queue: WorkQueue<T>,
        handlers: Vec<BoxedHandler<T>>,
        sentinel: Option<SentinelPredicate<T>>,
        options: DispatchPoolOptions,
    ) -> ConveyorResult<Self> {
        if options.pool_size == 0 {
            return Err(ConveyorError::Config(
                "dispatch pool needs at least one worker".into(),
            ));
        }
        if handlers.is_empty() {
            return Err(ConveyorError::Config(
                "dispatch pool needs at least one handler".into(),
            ));
        }

        let stats = Arc::new(DispatchStats::new(
            handlers.iter().map(|h| h.name().to_string()).collect(),
        ));
        let handlers = Arc::new(handlers);
        let stop = Arc::new(AtomicBool::new(false));
        let poll_interval = Duration::from_millis(options.poll_interval_ms);

        let workers = (0..options.pool_size)
            .map(|worker| {
                let queue = queue.clone();
                let handlers = Arc::clone(&handlers);
                let sentinel = sentinel.clone();
                let stop = Arc::clone(&stop);
                let stats = Arc::clone(&stats);
                tokio::spawn(worker_loop(
                    worker,
                    queue,
                    handlers,
                    sentinel,
                    stop,
                    stats,
                    poll_interval,
                ))
            })
            .collect();

        tracing::debug!(pool_size = options.pool_size, "spawned dispatch pool");

        Ok(Self {
            queue,
            stop,
            workers,
            stats,
        })
    }

    /// Signal every worker to stop after its current item.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait for every worker to exit.
    pub async fn join(self) -> ConveyorResult<()> {
        try_join_all(self.workers)
            .await
            .map_err(|e| ConveyorError::Internal(format!("dispatch worker failed: {e}")))?;
        Ok(())
    }

    pub fn stats(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// Queued items not yet picked up, for monitoring only.
    pub fn backlog(&self) -> usize {
        self.queue.len()
    }
}

async fn worker_loop<T>(
    worker: usize,
    queue: WorkQueue<T>,
    handlers: Arc<Vec<BoxedHandler<T>>>,
    sentinel: Option<SentinelPredicate<T>>,
    stop: Arc<AtomicBool>,
    stats: Arc<DispatchStats>,
    poll_interval: Duration,
) {
    tracing::debug!(worker, "dispatch worker started");

    loop {
        // The stop condition is observed between pops, never mid-item.
        if stop.load(Ordering::SeqCst) {
            break;
        }

        let Some(item) = queue.try_pop() else {
            tokio::time::sleep(poll_interval).await;
            continue;
        };

        if let Some(sentinel) = &sentinel
            && sentinel(&item)
        {
            tracing::debug!(worker, "sentinel observed, stopping pool");
            stop.store(true, Ordering::SeqCst);
            break;
        }

        match handlers
            .iter()
            .enumerate()
            .find(|(_, handler)| handler.accepts(&item))
        {
            Some((index, handler)) => {
                stats.record(index);
                if let Err(error) = handler.handle(item).await {
                    tracing::warn!(worker, handler = handler.name(), %error, "handler failed");
                }
            }
            None => {
                stats.record_unrouted();
                tracing::warn!(worker, "no handler accepted item, dropping it");
            }
        }
    }

    tracing::debug!(worker, "dispatch worker exiting");
}
