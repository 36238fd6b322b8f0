//! Staged worker-pool pipeline runtime.
//!
//! Conveyor models work as non-negative counters ("piles") chained through
//! an ordered list of stages, each drained by its own pool of workers. The
//! library guarantees two things about a run: no unit of work is ever lost
//! or duplicated (the conservation invariant across piles and in-flight
//! claims), and a validly configured pipeline always completes. It
//! guarantees nothing about the order individual units move - pools race
//! freely.
//!
//! Two shapes are provided:
//! - [`pipeline`]: the staged pipeline, terminated by a conservation-law
//!   count on the terminal pile.
//! - [`dispatch`]: a single shared queue feeding one pool of
//!   predicate-routed handlers, terminated by a sentinel item or an
//!   explicit stop signal.

pub mod dispatch;
pub mod errors;
pub mod options;
pub mod pipeline;

pub use errors::{ConveyorError, ConveyorResult};
pub use options::{PipelineOptions, StageOptions};
pub use pipeline::{Pile, Pipeline, PipelineReport, ProgressSnapshot};

/// Install the default tracing subscriber: env-filtered (`RUST_LOG`),
/// human-readable, on stderr. Binaries call this once at startup; the
/// library itself never installs a subscriber.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// Compile-time assertions that the shared types stay Send + Sync.
// This is critical for multithreaded usage (pipelines are sampled from
// other tasks while running).
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<Pipeline>;
    let _ = assert_send_sync::<Pile>;
};
