//! Staged worker-pool pipeline.
//!
//! Discrete units of work move through an ordered sequence of stages; each
//! stage has its own pool of workers racing on a shared input pile:
//!
//! ```text
//! items ──▶ [pile 0] ── stage 0 pool ──▶ [pile 1] ── stage 1 pool ──▶ … ──▶ [terminal pile]
//! ```
//!
//! - Pile: mutex-guarded count of pending work units
//! - Stage: one processing step bound to an input and an output pile
//! - Pipeline: builds the pile chain, spawns the pools, monitors completion
//!
//! A worker only ever touches two piles (its input and output) plus the
//! terminal pile for the global exit check; there is no cross-pile locking,
//! so stages back-pressure each other only through empty piles.
//!
//! ## Example
//!
//! ```no_run
//! use conveyor::{Pipeline, PipelineOptions, StageOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = PipelineOptions {
//!     total_items: 100,
//!     stages: vec![
//!         StageOptions { name: "wash".into(), work_duration_ms: 8, pool_size: 2 },
//!         StageOptions { name: "dry".into(), work_duration_ms: 4, pool_size: 1 },
//!     ],
//!     poll_interval_ms: 10,
//! };
//!
//! let pipeline = Pipeline::new(options)?;
//! let report = pipeline.run().await?;
//! println!("pipeline took {}ms", report.total_duration_ms);
//! # Ok(())
//! # }
//! ```

mod metrics;
mod pile;
#[allow(clippy::module_inception)]
mod pipeline;
mod stage;
mod worker;

pub use metrics::{PipelineReport, ProgressSnapshot, StageProgress, StageReport};
pub use pile::Pile;
pub use pipeline::Pipeline;
pub use stage::Stage;
