//! Heterogeneous work-item dispatch.
//!
//! A smaller pattern in the same family as the staged pipeline: ONE shared
//! stack-like queue, one fixed-size worker pool, and no output chaining.
//! Each popped item is routed to the first handler whose predicate accepts
//! it. Because there is no conservation law to observe, termination is
//! driven by a distinguished sentinel item or an external stop signal,
//! checked between pops.
//!
//! ```text
//! push ──▶ [work queue] ◀── pop ── worker ──▶ handler A (cheap, fixed cost)
//!                          ◀── pop ── worker ──▶ handler B (cost scales with item)
//! ```

mod handler;
mod pool;
mod queue;

pub use handler::{BoxedHandler, FixedCostHandler, PerCharHandler, WorkHandler};
pub use pool::{DispatchPool, DispatchPoolOptions, DispatchStats, SentinelPredicate};
pub use queue::WorkQueue;
