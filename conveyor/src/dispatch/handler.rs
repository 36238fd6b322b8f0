//! Handler trait for heterogeneous work items, plus the two stock cost
//! profiles used by the token demo.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ConveyorResult;

/// A task handler the dispatch pool can route work items to.
///
/// Handlers are trait objects so one pool can mix cost profiles. `accepts`
/// is the routing predicate and must be cheap - it runs on the worker for
/// every candidate handler until one matches.
#[async_trait]
pub trait WorkHandler<T>: Send + Sync {
    /// Whether this handler should take the item.
    fn accepts(&self, item: &T) -> bool;

    /// Process one item.
    async fn handle(&self, item: T) -> ConveyorResult<()>;

    /// Human-readable handler name for logging and per-handler stats.
    fn name(&self) -> &str;
}

pub type BoxedHandler<T> = Box<dyn WorkHandler<T>>;

/// Fixed-cost handler for short tokens: every item costs the same.
pub struct FixedCostHandler {
    max_len: usize,
    cost: Duration,
}

impl FixedCostHandler {
    /// Accepts tokens of at most `max_len` characters.
    pub fn new(max_len: usize, cost: Duration) -> Self {
        Self { max_len, cost }
    }
}

#[async_trait]
impl WorkHandler<String> for FixedCostHandler {
    fn accepts(&self, item: &String) -> bool {
        item.len() <= self.max_len
    }

    async fn handle(&self, _item: String) -> ConveyorResult<()> {
        tokio::time::sleep(self.cost).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "fixed_cost"
    }
}

/// Length-proportional handler for longer tokens: cost scales with the
/// number of characters.
pub struct PerCharHandler {
    min_len: usize,
    cost_per_char: Duration,
}

impl PerCharHandler {
    /// Accepts tokens longer than `min_len` characters.
    pub fn new(min_len: usize, cost_per_char: Duration) -> Self {
        Self {
            min_len,
            cost_per_char,
        }
    }
}

#[async_trait]
impl WorkHandler<String> for PerCharHandler {
    fn accepts(&self, item: &String) -> bool {
        item.len() > self.min_len
    }

    async fn handle(&self, item: String) -> ConveyorResult<()> {
        tokio::time::sleep(self.cost_per_char * item.len() as u32).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "per_char"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_threshold_splits_handlers() {
        let fixed = FixedCostHandler::new(4, Duration::from_millis(2));
        let per_char = PerCharHandler::new(4, Duration::from_millis(1));

        let short = "amet".to_string();
        let long = "lorem".to_string();

        assert!(fixed.accepts(&short));
        assert!(!fixed.accepts(&long));
        assert!(per_char.accepts(&long));
        assert!(!per_char.accepts(&short));
    }
}
