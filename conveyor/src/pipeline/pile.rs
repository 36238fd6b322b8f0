//! Mutex-guarded work counter shared between adjacent stages.

use std::sync::Arc;

use parking_lot::Mutex;

/// A pile of pending work units.
///
/// Cheaply cloneable via `Arc`; clones share the same underlying count, which
/// is how the output pile of one stage doubles as the input pile of the next.
/// The count can never go negative: a claim only succeeds if the count is
/// positive at the instant of the check-and-decrement.
#[derive(Clone)]
pub struct Pile {
    count: Arc<Mutex<u64>>,
}

impl Pile {
    /// Create a pile holding `start` units.
    pub fn new(start: u64) -> Self {
        Self {
            count: Arc::new(Mutex::new(start)),
        }
    }

    /// Atomically claim one unit of work.
    ///
    /// Returns `true` if a unit was claimed - the caller now owns it and is
    /// responsible for releasing it into some other pile once processed.
    /// Returns `false` without mutation if the pile was empty. Two concurrent
    /// callers never claim the same unit.
    pub fn try_claim(&self) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    /// Add one unit to the pile. Infallible.
    pub fn release(&self) {
        *self.count.lock() += 1;
    }

    /// Snapshot of the current count, for monitoring and reporting only.
    ///
    /// The value may be stale the moment it is read; never drive claim
    /// decisions off it.
    pub fn peek(&self) -> u64 {
        *self.count.lock()
    }
}

impl std::fmt::Debug for Pile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pile").field("count", &self.peek()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    use rand::Rng;

    use super::*;

    #[test]
    fn test_claim_decrements() {
        let pile = Pile::new(2);
        assert!(pile.try_claim());
        assert_eq!(pile.peek(), 1);
        assert!(pile.try_claim());
        assert_eq!(pile.peek(), 0);
    }

    #[test]
    fn test_claim_on_empty_pile_fails_without_mutation() {
        let pile = Pile::new(0);
        assert!(!pile.try_claim());
        assert_eq!(pile.peek(), 0);
    }

    #[test]
    fn test_release_increments() {
        let pile = Pile::new(0);
        pile.release();
        pile.release();
        assert_eq!(pile.peek(), 2);
    }

    #[test]
    fn test_clones_share_the_count() {
        let pile = Pile::new(1);
        let other = pile.clone();
        assert!(other.try_claim());
        assert!(!pile.try_claim());
    }

    /// Property: N threads hammering one pile seeded with V units observe
    /// exactly V successful claims in total, regardless of interleaving.
    #[test]
    fn test_no_double_claim_under_contention() {
        const SEEDED: u64 = 200;
        const THREADS: usize = 8;

        let pile = Pile::new(SEEDED);
        let successes = Arc::new(AtomicU64::new(0));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let pile = pile.clone();
                let successes = Arc::clone(&successes);
                std::thread::spawn(move || {
                    let mut rng = rand::rng();
                    loop {
                        if pile.try_claim() {
                            successes.fetch_add(1, Ordering::SeqCst);
                            // Randomized jitter to shake out interleavings.
                            std::thread::sleep(std::time::Duration::from_micros(
                                rng.random_range(0..50),
                            ));
                        } else {
                            break;
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(successes.load(Ordering::SeqCst), SEEDED);
        assert_eq!(pile.peek(), 0);
    }
}
