//! Termination predicates.
//!
//! A terminator is re-evaluated at iteration boundaries only, never while the
//! unit of work is running. Deadline predicates start their clock when they
//! are constructed, not when the loop starts.

use std::time::{Duration, Instant};

/// Predicate checked before every iteration. The loop ends once it is met.
pub trait Terminator: Send {
    /// Whether the loop should stop now.
    fn met(&mut self) -> bool;
}

impl<F> Terminator for F
where
    F: FnMut() -> bool + Send,
{
    fn met(&mut self) -> bool {
        self()
    }
}

/// Never met. Only cancellation ends a loop using it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Terminator for Never {
    fn met(&mut self) -> bool {
        false
    }
}

/// Met once at least `limit` has elapsed since construction.
#[derive(Debug, Clone)]
pub struct Timeout {
    start: Instant,
    limit: Duration,
}

impl Timeout {
    /// Time elapsed since this predicate was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl Terminator for Timeout {
    fn met(&mut self) -> bool {
        let elapsed = self.elapsed();
        log::debug!("Duration: {}ms", elapsed.as_millis());
        elapsed >= self.limit
    }
}

/// Met once `limit` has elapsed **and** the wrapped condition holds.
///
/// Despite the constructor's name this is a conjunction: a condition that is
/// already true does not end the loop before the deadline.
pub struct TimeoutOrCondition<C> {
    deadline: Timeout,
    condition: C,
}

impl<C> TimeoutOrCondition<C> {
    /// Time elapsed since this predicate was created.
    pub fn elapsed(&self) -> Duration {
        self.deadline.elapsed()
    }
}

impl<C: Terminator> Terminator for TimeoutOrCondition<C> {
    fn met(&mut self) -> bool {
        // Condition is only consulted after the deadline.
        self.deadline.met() && self.condition.met()
    }
}

/// A terminator that is never met.
pub fn never() -> Never {
    Never
}

/// A terminator met once `limit` has elapsed from now.
pub fn timeout(limit: Duration) -> Timeout {
    Timeout {
        start: Instant::now(),
        limit,
    }
}

/// A terminator met once `limit` has elapsed from now and `condition` holds.
pub fn timeout_or_condition<C: Terminator>(condition: C, limit: Duration) -> TimeoutOrCondition<C> {
    TimeoutOrCondition {
        deadline: timeout(limit),
        condition,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_never_is_never_met() {
        let mut t = never();
        for _ in 0..1000 {
            assert!(!t.met());
        }
    }

    #[test]
    fn test_closure_is_terminator() {
        let mut calls = 0;
        let mut t = move || {
            calls += 1;
            calls >= 3
        };
        assert!(!t.met());
        assert!(!t.met());
        assert!(t.met());
    }

    #[test]
    fn test_timeout_not_met_before_limit() {
        let mut t = timeout(Duration::from_secs(60));
        assert!(!t.met());
        assert_eq!(t.limit(), Duration::from_secs(60));
    }

    #[test]
    fn test_timeout_met_after_limit() {
        let mut t = timeout(Duration::from_millis(20));
        thread::sleep(Duration::from_millis(30));
        assert!(t.met());
        assert!(t.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_zero_timeout_is_met_immediately() {
        let mut t = timeout(Duration::ZERO);
        assert!(t.met());
    }

    #[test]
    fn test_clock_starts_at_construction() {
        let mut t = timeout(Duration::from_millis(30));
        thread::sleep(Duration::from_millis(40));
        // First evaluation happens late, the clock did not wait for it.
        assert!(t.met());
    }

    #[test]
    fn test_timeout_or_condition_requires_both() {
        let mut t = timeout_or_condition(|| true, Duration::from_millis(40));
        assert!(!t.met(), "true condition must not end the loop before the deadline");

        thread::sleep(Duration::from_millis(50));
        assert!(t.met());
    }

    #[test]
    fn test_timeout_or_condition_false_condition_after_deadline() {
        let flag = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&flag);
        let mut t = timeout_or_condition(move || seen.load(Ordering::SeqCst), Duration::ZERO);
        assert!(!t.met());

        flag.store(true, Ordering::SeqCst);
        assert!(t.met());
    }

    #[test]
    fn test_timeout_or_condition_skips_condition_before_deadline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut t = timeout_or_condition(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            },
            Duration::from_secs(60),
        );
        assert!(!t.met());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_boxed_terminator() {
        let mut t: Box<dyn Terminator> = Box::new(never());
        assert!(!t.met());
    }
}
