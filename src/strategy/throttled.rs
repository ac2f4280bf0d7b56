//! Throttled iteration: fixed delay after every iteration.
//!
//! There is no explicit cancellation poll. The delay is the only place the
//! token is consumed, and a cancelled delay leaves the loop through the same
//! boundary as a failed iteration.

use std::time::Duration;

use super::{Outcome, Stop, Work};
use crate::cancel::{CancellationToken, Cancelled};
use crate::error::BoxError;
use crate::terminator::Terminator;

/// Anything that ends a throttled loop early.
enum Interrupt {
    Cancelled(Cancelled),
    Failed(BoxError),
}

impl From<Cancelled> for Interrupt {
    fn from(cancelled: Cancelled) -> Self {
        Interrupt::Cancelled(cancelled)
    }
}

pub(crate) fn drive<T: Default>(
    work: &mut Work<T>,
    terminator: &mut dyn Terminator,
    token: &CancellationToken,
    interval: Duration,
) -> Outcome<T> {
    let mut last = T::default();
    let mut iterations = 0u64;

    let stop = match iterate(work, terminator, token, interval, &mut last, &mut iterations) {
        Ok(()) => Stop::Terminated,
        Err(Interrupt::Cancelled(cancelled)) => {
            log::warn!("Loop {} after {} iteration(s)", cancelled, iterations);
            Stop::Cancelled
        }
        Err(Interrupt::Failed(e)) => Stop::Failed(e),
    };

    Outcome { last, iterations, stop }
}

fn iterate<T>(
    work: &mut Work<T>,
    terminator: &mut dyn Terminator,
    token: &CancellationToken,
    interval: Duration,
    last: &mut T,
    iterations: &mut u64,
) -> Result<(), Interrupt> {
    while !terminator.met() {
        log::debug!("Loop iteration {}", *iterations + 1);
        *last = work().map_err(Interrupt::Failed)?;
        *iterations += 1;
        token.suspend(interval)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::{after_checks, counter};
    use crate::terminator::{never, timeout};
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_runs_until_terminator_met() {
        let mut work = counter(None);
        let mut terminator = after_checks(3);
        let outcome = drive(&mut work, &mut terminator, &CancellationToken::new(), Duration::from_millis(5));
        assert!(matches!(outcome.stop, Stop::Terminated));
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.last, 3);
    }

    #[test]
    fn test_delay_follows_every_iteration() {
        let mut work = counter(None);
        let mut terminator = after_checks(3);
        let start = Instant::now();
        drive(&mut work, &mut terminator, &CancellationToken::new(), Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn test_precancelled_token_still_runs_one_iteration() {
        let token = CancellationToken::new();
        token.signal();
        let mut work = counter(None);
        let mut terminator = never();
        let outcome = drive(&mut work, &mut terminator, &token, Duration::from_secs(5));
        assert!(matches!(outcome.stop, Stop::Cancelled));
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.last, 1);
        assert!(!token.is_signalled(), "delay should consume the signal");
    }

    #[test]
    fn test_cancel_during_delay_keeps_value_of_that_iteration() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let worker = thread::spawn(move || {
            let mut work = counter(None);
            let mut terminator = never();
            drive(&mut work, &mut terminator, &token, Duration::from_millis(100))
        });

        // Iterations land at ~0, ~100, ~200ms; cancel inside the third delay.
        thread::sleep(Duration::from_millis(250));
        canceller.signal();

        let outcome = worker.join().unwrap();
        assert!(matches!(outcome.stop, Stop::Cancelled));
        assert_eq!(outcome.last, outcome.iterations);
        assert!((2..=4).contains(&outcome.last));
    }

    #[test]
    fn test_failure_aborts_without_delay() {
        let mut work = counter(Some(2));
        let mut terminator = never();
        let start = Instant::now();
        let outcome = drive(&mut work, &mut terminator, &CancellationToken::new(), Duration::from_millis(50));
        assert!(matches!(outcome.stop, Stop::Failed(_)));
        assert_eq!(outcome.last, 1);
        // One delay after the first iteration, none after the failure.
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_timeout_scenario_counts() {
        let mut work = counter(None);
        let mut terminator = timeout(Duration::from_millis(300));
        let start = Instant::now();
        let outcome = drive(&mut work, &mut terminator, &CancellationToken::new(), Duration::from_millis(100));
        let elapsed = start.elapsed();
        assert!(matches!(outcome.stop, Stop::Terminated));
        assert!((2..=3).contains(&outcome.last), "got {}", outcome.last);
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(400) + Duration::from_millis(50));
    }
}
