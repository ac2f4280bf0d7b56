//! Busy iteration: no delay, cancellation polled before every iteration.

use super::{Outcome, Stop, Work};
use crate::cancel::CancellationToken;
use crate::terminator::Terminator;

pub(crate) fn drive<T: Default>(
    work: &mut Work<T>,
    terminator: &mut dyn Terminator,
    token: &CancellationToken,
) -> Outcome<T> {
    let mut last = T::default();
    let mut iterations = 0u64;

    let stop = loop {
        if terminator.met() {
            break Stop::Terminated;
        }
        if token.observe() {
            break Stop::Cancelled;
        }

        log::debug!("Loop iteration {}", iterations + 1);
        match work() {
            Ok(value) => {
                last = value;
                iterations += 1;
            }
            Err(e) => break Stop::Failed(e),
        }
    };

    Outcome { last, iterations, stop }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::testing::{after_checks, counter};
    use crate::terminator::never;

    #[test]
    fn test_runs_until_terminator_met() {
        let mut work = counter(None);
        let mut terminator = after_checks(5);
        let outcome = drive(&mut work, &mut terminator, &CancellationToken::new());
        assert!(matches!(outcome.stop, Stop::Terminated));
        assert_eq!(outcome.iterations, 5);
        assert_eq!(outcome.last, 5);
    }

    #[test]
    fn test_terminator_checked_before_first_iteration() {
        let mut work = counter(None);
        let mut terminator = || true;
        let outcome = drive(&mut work, &mut terminator, &CancellationToken::new());
        assert_eq!(outcome.iterations, 0);
        assert_eq!(outcome.last, 0);
    }

    #[test]
    fn test_precancelled_token_skips_work_and_is_consumed() {
        let token = CancellationToken::new();
        token.signal();
        let mut work = counter(None);
        let mut terminator = never();
        let outcome = drive(&mut work, &mut terminator, &token);
        assert!(matches!(outcome.stop, Stop::Cancelled));
        assert_eq!(outcome.iterations, 0);
        assert!(!token.is_signalled());
    }

    #[test]
    fn test_cancel_from_inside_work() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let mut calls = 0u64;
        let mut work: Work<u64> = Box::new(move || -> Result<u64, crate::error::BoxError> {
            calls += 1;
            if calls == 3 {
                canceller.signal();
            }
            Ok(calls)
        });
        let mut terminator = never();
        let outcome = drive(&mut work, &mut terminator, &token);
        assert!(matches!(outcome.stop, Stop::Cancelled));
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.last, 3);
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let mut work = counter(Some(4));
        let mut terminator = never();
        let outcome = drive(&mut work, &mut terminator, &CancellationToken::new());
        match outcome.stop {
            Stop::Failed(e) => assert_eq!(e.to_string(), "call 4 failed"),
            _ => panic!("expected failure"),
        }
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.last, 3);
    }

    #[test]
    fn test_failure_on_first_call_yields_default() {
        let mut work = counter(Some(1));
        let mut terminator = never();
        let outcome = drive(&mut work, &mut terminator, &CancellationToken::new());
        assert!(matches!(outcome.stop, Stop::Failed(_)));
        assert_eq!(outcome.last, 0);
    }
}
