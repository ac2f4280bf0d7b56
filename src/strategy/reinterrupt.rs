//! Throttled iteration with the consume-then-rearm idiom.
//!
//! Same spacing as the throttled strategy, but a cancelled delay is caught
//! inside the loop body. The token is re-armed so that the loop condition,
//! which polls it, observes the cancellation on the next pass and exits there.
//!
//! The terminator is checked before the token. If it is already met when the
//! re-armed signal is pending, the loop ends as terminated and the token stays
//! signalled. A host that reuses the token should `observe()` it afterwards.

use std::time::Duration;

use super::{Outcome, Stop, Work};
use crate::cancel::CancellationToken;
use crate::terminator::Terminator;

pub(crate) fn drive<T: Default>(
    work: &mut Work<T>,
    terminator: &mut dyn Terminator,
    token: &CancellationToken,
    interval: Duration,
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

        if let Err(cancelled) = token.suspend(interval) {
            log::warn!("Loop {} during delay, re-arming", cancelled);
            token.rearm();
        }
    };

    Outcome { last, iterations, stop }
}
