//! Iteration strategies.
//!
//! Each strategy drives a unit of work until its terminator is met, the
//! executing context is cancelled, or the work fails. They differ in how
//! cancellation is noticed:
//!
//! ```text
//! Busy                  poll token at the top of every iteration, never sleeps
//! Throttled             sleep between iterations; a cancelled sleep unwinds
//!                       out of the same boundary as a failed iteration
//! ThrottledReinterrupt  sleep between iterations; a cancelled sleep is caught
//!                       in place, the token re-armed, and the loop condition
//!                       sees it on the next pass
//! ```
//!
//! A failed iteration is never retried.

mod busy;
mod reinterrupt;
mod throttled;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cancel::CancellationToken;
use crate::error::BoxError;
use crate::terminator::Terminator;

/// Delay used by throttled strategies when no interval is given.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Boxed unit of work, type-erased over its error type.
pub(crate) type Work<T> = Box<dyn FnMut() -> Result<T, BoxError> + Send>;

/// How successive iterations are spaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Iteration {
    /// No delay between iterations.
    Busy,
    /// Fixed delay after every iteration.
    Throttled(Duration),
    /// Fixed delay after every iteration, cancellation caught inside the loop
    /// body and re-armed for the loop condition.
    ///
    /// Deprecated in favor of `Throttled`; kept as the consume-then-rearm
    /// alternative.
    ThrottledReinterrupt(Duration),
}

impl Iteration {
    /// Delay between iterations, if any.
    pub fn interval(&self) -> Option<Duration> {
        match self {
            Iteration::Busy => None,
            Iteration::Throttled(interval) | Iteration::ThrottledReinterrupt(interval) => Some(*interval),
        }
    }
}

impl fmt::Display for Iteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Iteration::Busy => write!(f, "busy"),
            Iteration::Throttled(interval) => write!(f, "throttled every {}ms", interval.as_millis()),
            Iteration::ThrottledReinterrupt(interval) => {
                write!(f, "throttled every {}ms (reinterrupt)", interval.as_millis())
            }
        }
    }
}

/// Why a loop stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "cause", content = "message")]
pub enum Exit {
    /// The terminator was met.
    Terminated,
    /// The executing context was cancelled.
    Cancelled,
    /// The unit of work failed; the loop was aborted.
    Failed(String),
}

impl Exit {
    /// Log severity this exit is reported with.
    pub fn level(&self) -> log::Level {
        match self {
            Exit::Terminated => log::Level::Debug,
            Exit::Cancelled => log::Level::Warn,
            Exit::Failed(_) => log::Level::Error,
        }
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Terminated => write!(f, "terminated"),
            Exit::Cancelled => write!(f, "cancelled"),
            Exit::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Raw stop cause, before the handle applies its failure policy.
pub(crate) enum Stop {
    Terminated,
    Cancelled,
    Failed(BoxError),
}

/// Result of driving a loop to its end.
pub(crate) struct Outcome<T> {
    /// Value of the last successful iteration, or `T::default()`.
    pub last: T,
    pub iterations: u64,
    pub stop: Stop,
}

/// Run `work` with the given strategy until it stops.
pub(crate) fn drive<T: Default>(
    iteration: Iteration,
    work: &mut Work<T>,
    terminator: &mut dyn Terminator,
    token: &CancellationToken,
) -> Outcome<T> {
    match iteration {
        Iteration::Busy => busy::drive(work, terminator, token),
        Iteration::Throttled(interval) => throttled::drive(work, terminator, token, interval),
        Iteration::ThrottledReinterrupt(interval) => reinterrupt::drive(work, terminator, token, interval),
    }
}
