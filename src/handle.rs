//! Executable loop handles.
//!
//! A `LoopHandle` is assembled once by the builder and then handed to a host
//! (a dedicated thread, a pool, or an inline call), which runs it exactly once.
//! `run` consumes the handle, so it cannot be reused.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize, Serializer};

use crate::cancel::CancellationToken;
use crate::error::{LoopError, Result};
use crate::hook::Hook;
use crate::strategy::{self, Exit, Iteration, Stop, Work};
use crate::terminator::Terminator;

/// What a handle does when its unit of work fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure, abort the loop, fire the hook with the last good value.
    #[default]
    Contain,
    /// Abort the loop and return the failure from `run`. The hook is not fired.
    Propagate,
}

/// Summary of a finished loop.
///
/// `value` is the last good result (or `T::default()` when no iteration
/// succeeded), never the result of a failed final attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopReport<T> {
    pub value: T,
    pub iterations: u64,
    pub exit: Exit,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// A unit of work wrapped with its termination, iteration and completion policy.
pub struct LoopHandle<T> {
    work: Work<T>,
    terminator: Box<dyn Terminator>,
    iteration: Iteration,
    hook: Hook<T>,
    policy: FailurePolicy,
}

impl<T> LoopHandle<T> {
    pub(crate) fn new(
        work: Work<T>,
        terminator: Box<dyn Terminator>,
        iteration: Iteration,
        hook: Hook<T>,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            work,
            terminator,
            iteration,
            hook,
            policy,
        }
    }

    pub fn iteration(&self) -> Iteration {
        self.iteration
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }
}

impl<T: Default> LoopHandle<T> {
    /// Run the loop on the calling thread until it ends.
    ///
    /// `token` is the cancellation flag of the executing context. The hook, if
    /// any, fires exactly once before this returns, unless the failure policy
    /// is `Propagate` and the unit of work failed.
    pub fn run(self, token: &CancellationToken) -> Result<LoopReport<T>> {
        let Self {
            mut work,
            mut terminator,
            iteration,
            hook,
            policy,
        } = self;

        let start = Instant::now();
        log::debug!("Loop begin ({})", iteration);

        let outcome = strategy::drive(iteration, &mut work, terminator.as_mut(), token);

        let exit = match outcome.stop {
            Stop::Terminated => Exit::Terminated,
            Stop::Cancelled => Exit::Cancelled,
            Stop::Failed(e) => match policy {
                FailurePolicy::Propagate => {
                    log::debug!("Loop end: propagating failure after {} iteration(s)", outcome.iterations);
                    return Err(LoopError::Work(e));
                }
                FailurePolicy::Contain => {
                    log::error!("Loop aborted after {} iteration(s): {}", outcome.iterations, e);
                    Exit::Failed(e.to_string())
                }
            },
        };

        hook.fire(&outcome.last);
        log::debug!("Loop end: {} after {} iteration(s)", exit, outcome.iterations);

        Ok(LoopReport {
            value: outcome.last,
            iterations: outcome.iterations,
            exit,
            elapsed: start.elapsed(),
        })
    }

    /// Run with a private token nobody else can signal.
    ///
    /// Only the terminator or a failure can end such a loop.
    pub fn run_detached(self) -> Result<LoopReport<T>> {
        self.run(&CancellationToken::new())
    }
}

impl<T> fmt::Debug for LoopHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoopHandle")
            .field("iteration", &self.iteration)
            .field("hook", &self.hook)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
