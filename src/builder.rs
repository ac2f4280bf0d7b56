//! Factory surface for loop handles.
//!
//! `LoopBuilder` crosses the three axes of a loop:
//!
//! - terminator: condition, timeout, both, or none (`never`)
//! - iteration: busy, throttled, or throttled with reinterrupt
//! - hook: none, side effect, or consumer of the last value
//!
//! ```
//! use std::time::Duration;
//! use loopkit::sleepy_at;
//!
//! let mut count = 0u32;
//! let handle = sleepy_at(
//!     move || -> Result<u32, std::io::Error> {
//!         count += 1;
//!         Ok(count)
//!     },
//!     Duration::from_millis(100),
//! )
//! .timeout(Duration::from_millis(300))
//! .on_complete(|last| println!("counted to {last}"))
//! .build();
//!
//! let report = std::thread::spawn(move || handle.run_detached())
//!     .join()
//!     .unwrap()
//!     .unwrap();
//! assert!(report.value >= 2);
//! ```

use std::time::Duration;

use crate::config::LoopConfig;
use crate::error::BoxError;
use crate::handle::{FailurePolicy, LoopHandle};
use crate::hook::Hook;
use crate::strategy::{DEFAULT_INTERVAL, Iteration, Work};
use crate::terminator::{Terminator, never, timeout, timeout_or_condition};

/// Iteration choice before the default interval is applied.
#[derive(Debug, Clone, Copy)]
enum Mode {
    Busy,
    Throttled(Option<Duration>),
    ThrottledReinterrupt(Option<Duration>),
}

/// Builder for `LoopHandle`.
pub struct LoopBuilder<T> {
    work: Work<T>,
    condition: Option<Box<dyn Terminator>>,
    deadline: Option<Duration>,
    terminator: Option<Box<dyn Terminator>>,
    mode: Mode,
    hook: Hook<T>,
    policy: FailurePolicy,
    default_interval: Duration,
}

impl<T: 'static> LoopBuilder<T> {
    /// Start from a unit of work. Defaults: busy iteration, `never()`
    /// terminator, no hook, `FailurePolicy::Contain`.
    pub fn new<F, E>(mut work: F) -> Self
    where
        F: FnMut() -> Result<T, E> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            work: Box::new(move || -> Result<T, BoxError> { work().map_err(Into::into) }),
            condition: None,
            deadline: None,
            terminator: None,
            mode: Mode::Busy,
            hook: Hook::None,
            policy: FailurePolicy::default(),
            default_interval: DEFAULT_INTERVAL,
        }
    }

    /// Stop once `condition` holds.
    ///
    /// Combined with `timeout`, the loop stops only after the deadline has
    /// passed *and* the condition holds.
    pub fn until<C>(mut self, condition: C) -> Self
    where
        C: Terminator + 'static,
    {
        self.condition = Some(Box::new(condition));
        self
    }

    /// Stop once `limit` has elapsed. The clock starts at `build()`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.deadline = Some(limit);
        self
    }

    /// Use a terminator built elsewhere. Overrides `until` and `timeout`.
    pub fn terminator<X>(mut self, terminator: X) -> Self
    where
        X: Terminator + 'static,
    {
        self.terminator = Some(Box::new(terminator));
        self
    }

    /// No delay between iterations
    pub fn busy(mut self) -> Self {
        self.mode = Mode::Busy;
        self
    }

    /// Delay by the default interval between iterations
    pub fn throttled(mut self) -> Self {
        self.mode = Mode::Throttled(None);
        self
    }

    /// Delay by `interval` between iterations
    pub fn throttled_at(mut self, interval: Duration) -> Self {
        self.mode = Mode::Throttled(Some(interval));
        self
    }

    /// Like `throttled_reinterrupt_at`, with the default interval
    pub fn throttled_reinterrupt(mut self) -> Self {
        self.mode = Mode::ThrottledReinterrupt(None);
        self
    }

    /// Delay by `interval`, catching cancellation inside the loop body and
    /// re-arming it for the loop condition.
    ///
    /// Deprecated in favor of `throttled_at`; kept as an alternative strategy.
    pub fn throttled_reinterrupt_at(mut self, interval: Duration) -> Self {
        self.mode = Mode::ThrottledReinterrupt(Some(interval));
        self
    }

    /// Run `f` once when the loop ends
    pub fn on_finish<F>(mut self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.hook = Hook::effect(f);
        self
    }

    /// Hand the last good value to `f` when the loop ends
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.hook = Hook::consumer(f);
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Take the default interval and failure policy from `config`.
    pub fn with_config(mut self, config: &LoopConfig) -> Self {
        self.default_interval = config.default_interval();
        self.policy = config.failure_policy;
        self
    }

    /// Resolve defaults and produce the handle.
    pub fn build(self) -> LoopHandle<T> {
        let terminator: Box<dyn Terminator> = match (self.terminator, self.condition, self.deadline) {
            (Some(terminator), _, _) => terminator,
            (None, None, None) => Box::new(never()),
            (None, Some(condition), None) => condition,
            (None, None, Some(limit)) => Box::new(timeout(limit)),
            (None, Some(mut condition), Some(limit)) => Box::new(timeout_or_condition(move || condition.met(), limit)),
        };

        let iteration = match self.mode {
            Mode::Busy => Iteration::Busy,
            Mode::Throttled(interval) => Iteration::Throttled(interval.unwrap_or(self.default_interval)),
            Mode::ThrottledReinterrupt(interval) => {
                Iteration::ThrottledReinterrupt(interval.unwrap_or(self.default_interval))
            }
        };

        LoopHandle::new(self.work, terminator, iteration, self.hook, self.policy)
    }
}

/// Busy loop over `work`
pub fn hyper<T, F, E>(work: F) -> LoopBuilder<T>
where
    T: 'static,
    F: FnMut() -> Result<T, E> + Send + 'static,
    E: Into<BoxError>,
{
    LoopBuilder::new(work).busy()
}

/// Throttled loop over `work` at the default interval
pub fn sleepy<T, F, E>(work: F) -> LoopBuilder<T>
where
    T: 'static,
    F: FnMut() -> Result<T, E> + Send + 'static,
    E: Into<BoxError>,
{
    LoopBuilder::new(work).throttled()
}

/// Throttled loop over `work` at `interval`
pub fn sleepy_at<T, F, E>(work: F, interval: Duration) -> LoopBuilder<T>
where
    T: 'static,
    F: FnMut() -> Result<T, E> + Send + 'static,
    E: Into<BoxError>,
{
    LoopBuilder::new(work).throttled_at(interval)
}

/// Throttled loop with the consume-then-rearm cancellation idiom
pub fn sleepy_reinterrupt_at<T, F, E>(work: F, interval: Duration) -> LoopBuilder<T>
where
    T: 'static,
    F: FnMut() -> Result<T, E> + Send + 'static,
    E: Into<BoxError>,
{
    LoopBuilder::new(work).throttled_reinterrupt_at(interval)
}
