//! loopkit - loop decorators with cooperative cancellation
//!
//! Wraps a single unit of work into a handle that runs it repeatedly until a
//! termination predicate is met, a deadline passes, or the executing context
//! is cancelled. The handle is run once by whatever host the caller chooses;
//! loopkit spawns no threads of its own.
//!
//! ```text
//! terminator (never | timeout | condition | both)
//!   × iteration (busy | throttled | throttled + reinterrupt)
//!   × hook (none | effect | consumer)
//!   → LoopHandle → host runs it once → LoopReport
//! ```

pub mod builder;
pub mod cancel;
pub mod config;
pub mod error;
pub mod handle;
pub mod hook;
pub mod strategy;
pub mod terminator;

pub use builder::{LoopBuilder, hyper, sleepy, sleepy_at, sleepy_reinterrupt_at};
pub use cancel::{CancelGroup, CancellationToken, Cancelled};
pub use config::LoopConfig;
pub use error::{BoxError, LoopError, Result};
pub use handle::{FailurePolicy, LoopHandle, LoopReport};
pub use hook::Hook;
pub use strategy::{DEFAULT_INTERVAL, Exit, Iteration};
pub use terminator::{Terminator, never, timeout, timeout_or_condition};
