//! Completion hooks, fired once when a loop ends.

use std::fmt;

/// Action run exactly once after the final iteration.
pub enum Hook<T> {
    /// Nothing to do.
    None,
    /// Side effect that ignores the loop's value.
    Effect(Box<dyn FnOnce() + Send>),
    /// Receives the last good value (or the default if no iteration succeeded).
    Consumer(Box<dyn FnOnce(&T) + Send>),
}

impl<T> Hook<T> {
    /// Wrap a side effect
    pub fn effect<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Hook::Effect(Box::new(f))
    }

    /// Wrap a consumer of the last value
    pub fn consumer<F>(f: F) -> Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        Hook::Consumer(Box::new(f))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Hook::None)
    }

    pub(crate) fn fire(self, last: &T) {
        match self {
            Hook::None => {}
            Hook::Effect(f) => f(),
            Hook::Consumer(f) => f(last),
        }
    }
}

impl<T> Default for Hook<T> {
    fn default() -> Self {
        Hook::None
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::None => write!(f, "None"),
            Hook::Effect(_) => write!(f, "Effect"),
            Hook::Consumer(_) => write!(f, "Consumer"),
        }
    }
}
