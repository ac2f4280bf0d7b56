//! Cooperative cancellation for running loops.
//!
//! A `CancellationToken` is an advisory flag owned by whatever context
//! executes a loop. The loop never gets preempted: it only notices the flag at
//! its defined check points, either by polling it (`observe`) or by having a
//! delay cut short (`suspend`). Both of those consume the flag, so a loop that
//! wants the signal to stay visible must `rearm` it.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

/// A suspension was cut short by a cancellation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("suspension cancelled")]
pub struct Cancelled;

#[derive(Debug, Default)]
struct Inner {
    armed: Mutex<bool>,
    wake: Condvar,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.armed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Shared cancellation flag for one executing context.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Create a token that has not been signalled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the flag and wake any thread suspended on this token.
    pub fn signal(&self) {
        let mut armed = self.inner.lock();
        *armed = true;
        self.inner.wake.notify_all();
    }

    /// Arm the flag again after a check point consumed it.
    pub fn rearm(&self) {
        self.signal();
    }

    /// Peek at the flag without consuming it.
    pub fn is_signalled(&self) -> bool {
        *self.inner.lock()
    }

    /// Non-blocking poll. Returns whether the flag was armed and clears it.
    pub fn observe(&self) -> bool {
        std::mem::take(&mut *self.inner.lock())
    }

    /// Block for up to `interval`, returning early with `Cancelled` if the flag
    /// is or becomes armed. An early return consumes the flag.
    pub fn suspend(&self, interval: Duration) -> Result<(), Cancelled> {
        let guard = self.inner.lock();
        let (mut armed, _) = self
            .inner
            .wake
            .wait_timeout_while(guard, interval, |armed| !*armed)
            .unwrap_or_else(PoisonError::into_inner);

        if *armed {
            *armed = false;
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Issues tokens and cancels all of them at once.
///
/// Mirrors a host shutting down every task it runs: each task gets its own
/// token, and `cancel_all` signals each one.
#[derive(Debug, Default)]
pub struct CancelGroup {
    tokens: Mutex<Vec<CancellationToken>>,
}

impl CancelGroup {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token that belongs to this group.
    pub fn token(&self) -> CancellationToken {
        let token = CancellationToken::new();
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(token.clone());
        token
    }

    /// Signal every token issued so far.
    pub fn cancel_all(&self) {
        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        log::info!("Cancelling {} loop(s)", tokens.len());
        for token in tokens.iter() {
            token.signal();
        }
    }

    /// Number of tokens issued
    pub fn len(&self) -> usize {
        self.tokens.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no tokens have been issued
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_new_token_is_not_signalled() {
        let token = CancellationToken::new();
        assert!(!token.is_signalled());
        assert!(!token.observe());
    }

    #[test]
    fn test_observe_consumes_signal() {
        let token = CancellationToken::new();
        token.signal();
        assert!(token.is_signalled());
        assert!(token.observe());
        assert!(!token.observe());
        assert!(!token.is_signalled());
    }

    #[test]
    fn test_clones_share_flag() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.signal();
        assert!(token.is_signalled());
    }

    #[test]
    fn test_suspend_runs_full_interval_when_not_signalled() {
        let token = CancellationToken::new();
        let start = Instant::now();
        assert_eq!(token.suspend(Duration::from_millis(50)), Ok(()));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_suspend_returns_immediately_when_already_signalled() {
        let token = CancellationToken::new();
        token.signal();
        let start = Instant::now();
        assert_eq!(token.suspend(Duration::from_secs(5)), Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!token.is_signalled(), "suspend should consume the signal");
    }

    #[test]
    fn test_suspend_zero_interval_still_checks_flag() {
        let token = CancellationToken::new();
        assert_eq!(token.suspend(Duration::ZERO), Ok(()));
        token.signal();
        assert_eq!(token.suspend(Duration::ZERO), Err(Cancelled));
    }

    #[test]
    fn test_signal_wakes_suspended_thread() {
        let token = CancellationToken::new();
        let waiter = token.clone();
        let start = Instant::now();
        let handle = thread::spawn(move || waiter.suspend(Duration::from_secs(10)));

        thread::sleep(Duration::from_millis(50));
        token.signal();

        assert_eq!(handle.join().unwrap(), Err(Cancelled));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_rearm_after_consume() {
        let token = CancellationToken::new();
        token.signal();
        assert_eq!(token.suspend(Duration::from_millis(10)), Err(Cancelled));
        token.rearm();
        assert!(token.observe());
    }

    #[test]
    fn test_cancel_group_signals_every_token() {
        let group = CancelGroup::new();
        assert!(group.is_empty());
        let a = group.token();
        let b = group.token();
        assert_eq!(group.len(), 2);

        group.cancel_all();
        assert!(a.is_signalled());
        assert!(b.is_signalled());
    }
}
