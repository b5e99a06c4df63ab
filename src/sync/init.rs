//! One-shot initialization coordination.
//!
//! An [`Initializer`] elects exactly one caller to perform a lazy
//! initialization routine. A volatile-style flag short-circuits the
//! common already-initialized path without synchronizing; losers of the
//! election either wait for the winner (synchronized mode) or proceed
//! immediately (run-once mode).
//!
//! The winner receives an [`InitToken`] and must resolve it with
//! [`InitToken::done`] or [`InitToken::retry`]. Holding the election
//! lock is encoded in the token itself: it cannot be sent to another
//! thread, and dropping it unresolved behaves as `retry`, so the
//! original's "caller does not hold the lock" failure mode cannot be
//! expressed.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::lock_api::RawMutex as _;
use parking_lot::RawMutex;

/// A one-shot initialization barrier.
///
/// ```
/// use filequeue::sync::Initializer;
///
/// let init = Initializer::new();
///
/// if let Some(token) = init.need() {
///     // ... perform the expensive setup exactly once ...
///     token.done();
/// }
///
/// assert!(init.initialized());
/// ```
pub struct Initializer {
    initialized: AtomicBool,
    claimed: AtomicBool,
    synchronize: bool,
    lock: RawMutex,
}

impl Initializer {
    /// Create a synchronized initializer: competing [`need`] callers
    /// block until the elected caller resolves its token.
    ///
    /// [`need`]: Initializer::need
    pub const fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
            synchronize: true,
            lock: RawMutex::INIT,
        }
    }

    /// Create a run-once initializer: [`need`] never blocks, and only
    /// the first caller to claim the election observes a token. The
    /// winner is treated as initialized immediately, while it is still
    /// running.
    ///
    /// [`need`]: Initializer::need
    pub const fn run_once() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            claimed: AtomicBool::new(false),
            synchronize: false,
            lock: RawMutex::INIT,
        }
    }

    /// Determine whether the caller must perform initialization.
    ///
    /// Returns `Some` for exactly the caller that owns the
    /// initialization; that caller must resolve the returned token. In
    /// synchronized mode this call blocks while another caller's token
    /// is outstanding.
    pub fn need(&self) -> Option<InitToken<'_>> {
        if self.initialized.load(Ordering::Acquire) {
            return None;
        }

        if self.synchronize {
            self.lock.lock();

            if self.initialized.load(Ordering::Acquire) {
                // Safety: the lock was taken on the line above.
                unsafe { self.lock.unlock() };
                return None;
            }

            Some(InitToken {
                owner: self,
                locked: true,
                resolved: false,
                _not_send: PhantomData,
            })
        } else if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.initialized.store(true, Ordering::Release);

            Some(InitToken {
                owner: self,
                locked: false,
                resolved: false,
                _not_send: PhantomData,
            })
        } else {
            None
        }
    }

    /// Whether initialization has been marked complete.
    ///
    /// Never synchronizes. In run-once mode this may return `true`
    /// while the elected caller is still running.
    pub fn initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Reset to the uninitialized state, so the next [`need`] caller is
    /// elected again. Must not race an outstanding token.
    ///
    /// [`need`]: Initializer::need
    pub fn clear(&self) {
        if self.synchronize {
            self.lock.lock();
            self.initialized.store(false, Ordering::Release);
            // Safety: the lock was taken on the line above.
            unsafe { self.lock.unlock() };
        } else {
            self.initialized.store(false, Ordering::Release);
            self.claimed.store(false, Ordering::Release);
        }
    }
}

impl Default for Initializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that the holder won an [`Initializer`] election.
///
/// Resolve with [`done`](InitToken::done) on success or
/// [`retry`](InitToken::retry) on failure; dropping the token
/// unresolved behaves as `retry`. The token cannot leave the electing
/// thread.
#[must_use = "the election is unresolved until done() or retry() is called"]
pub struct InitToken<'a> {
    owner: &'a Initializer,
    locked: bool,
    resolved: bool,
    _not_send: PhantomData<*const ()>,
}

impl InitToken<'_> {
    /// Mark initialization complete and release waiting callers.
    pub fn done(mut self) {
        self.owner.initialized.store(true, Ordering::Release);
        self.resolved = true;
    }

    /// Mark initialization failed; a later [`Initializer::need`] caller
    /// will be elected to retry it.
    pub fn retry(mut self) {
        self.owner.initialized.store(false, Ordering::Release);

        if !self.owner.synchronize {
            self.owner.claimed.store(false, Ordering::Release);
        }

        self.resolved = true;
    }
}

impl Drop for InitToken<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            self.owner.initialized.store(false, Ordering::Release);

            if !self.owner.synchronize {
                self.owner.claimed.store(false, Ordering::Release);
            }
        }

        if self.locked {
            // Safety: a locked token is created only by the thread that
            // took the lock, and the token cannot be sent elsewhere.
            unsafe { self.owner.lock.unlock() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn first_caller_is_elected() {
        let init = Initializer::new();

        let token = init.need().expect("first caller must be elected");
        assert!(!init.initialized());

        token.done();
        assert!(init.initialized());
        assert!(init.need().is_none());
    }

    #[test]
    fn retry_reopens_the_election() {
        let init = Initializer::new();

        init.need().unwrap().retry();
        assert!(!init.initialized());

        init.need().unwrap().done();
        assert!(init.need().is_none());
    }

    #[test]
    fn unresolved_drop_behaves_as_retry() {
        let init = Initializer::new();

        drop(init.need().unwrap());
        assert!(!init.initialized());
        assert!(init.need().is_some());
    }

    #[test]
    fn clear_resets() {
        let init = Initializer::new();

        init.need().unwrap().done();
        init.clear();

        assert!(!init.initialized());
        init.need().unwrap().done();
        assert!(init.initialized());
    }

    #[test]
    fn synchronized_losers_wait_for_the_winner() {
        let init = Arc::new(Initializer::new());
        let ran = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let init = init.clone();
            let ran = ran.clone();

            handles.push(thread::spawn(move || {
                if let Some(token) = init.need() {
                    thread::sleep(Duration::from_millis(30));
                    ran.fetch_add(1, Ordering::SeqCst);
                    token.done();
                }

                // By the time any loser returns, the winner is done.
                assert!(init.initialized());
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn run_once_does_not_block_losers() {
        let init = Arc::new(Initializer::run_once());

        let token = init.need().expect("first caller wins the claim");

        // The winner has not resolved, yet competitors return at once.
        assert!(init.need().is_none());
        assert!(init.initialized());

        token.done();
        assert!(init.need().is_none());
    }

    #[test]
    fn run_once_retry_reopens_the_claim() {
        let init = Initializer::run_once();

        init.need().unwrap().retry();
        assert!(!init.initialized());
        assert!(init.need().is_some());
    }
}
