//! A fair counting semaphore.
//!
//! The standard library has no counting semaphore, and the queue needs
//! one with three properties the usual condvar loop does not give:
//! FIFO fairness under steady load, multi-permit acquisition that
//! cannot be starved by smaller requests, and a cancellation path that
//! wakes every waiter without leaking permits. Waiters take a ticket;
//! only the holder of the front ticket may claim permits, so arrival
//! order is delivery order.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// A blocking wait was cancelled by [`Semaphore::interrupt_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

struct State {
    permits: usize,
    waiters: VecDeque<u64>,
    next_ticket: u64,
    interrupted: bool,
}

impl State {
    fn enqueue(&mut self) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.waiters.push_back(ticket);
        ticket
    }

    fn abandon(&mut self, ticket: u64) {
        if let Some(index) = self.waiters.iter().position(|&t| t == ticket) {
            self.waiters.remove(index);
        }
    }

    fn my_turn(&self, ticket: u64, permits: usize) -> bool {
        self.waiters.front() == Some(&ticket) && self.permits >= permits
    }
}

/// A FIFO-fair counting semaphore.
pub struct Semaphore {
    state: Mutex<State>,
    available: Condvar,
}

impl Semaphore {
    /// Create a semaphore holding `permits` initial permits.
    pub fn new(permits: usize) -> Self {
        Self {
            state: Mutex::new(State {
                permits,
                waiters: VecDeque::new(),
                next_ticket: 0,
                interrupted: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Acquire `permits` permits, blocking until they are available.
    ///
    /// Returns `Err(Interrupted)` if the semaphore is interrupted before
    /// the permits are claimed; no permits are retained in that case.
    pub fn acquire(&self, permits: usize) -> Result<(), Interrupted> {
        let mut state = self.state.lock();

        if state.interrupted {
            return Err(Interrupted);
        }

        if state.waiters.is_empty() && state.permits >= permits {
            state.permits -= permits;
            return Ok(());
        }

        let ticket = state.enqueue();

        loop {
            if state.interrupted {
                state.abandon(ticket);
                self.available.notify_all();
                return Err(Interrupted);
            }

            if state.my_turn(ticket, permits) {
                state.waiters.pop_front();
                state.permits -= permits;
                self.available.notify_all();
                return Ok(());
            }

            self.available.wait(&mut state);
        }
    }

    /// Acquire `permits` permits, waiting at most `timeout`.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` on timeout.
    pub fn acquire_timeout(
        &self,
        permits: usize,
        timeout: Duration,
    ) -> Result<bool, Interrupted> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();

        if state.interrupted {
            return Err(Interrupted);
        }

        if state.waiters.is_empty() && state.permits >= permits {
            state.permits -= permits;
            return Ok(true);
        }

        let ticket = state.enqueue();

        loop {
            if state.interrupted {
                state.abandon(ticket);
                self.available.notify_all();
                return Err(Interrupted);
            }

            if state.my_turn(ticket, permits) {
                state.waiters.pop_front();
                state.permits -= permits;
                self.available.notify_all();
                return Ok(true);
            }

            if self.available.wait_until(&mut state, deadline).timed_out() {
                state.abandon(ticket);
                self.available.notify_all();
                return Ok(false);
            }
        }
    }

    /// Acquire `permits` permits without blocking.
    ///
    /// Fails whenever earlier waiters are queued, even if enough permits
    /// are on hand; barging past a blocked waiter would defeat fairness.
    pub fn try_acquire(&self, permits: usize) -> bool {
        let mut state = self.state.lock();

        if state.interrupted || !state.waiters.is_empty() || state.permits < permits {
            return false;
        }

        state.permits -= permits;
        true
    }

    /// Return `permits` permits to the semaphore.
    pub fn release(&self, permits: usize) {
        let mut state = self.state.lock();
        state.permits += permits;
        self.available.notify_all();
    }

    /// Remove and return every available permit.
    pub fn drain(&self) -> usize {
        let mut state = self.state.lock();
        std::mem::take(&mut state.permits)
    }

    /// The number of permits currently available.
    pub fn available(&self) -> usize {
        self.state.lock().permits
    }

    /// Permanently cancel all present and future blocking acquires.
    pub fn interrupt_all(&self) {
        let mut state = self.state.lock();
        state.interrupted = true;
        self.available.notify_all();
    }
}
