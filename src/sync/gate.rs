//! Manual-reset event.
//!
//! A `Gate` stays signaled until explicitly reset: waiters that arrive
//! after a `signal` return immediately, and a `signal` wakes every thread
//! already parked in `wait`. Spurious condvar wakeups are filtered by the
//! while-loop in `wait`; lost wakeups cannot occur because the flag and
//! the condvar live under the same mutex.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A stateful condition signal with explicit set/reset.
#[derive(Debug, Default)]
pub struct Gate {
    signaled: Mutex<bool>,
    cond: Condvar,
}

impl Gate {
    /// Create a gate in the cleared state.
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means a peer thread panicked; the boolean
    // itself is still valid, and the finished gate must stay signalable
    // while that thread unwinds.
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.signaled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the gate and wake all current waiters. Idempotent.
    pub fn signal(&self) {
        let mut signaled = self.lock();
        *signaled = true;
        self.cond.notify_all();
    }

    /// Clear the gate. Idempotent. Threads already released by an earlier
    /// signal are unaffected.
    pub fn reset(&self) {
        *self.lock() = false;
    }

    /// Block until the gate is signaled. Returns immediately if it
    /// already is.
    pub fn wait(&self) {
        let mut signaled = self.lock();
        while !*signaled {
            signaled = self
                .cond
                .wait(signaled)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Current state, without blocking.
    pub fn is_signaled(&self) -> bool {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn spawn_waiter(gate: &Arc<Gate>) -> thread::JoinHandle<()> {
        let gate = Arc::clone(gate);
        thread::spawn(move || gate.wait())
    }

    #[test]
    fn test_starts_cleared() {
        let gate = Gate::new();
        assert!(!gate.is_signaled());
    }

    #[test]
    fn test_signal_before_wait_is_remembered() {
        let gate = Gate::new();
        gate.signal();
        // Must return without any concurrent signaler.
        gate.wait();
    }

    #[test]
    fn test_wait_blocks_then_signal_releases() {
        let gate = Arc::new(Gate::new());
        let waiter = spawn_waiter(&gate);
        thread::sleep(Duration::from_millis(50));
        assert!(!waiter.is_finished());
        gate.signal();
        waiter.join().unwrap();
    }

    #[test]
    fn test_reset_clears_state() {
        let gate = Arc::new(Gate::new());
        gate.signal();
        gate.reset();
        assert!(!gate.is_signaled());

        let waiter = spawn_waiter(&gate);
        thread::sleep(Duration::from_millis(80));
        assert!(!waiter.is_finished(), "waiter ran through a reset gate");
        gate.signal();
        waiter.join().unwrap();
    }

    #[test]
    fn test_multiple_waiters_all_released() {
        let gate = Arc::new(Gate::new());
        let waiters: Vec<_> = (0..5).map(|_| spawn_waiter(&gate)).collect();
        thread::sleep(Duration::from_millis(50));
        gate.signal();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }

    #[test]
    fn test_repeated_waits_without_reset() {
        let gate = Gate::new();
        gate.signal();
        gate.wait();
        gate.wait();
    }

    #[test]
    fn test_signal_is_idempotent() {
        let gate = Gate::new();
        gate.signal();
        gate.signal();
        gate.wait();
        assert!(gate.is_signaled());
    }

    #[test]
    fn test_double_signal_then_reset_blocks() {
        let gate = Arc::new(Gate::new());
        gate.signal();
        gate.signal();
        gate.reset();

        let waiter = spawn_waiter(&gate);
        thread::sleep(Duration::from_millis(80));
        assert!(!waiter.is_finished());
        gate.signal();
        waiter.join().unwrap();
    }

    #[test]
    fn test_many_signal_wait_cycles() {
        let gate = Arc::new(Gate::new());
        for _ in 0..10 {
            gate.reset();
            let waiter = spawn_waiter(&gate);
            thread::sleep(Duration::from_millis(5));
            gate.signal();
            waiter.join().unwrap();
        }
    }

    #[test]
    fn test_stress_waiters() {
        let gate = Arc::new(Gate::new());
        let waiters: Vec<_> = (0..32).map(|_| spawn_waiter(&gate)).collect();
        thread::sleep(Duration::from_millis(30));
        gate.signal();
        for waiter in waiters {
            waiter.join().unwrap();
        }
    }
}
