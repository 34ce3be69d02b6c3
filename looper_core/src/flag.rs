//! Level-triggered boolean signal for cross-thread control.
//!
//! The capture daemon, playback daemon and mix engine are each driven
//! by one or more of these: a thread raises a flag and the consumer
//! observes it on its own schedule (a sleep-poll loop or a check at
//! the top of a realtime callback) rather than being woken by it.
//! This mirrors the `threading.Event`-style flags the control loop
//! used to gate the recorder and player daemons.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheaply cloneable, shareable boolean signal.
///
/// All clones of a `Flag` observe the same underlying state; there is
/// no queueing or edge detection, only the current level.
#[derive(Clone, Debug, Default)]
pub struct Flag(Arc<AtomicBool>);

impl Flag {
    /// Create a new flag, initially clear.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Create a new flag with the given initial state.
    pub fn new_with(initial: bool) -> Self {
        Self(Arc::new(AtomicBool::new(initial)))
    }

    /// Raise the flag.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear the flag.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    /// Read the current state.
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Block the calling thread until the flag is raised, polling at
    /// the given interval. Intended for non-realtime threads only.
    pub fn wait_until_set(&self, poll_interval: std::time::Duration) {
        while !self.is_set() {
            std::thread::sleep(poll_interval);
        }
    }

    /// Block the calling thread until the flag is cleared, polling at
    /// the given interval. Intended for non-realtime threads only.
    pub fn wait_until_clear(&self, poll_interval: std::time::Duration) {
        while self.is_set() {
            std::thread::sleep(poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_clear() {
        let flag = Flag::new();
        assert!(!flag.is_set());
    }

    #[test]
    fn set_and_clear() {
        let flag = Flag::new();
        flag.set();
        assert!(flag.is_set());
        flag.clear();
        assert!(!flag.is_set());
    }

    #[test]
    fn clones_share_state() {
        let flag = Flag::new();
        let other = flag.clone();
        flag.set();
        assert!(other.is_set());
    }

    #[test]
    fn wait_until_set_observes_other_thread() {
        let flag = Flag::new();
        let setter = flag.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            setter.set();
        });
        flag.wait_until_set(Duration::from_millis(1));
        assert!(flag.is_set());
        handle.join().unwrap();
    }
}
