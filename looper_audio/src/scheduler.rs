//! Absolute-wall-time one-shot timer scheduler.
//!
//! A `BinaryHeap`-backed min-heap of timers polled by one dedicated
//! thread, referenced by cancellable [`TimerHandle`]s. Callers compute
//! next-fire times from the beat clock's anchor, never by cumulative
//! addition — this type only owns the heap and the polling thread.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::Instant;

use tracing::warn;

/// A handle to a scheduled, not-yet-fired timer. Dropping the handle
/// does not cancel the timer; call [`TimerHandle::cancel`] explicitly.
#[derive(Clone)]
pub struct TimerHandle {
    cancelled: Arc<AtomicBool>,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, AtomicOrdering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(AtomicOrdering::SeqCst)
    }
}

struct Entry {
    fire_at: Instant,
    seq: u64,
    cancelled: Arc<AtomicBool>,
    callback: Box<dyn FnOnce() + Send>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_at == other.fire_at && self.seq == other.seq
    }
}
impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    /// Reversed so `BinaryHeap` (a max-heap) behaves as a min-heap on
    /// `fire_at`; ties broken by insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        other.fire_at.cmp(&self.fire_at).then_with(|| other.seq.cmp(&self.seq))
    }
}

struct SchedulerState {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
    shutdown: bool,
}

/// Owns the timer heap and its polling thread; the lifetime of one
/// `Looper` instance. Cheaply cloneable — every clone shares the same
/// heap and the same background thread, which is what lets scheduled
/// callbacks reschedule themselves.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<(Mutex<SchedulerState>, Condvar)>,
    _thread: Arc<thread::JoinHandle<()>>,
}

impl Scheduler {
    pub fn start() -> Self {
        let inner = Arc::new((
            Mutex::new(SchedulerState { heap: BinaryHeap::new(), next_seq: 0, shutdown: false }),
            Condvar::new(),
        ));
        let worker = Arc::clone(&inner);
        let thread = thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || Self::run(worker))
            .expect("failed to spawn scheduler thread");

        Self { inner, _thread: Arc::new(thread) }
    }

    fn run(state: Arc<(Mutex<SchedulerState>, Condvar)>) {
        let (lock, condvar) = &*state;
        loop {
            let mut guard = lock.lock().unwrap();
            let due = loop {
                if guard.shutdown {
                    return;
                }
                match guard.heap.peek() {
                    None => {
                        guard = condvar.wait(guard).unwrap();
                    }
                    Some(entry) => {
                        let now = Instant::now();
                        if entry.fire_at <= now {
                            break true;
                        }
                        let (g, timeout) = condvar.wait_timeout(guard, entry.fire_at - now).unwrap();
                        guard = g;
                        if timeout.timed_out() && guard.heap.peek().is_some_and(|e| e.fire_at <= Instant::now()) {
                            break true;
                        }
                    }
                }
            };

            if !due {
                continue;
            }
            let entry = match guard.heap.pop() {
                Some(entry) => entry,
                None => continue,
            };
            drop(guard);

            if entry.cancelled.load(AtomicOrdering::SeqCst) {
                continue;
            }
            if entry.fire_at > Instant::now() + std::time::Duration::from_millis(1) {
                warn!("scheduler timer fired ahead of schedule, rescheduling");
                let mut guard = lock.lock().unwrap();
                guard.heap.push(entry);
                condvar.notify_one();
                continue;
            }
            (entry.callback)();
        }
    }

    /// Schedule a one-shot callback at an absolute instant. Returns a
    /// handle the caller can cancel before it fires.
    pub fn schedule_at(&self, fire_at: Instant, callback: impl FnOnce() + Send + 'static) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle = TimerHandle { cancelled: Arc::clone(&cancelled) };

        let (lock, condvar) = &*self.inner;
        let mut guard = lock.lock().unwrap();
        let seq = guard.next_seq;
        guard.next_seq += 1;
        guard.heap.push(Entry { fire_at, seq, cancelled, callback: Box::new(callback) });
        condvar.notify_one();

        handle
    }

    /// Schedule a one-shot callback after `delay` from now. A thin
    /// convenience wrapper; the stored deadline is still absolute.
    pub fn schedule_after(&self, delay: std::time::Duration, callback: impl FnOnce() + Send + 'static) -> TimerHandle {
        self.schedule_at(Instant::now() + delay, callback)
    }

    pub fn shutdown(&self) {
        let (lock, condvar) = &*self.inner;
        let mut guard = lock.lock().unwrap();
        guard.shutdown = true;
        condvar.notify_one();
    }
}
