//! Lock-free single-producer single-consumer ring buffer.
//!
//! Provides a realtime-safe channel for inter-thread communication,
//! suitable for audio thread to I/O thread communication where
//! blocking is unacceptable.

use core::{cell::UnsafeCell, mem::MaybeUninit};
#[cfg(not(loom))]
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

#[cfg(loom)]
use loom::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Cache-line padded wrapper to prevent false sharing.
///
/// On most modern x86/ARM CPUs, cache lines are 64 bytes.
/// Padding head and tail to separate cache lines prevents
/// false sharing between producer and consumer threads.
#[repr(align(64))]
struct CachePadded<T>(T);

impl<T> CachePadded<T> {
    const fn new(value: T) -> Self {
        CachePadded(value)
    }
}

impl<T> core::ops::Deref for CachePadded<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Internal shared state for the ring buffer.
struct SpscRingBufferInner<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    capacity: usize,
    mask: usize,
    head: CachePadded<AtomicUsize>, // Write position (producer)
    tail: CachePadded<AtomicUsize>, // Read position (consumer)
}

// SAFETY: SpscRingBufferInner can be shared between threads if T: Send
// because access is synchronized through atomic operations.
unsafe impl<T: Send> Send for SpscRingBufferInner<T> {}
unsafe impl<T: Send> Sync for SpscRingBufferInner<T> {}

impl<T> SpscRingBufferInner<T> {
    fn new(capacity: usize) -> Self {
        // Round up to next power of 2
        let capacity = capacity.next_power_of_two().max(1);
        let mask = capacity - 1;

        // Allocate buffer
        let buffer: Vec<UnsafeCell<MaybeUninit<T>>> =
            (0..capacity).map(|_| UnsafeCell::new(MaybeUninit::uninit())).collect();

        Self {
            buffer: buffer.into_boxed_slice(),
            capacity,
            mask,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }
}

impl<T> Drop for SpscRingBufferInner<T> {
    fn drop(&mut self) {
        // Drop any remaining items in the buffer
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);

        for i in tail..head {
            let index = i & self.mask;
            // SAFETY: Elements between tail and head are initialized
            unsafe {
                let ptr = (*self.buffer[index].get()).as_mut_ptr();
                core::ptr::drop_in_place(ptr);
            }
        }
    }
}

/// Factory for creating producer/consumer pairs.
pub struct SpscRingBuffer;

impl SpscRingBuffer {
    /// Creates a new SPSC ring buffer with the given capacity.
    ///
    /// The actual capacity will be rounded up to the next power of 2.
    /// Returns a `(Producer, Consumer)` pair for inter-thread communication.
    ///
    /// # Examples
    ///
    /// ```
    /// use looper_core::spsc::SpscRingBuffer;
    ///
    /// let (mut producer, mut consumer) = SpscRingBuffer::new::<i32>(4);
    ///
    /// producer.try_push(42).unwrap();
    /// assert_eq!(consumer.try_pop(), Some(42));
    /// ```
    #[allow(clippy::new_ret_no_self)]
    pub fn new<T>(capacity: usize) -> (Producer<T>, Consumer<T>) {
        let inner = Arc::new(SpscRingBufferInner::new(capacity));
        (
            Producer {
                inner: Arc::clone(&inner),
            },
            Consumer { inner },
        )
    }
}

/// Producer handle for pushing items into the ring buffer.
///
/// This type is `Send` but not `Clone` - only one producer should exist.
pub struct Producer<T> {
    inner: Arc<SpscRingBufferInner<T>>,
}

// SAFETY: Producer can be sent to another thread if T: Send
unsafe impl<T: Send> Send for Producer<T> {}

impl<T> Producer<T> {
    /// Attempts to push a value into the buffer.
    ///
    /// Returns `Ok(())` if successful, or `Err(value)` if the buffer is full.
    /// This operation is lock-free and will never block.
    #[inline]
    pub fn try_push(&mut self, value: T) -> Result<(), T> {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Acquire);

        if head.wrapping_sub(tail) >= self.inner.capacity {
            return Err(value);
        }

        let index = head & self.inner.mask;
        // SAFETY: We've verified there's space, and only producer writes to this slot
        unsafe {
            (*self.inner.buffer[index].get()).write(value);
        }

        self.inner.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Returns the number of items currently in the buffer.
    ///
    /// This is an approximate count and may be stale by the time it's used.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    /// Returns `true` if the buffer is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.inner.capacity
    }

    /// Returns `true` if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity of the buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

/// Consumer handle for popping items from the ring buffer.
///
/// This type is `Send` but not `Clone` - only one consumer should exist.
pub struct Consumer<T> {
    inner: Arc<SpscRingBufferInner<T>>,
}

// SAFETY: Consumer can be sent to another thread if T: Send
unsafe impl<T: Send> Send for Consumer<T> {}

impl<T> Consumer<T> {
    /// Attempts to pop a value from the buffer.
    ///
    /// Returns `Some(value)` if successful, or `None` if the buffer is empty.
    /// This operation is lock-free and will never block.
    #[inline]
    pub fn try_pop(&mut self) -> Option<T> {
        let tail = self.inner.tail.load(Ordering::Relaxed);
        let head = self.inner.head.load(Ordering::Acquire);

        if tail >= head {
            return None;
        }

        let index = tail & self.inner.mask;
        // SAFETY: We've verified there's data, and only consumer reads from this slot
        let value = unsafe { (*self.inner.buffer[index].get()).assume_init_read() };

        self.inner.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// Returns the number of items currently in the buffer.
    ///
    /// This is an approximate count and may be stale by the time it's used.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.inner.head.load(Ordering::Relaxed);
        let tail = self.inner.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }

    /// Returns `true` if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the buffer is full.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.len() >= self.inner.capacity
    }

    /// Returns the capacity of the buffer.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}


#[cfg(loom)]
mod loom_tests {
    use loom::thread;

    use super::*;

    #[test]
    fn loom_concurrent_push_pop() {
        loom::model(|| {
            let (mut producer, mut consumer) = SpscRingBuffer::new::<i32>(2);

            let producer_thread = thread::spawn(move || {
                let _ = producer.try_push(1);
                let _ = producer.try_push(2);
            });

            let consumer_thread = thread::spawn(move || {
                let mut received = Vec::new();
                for _ in 0..2 {
                    if let Some(v) = consumer.try_pop() {
                        received.push(v);
                    }
                }
                received
            });

            producer_thread.join().unwrap();
            let _received = consumer_thread.join().unwrap();
        });
    }

    #[test]
    fn loom_single_item() {
        loom::model(|| {
            let (mut producer, mut consumer) = SpscRingBuffer::new::<i32>(1);

            let producer_thread = thread::spawn(move || producer.try_push(42).ok());

            let consumer_thread = thread::spawn(move || consumer.try_pop());

            let push_result = producer_thread.join().unwrap();
            let pop_result = consumer_thread.join().unwrap();

            // Either push succeeded and pop got it, or ordering caused miss
            if push_result.is_some() {
                // Push happened, pop may or may not have gotten it
                assert!(pop_result.is_none() || pop_result == Some(42));
            }
        });
    }
}
