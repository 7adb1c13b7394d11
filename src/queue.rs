//! Blocking FIFO queue with strict waiter ordering
//!
//! This module provides [`FairQueue`], an unbounded multi-producer
//! multi-consumer queue where a consumer with nothing to take parks until a
//! producer hands it an item. Items are delivered in exact enqueue order, and
//! parked consumers are woken in exact arrival order: each enqueue signals only
//! the longest-waiting consumer's own condition variable, never a broadcast.
//!
//! # Example
//!
//! ```rust
//! use fair_queue::FairQueue;
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(FairQueue::new());
//!
//! let consumer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || queue.dequeue())
//! };
//!
//! queue.enqueue("job");
//! assert_eq!(consumer.join().unwrap(), "job");
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::waiter_queue::{Waiter, WaiterQueue};

/// An unbounded blocking FIFO queue with FIFO wakeup of waiting consumers
///
/// # Design
///
/// - **One coarse guard**: a single `parking_lot::Mutex` protects the item
///   store and the waiter registry together. There is no finer-grained locking
///   and no lock-free path; every state transition is one short critical
///   section.
/// - **Per-waiter condition variables**: each parked consumer waits on its own
///   condvar, registered in arrival order. A shared condvar would give no
///   control over which thread a signal wakes, and a broadcast would wake every
///   consumer to fight over one item. Detaching the front registry entry and
///   signaling exactly that condvar wakes precisely the longest-waiting
///   consumer.
/// - **Signal under the guard**: the producer detaches the waiter and signals
///   it inside the same critical section as the insert. Splitting the two would
///   open a window where a second producer sees an empty registry and wakes no
///   one while a consumer was eligible.
/// - **Unbounded**: `enqueue` never blocks beyond the critical section. There
///   is no backpressure; a producer that outpaces its consumers grows memory
///   without limit.
/// - **No cancellation**: a parked `dequeue` returns only via a matching
///   `enqueue`. There are no timeouts.
///
/// The queue is `Sync` for any `T: Send`; share it behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use fair_queue::FairQueue;
///
/// let queue = FairQueue::new();
/// queue.enqueue(1);
/// queue.enqueue(2);
///
/// assert_eq!(queue.dequeue(), 1);
/// assert_eq!(queue.dequeue(), 2);
/// assert_eq!(queue.try_dequeue(), None);
/// ```
pub struct FairQueue<T> {
    /// Item store and waiter registry, under the one guard
    state: Mutex<State<T>>,

    /// Number of items currently stored
    len: AtomicUsize,

    /// Number of consumers currently parked
    waiting: AtomicUsize,

    /// Lifetime count of successfully dequeued items
    visited: AtomicUsize,
}

/// Everything the guard protects
///
/// The counters live outside as atomics so the accessors can read them without
/// taking the guard; they are only ever written while the guard is held.
struct State<T> {
    /// Enqueued, not-yet-delivered items in arrival order
    items: VecDeque<T>,

    /// Parked consumers in arrival order; front is woken first
    waiters: WaiterQueue,
}

impl<T> FairQueue<T> {
    /// Create a new empty queue
    ///
    /// # Example
    ///
    /// ```rust
    /// use fair_queue::FairQueue;
    ///
    /// let queue: FairQueue<u64> = FairQueue::new();
    /// assert!(queue.is_empty());
    /// assert_eq!(queue.waiting(), 0);
    /// assert_eq!(queue.visited(), 0);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                waiters: WaiterQueue::new(),
            }),
            len: AtomicUsize::new(0),
            waiting: AtomicUsize::new(0),
            visited: AtomicUsize::new(0),
        }
    }

    /// Append an item and wake the longest-waiting consumer, if any
    ///
    /// Never blocks beyond the critical section and carries no failure signal.
    /// The item is stored verbatim; the queue attaches no meaning to it, so a
    /// payload like `None` or a null pointer wrapper is delivered as-is.
    ///
    /// At most one parked consumer is woken per call, always the one that has
    /// been waiting longest.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fair_queue::FairQueue;
    ///
    /// let queue = FairQueue::new();
    /// queue.enqueue(Some("payload"));
    /// queue.enqueue(None);
    ///
    /// assert_eq!(queue.len(), 2);
    /// assert_eq!(queue.dequeue(), Some("payload"));
    /// assert_eq!(queue.dequeue(), None);
    /// ```
    pub fn enqueue(&self, item: T) {
        let mut state = self.state.lock();

        state.items.push_back(item);
        self.len.fetch_add(1, Ordering::Relaxed);

        // Detach and signal under the guard: the registry update and the wake
        // must be one atomic step with respect to other producers.
        if let Some(slot) = state.waiters.detach_front() {
            slot.cv.notify_one();
        }
    }

    /// Remove and return the oldest item, parking until one is available
    ///
    /// If the queue is empty, the calling thread registers itself at the back
    /// of the waiter registry and parks on its own condition variable. It is
    /// woken by the producer whose item it is entitled to, re-checks the store,
    /// and takes the front item.
    ///
    /// A woken consumer that loses the re-acquired guard to a faster
    /// `try_dequeue` re-registers at the back of the registry; a fresh wait
    /// slot is created per loop iteration, never reused.
    ///
    /// There is no timeout and no cancellation: this call returns only once an
    /// item has been taken.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fair_queue::FairQueue;
    /// use std::sync::Arc;
    /// use std::thread;
    ///
    /// let queue = Arc::new(FairQueue::new());
    /// let consumer = {
    ///     let queue = Arc::clone(&queue);
    ///     thread::spawn(move || queue.dequeue())
    /// };
    ///
    /// queue.enqueue(7_u32);
    /// assert_eq!(consumer.join().unwrap(), 7);
    /// ```
    pub fn dequeue(&self) -> T {
        let mut state = self.state.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                self.len.fetch_sub(1, Ordering::Relaxed);
                self.visited.fetch_add(1, Ordering::Relaxed);
                return item;
            }

            self.waiting.fetch_add(1, Ordering::Relaxed);
            let slot = Waiter::new();
            state.waiters.register(slot.clone());

            // Atomically releases the guard and parks; reacquires on wake.
            slot.cv.wait(&mut state);

            self.waiting.fetch_sub(1, Ordering::Relaxed);
            if !slot.was_signaled() {
                // Spurious wake: the slot is still linked, take it back out
                // before dropping it so no producer signals a dead slot.
                state.waiters.remove(&slot);
            }
        }
    }

    /// Remove and return the oldest item without blocking
    ///
    /// Returns `None` if the queue is currently empty. `None` means exactly
    /// "empty right now", never an error, and this call never registers a
    /// waiter or touches any counter on the empty path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fair_queue::FairQueue;
    ///
    /// let queue = FairQueue::new();
    /// assert_eq!(queue.try_dequeue(), None);
    ///
    /// queue.enqueue('a');
    /// assert_eq!(queue.try_dequeue(), Some('a'));
    /// assert_eq!(queue.try_dequeue(), None);
    /// ```
    #[must_use]
    pub fn try_dequeue(&self) -> Option<T> {
        let mut state = self.state.lock();

        let item = state.items.pop_front()?;
        self.len.fetch_sub(1, Ordering::Relaxed);
        self.visited.fetch_add(1, Ordering::Relaxed);
        Some(item)
    }

    /// Number of items currently stored
    ///
    /// A momentary snapshot read without the guard: by the time the caller
    /// acts on it, concurrent operations may have changed it. At a quiescent
    /// point it equals total enqueues minus [`visited`](Self::visited).
    #[must_use]
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }

    /// Whether the queue currently stores no items
    ///
    /// Snapshot semantics, same as [`len`](Self::len).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of consumers currently parked in a blocking [`dequeue`](Self::dequeue)
    ///
    /// Snapshot semantics, same as [`len`](Self::len).
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Relaxed)
    }

    /// Lifetime count of items that have been enqueued and then dequeued
    ///
    /// Monotonically non-decreasing; incremented exactly once per successful
    /// blocking or non-blocking removal. Snapshot semantics, same as
    /// [`len`](Self::len).
    ///
    /// # Example
    ///
    /// ```rust
    /// use fair_queue::FairQueue;
    ///
    /// let queue = FairQueue::new();
    /// queue.enqueue(1);
    /// queue.enqueue(2);
    ///
    /// let _ = queue.dequeue();
    /// let _ = queue.try_dequeue();
    /// assert_eq!(queue.visited(), 2);
    /// ```
    #[must_use]
    pub fn visited(&self) -> usize {
        self.visited.load(Ordering::Relaxed)
    }
}

impl<T> Default for FairQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FairQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FairQueue")
            .field("len", &self.len())
            .field("waiting", &self.waiting())
            .field("visited", &self.visited())
            .finish()
    }
}
