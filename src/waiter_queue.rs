//! Ordered registry of parked consumers
//!
//! This module provides the waiter registry used by [`FairQueue`]: a FIFO list
//! of per-waiter condition variable slots. Each parked consumer owns exactly one
//! slot, and the position of that slot in the registry **is** the wakeup order.
//!
//! The registry itself carries no lock. It lives inside the queue state that the
//! queue's single guard protects, so every registry operation already happens
//! inside a critical section. Keeping one coarse lock over both the item store
//! and this registry is what makes "detach the oldest waiter and signal it"
//! atomic with respect to concurrent enqueues and dequeues.
//!
//! [`FairQueue`]: crate::FairQueue

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Condvar;

/// A single parked consumer's wait slot
///
/// Holds the condition variable that exactly one consumer parks on, plus a flag
/// recording whether a producer has already detached and signaled this slot.
///
/// A slot is shared between two owners via `Arc`:
/// - the registry, while the slot is linked in (from registration until a
///   producer detaches it or the consumer removes it after a spurious wake);
/// - the parking consumer, for the duration of one wait-loop iteration.
///
/// The consumer creates a fresh slot for every iteration of its wait loop and
/// drops it on wake; a slot is never re-linked once detached.
pub(crate) struct Waiter {
    /// The condition variable this slot's consumer parks on
    ///
    /// Only ever paired with the owning queue's state mutex.
    pub(crate) cv: Condvar,

    /// Set by the producer that detaches this slot, inside the critical section
    ///
    /// Lets the woken consumer distinguish a real signal from a spurious wake
    /// without scanning the registry.
    signaled: AtomicBool,
}

impl Waiter {
    /// Create a fresh, unsignaled wait slot
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            cv: Condvar::new(),
            signaled: AtomicBool::new(false),
        })
    }

    /// Whether a producer has detached and signaled this slot
    ///
    /// Meaningful only while the caller holds the queue guard: the flag is
    /// written inside the producer's critical section, so a guarded read sees
    /// the detach and the signal as one event.
    pub(crate) fn was_signaled(&self) -> bool {
        self.signaled.load(Ordering::Relaxed)
    }
}

/// FIFO registry of wait slots, ordered by arrival
///
/// Producers detach from the front (the longest-waiting consumer), consumers
/// register at the back. All methods take `&mut self`, so the only path to the
/// registry runs through the queue's guard.
pub(crate) struct WaiterQueue {
    slots: VecDeque<Arc<Waiter>>,
}

impl WaiterQueue {
    /// Create a new empty registry
    pub(crate) fn new() -> Self {
        Self {
            slots: VecDeque::new(),
        }
    }

    /// Register a consumer's slot at the back of the registry
    ///
    /// Called by a consumer that found the item store empty, immediately before
    /// it parks on `slot.cv`. Registration and parking happen under the same
    /// hold of the guard, so a producer can never observe "store empty, no
    /// waiter" while a consumer sits between the check and the park.
    pub(crate) fn register(&mut self, slot: Arc<Waiter>) {
        self.slots.push_back(slot);
    }

    /// Detach the longest-waiting slot and mark it signaled
    ///
    /// Returns the detached slot so the caller can notify its condition
    /// variable inside the same critical section. The detach and the notify
    /// must not be separated by a guard release: another producer running in
    /// between could otherwise find the registry empty and wake no one while a
    /// consumer was eligible.
    pub(crate) fn detach_front(&mut self) -> Option<Arc<Waiter>> {
        let slot = self.slots.pop_front()?;
        slot.signaled.store(true, Ordering::Relaxed);
        Some(slot)
    }

    /// Unlink a specific slot, if still linked
    ///
    /// Used by a spuriously-woken consumer to take its stale slot back out of
    /// the registry before dropping it. Identity comparison, not equality: two
    /// distinct slots are never interchangeable.
    pub(crate) fn remove(&mut self, slot: &Arc<Waiter>) {
        if let Some(pos) = self.slots.iter().position(|s| Arc::ptr_eq(s, slot)) {
            self.slots.remove(pos);
        }
    }

    /// Number of linked slots
    #[must_use]
    #[allow(dead_code)] // Used in tests
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether any consumer is currently registered
    #[must_use]
    #[allow(dead_code)] // Used in tests
    pub(crate) fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for WaiterQueue {
    fn default() -> Self {
        Self::new()
    }
}
