//! Blocking synchronization queue with strict FIFO fairness
//!
//! This crate provides [`FairQueue`], an unbounded thread-safe FIFO queue for
//! producer/consumer coordination. Two ordering guarantees hold at once:
//!
//! - **Item FIFO**: items are delivered across all consumers in the exact
//!   order they were enqueued.
//! - **Waiter FIFO**: when several consumers are parked waiting, each arriving
//!   item wakes the consumer that has been waiting longest: never a broadcast,
//!   never an arbitrary pick.
//!
//! The second guarantee is what ordinary `Mutex` + shared-`Condvar` queues do
//! not give: `notify_one` on a shared condvar wakes an implementation-chosen
//! waiter, and `notify_all` wakes the whole herd to race for one item. Here
//! every parked consumer has its own condition variable, linked into a registry
//! in arrival order, and a producer signals exactly the front entry.
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
//! let workers: Vec<_> = (0..2)
//!     .map(|_| {
//!         let queue = Arc::clone(&queue);
//!         thread::spawn(move || queue.dequeue())
//!     })
//!     .collect();
//!
//! queue.enqueue("first");
//! queue.enqueue("second");
//!
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! assert_eq!(queue.visited(), 2);
//! ```

mod queue;
mod waiter_queue;

pub use queue::FairQueue;
