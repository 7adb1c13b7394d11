//! Stress tests for FairQueue under producer/consumer contention
//!
//! These verify that no item is lost or delivered twice under load, and that
//! the counters line up once every thread has finished.

use fair_queue::FairQueue;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Timeout for stress tests to prevent hanging
const STRESS_TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Run `body` on a watchdog thread, failing the test if it does not finish
fn with_timeout<F>(body: F)
where
    F: FnOnce() + Send + 'static,
{
    let (done_tx, done_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        body();
        let _ = done_tx.send(());
    });

    match done_rx.recv_timeout(STRESS_TEST_TIMEOUT) {
        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => handle.join().unwrap(),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("stress test timed out after {STRESS_TEST_TIMEOUT:?}")
        }
    }
}

#[test]
fn test_no_loss_no_duplication_mpmc() {
    with_timeout(|| {
        const PRODUCERS: usize = 4;
        const CONSUMERS: usize = 4;
        const PER_PRODUCER: usize = 1000;
        const TOTAL: usize = PRODUCERS * PER_PRODUCER;

        let queue = Arc::new(FairQueue::new());
        let received = Arc::new(Mutex::new(Vec::with_capacity(TOTAL)));

        let mut threads = Vec::new();

        // Each producer enqueues a disjoint range
        for p in 0..PRODUCERS {
            let queue = Arc::clone(&queue);
            threads.push(thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.enqueue(p * PER_PRODUCER + i);
                }
            }));
        }

        // Each consumer blocks for its share of the total
        for _ in 0..CONSUMERS {
            let queue = Arc::clone(&queue);
            let received = Arc::clone(&received);
            threads.push(thread::spawn(move || {
                let mut taken = Vec::with_capacity(TOTAL / CONSUMERS);
                for _ in 0..TOTAL / CONSUMERS {
                    taken.push(queue.dequeue());
                }
                received.lock().unwrap().extend(taken);
            }));
        }

        for t in threads {
            t.join().unwrap();
        }

        let received = received.lock().unwrap();
        assert_eq!(received.len(), TOTAL);

        let unique: HashSet<_> = received.iter().copied().collect();
        assert_eq!(unique.len(), TOTAL, "an item was delivered twice");
        assert_eq!(unique, (0..TOTAL).collect::<HashSet<_>>(), "an item was lost");

        assert_eq!(queue.len(), 0);
        assert_eq!(queue.waiting(), 0);
        assert_eq!(queue.visited(), TOTAL);
    });
}

#[test]
fn test_single_producer_many_parked_consumers() {
    with_timeout(|| {
        const CONSUMERS: usize = 16;
        const PER_CONSUMER: usize = 200;

        let queue = Arc::new(FairQueue::new());
        let delivered = Arc::new(AtomicUsize::new(0));

        let consumers: Vec<_> = (0..CONSUMERS)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let delivered = Arc::clone(&delivered);
                thread::spawn(move || {
                    for _ in 0..PER_CONSUMER {
                        let _ = queue.dequeue();
                        delivered.fetch_add(1, Ordering::Relaxed);
                    }
                })
            })
            .collect();

        for i in 0..CONSUMERS * PER_CONSUMER {
            queue.enqueue(i);
        }

        for c in consumers {
            c.join().unwrap();
        }

        assert_eq!(delivered.load(Ordering::Relaxed), CONSUMERS * PER_CONSUMER);
        assert_eq!(queue.visited(), CONSUMERS * PER_CONSUMER);
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.waiting(), 0);
    });
}

#[test]
fn test_mixed_blocking_and_polling_consumers() {
    with_timeout(|| {
        const PRODUCERS: usize = 2;
        const PER_PRODUCER: usize = 2000;
        const TOTAL: usize = PRODUCERS * PER_PRODUCER;

        let queue = Arc::new(FairQueue::new());
        let taken = Arc::new(AtomicUsize::new(0));

        let mut threads = Vec::new();

        for p in 0..PRODUCERS {
            let queue = Arc::clone(&queue);
            threads.push(thread::spawn(move || {
                for i in 0..PER_PRODUCER {
                    queue.enqueue(p * PER_PRODUCER + i);
                }
            }));
        }

        // Pollers drain opportunistically and stop once the total is reached
        for _ in 0..2 {
            let queue = Arc::clone(&queue);
            let taken = Arc::clone(&taken);
            threads.push(thread::spawn(move || {
                while taken.load(Ordering::Relaxed) < TOTAL {
                    if queue.try_dequeue().is_some() {
                        taken.fetch_add(1, Ordering::Relaxed);
                    } else {
                        thread::yield_now();
                    }
                }
            }));
        }

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(taken.load(Ordering::Relaxed), TOTAL);
        assert_eq!(queue.visited(), TOTAL);
        assert_eq!(queue.len(), 0);
    });
}

#[test]
fn test_rapid_enqueue_dequeue_cycles() {
    with_timeout(|| {
        const THREADS: usize = 8;
        const CYCLES: usize = 1000;

        let queue = Arc::new(FairQueue::new());

        // Every thread alternates producing and consuming, so the total
        // enqueued always equals the total dequeued once all threads join.
        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    for i in 0..CYCLES {
                        queue.enqueue(t * CYCLES + i);
                        let _ = queue.dequeue();
                    }
                })
            })
            .collect();

        for w in workers {
            w.join().unwrap();
        }

        assert_eq!(queue.len(), 0);
        assert_eq!(queue.waiting(), 0);
        assert_eq!(queue.visited(), THREADS * CYCLES);
    });
}

#[test]
fn test_counters_settle_after_burst() {
    with_timeout(|| {
        const TOTAL: usize = 5000;

        let queue = Arc::new(FairQueue::new());

        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut sum = 0_usize;
                for _ in 0..TOTAL {
                    sum += queue.dequeue();
                }
                sum
            })
        };

        for i in 0..TOTAL {
            queue.enqueue(i);
        }

        let sum = consumer.join().unwrap();
        assert_eq!(sum, TOTAL * (TOTAL - 1) / 2);
        assert_eq!(queue.visited(), TOTAL);
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.waiting(), 0);
    });
}
