//! Cross-thread deferred-action queue
//!
//! All OS window calls must happen on the thread that created the window.
//! Other threads hand work to that thread by posting closures through a
//! [`DispatchHandle`]; the window thread drains the queue between frames
//! under a time budget (see `RenderWindow::run`).
//!
//! There is no cancellation: a posted job either runs on a later drain or is
//! dropped unexecuted when the queue itself is dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// The consumer end, owned by the window thread
pub struct DispatchQueue {
    inner: Arc<Mutex<VecDeque<Job>>>,
}

/// The producer end; cheap to clone and send to other threads
#[derive(Clone)]
pub struct DispatchHandle {
    inner: Arc<Mutex<VecDeque<Job>>>,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Create a handle other threads can post through
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            inner: self.inner.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Run queued jobs in FIFO order until the queue is empty or `budget`
    /// has elapsed. At least one job runs per drain of a non-empty queue,
    /// so a slow job cannot starve the queue forever. Returns the number of
    /// jobs executed.
    ///
    /// Jobs run outside the lock; posting from within a job is fine.
    pub fn drain(&self, budget: Duration) -> usize {
        let start = Instant::now();
        let mut ran = 0;

        loop {
            let job = self.inner.lock().pop_front();
            let Some(job) = job else {
                break;
            };

            job();
            ran += 1;

            if start.elapsed() >= budget {
                break;
            }
        }

        ran
    }
}

impl Default for DispatchQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchHandle {
    /// Queue a closure to run on the window thread
    pub fn post<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.lock().push_back(Box::new(job));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_drain_runs_jobs_in_order() {
        let queue = DispatchQueue::new();
        let handle = queue.handle();

        let log = Arc::new(Mutex::new(Vec::new()));
        for i in 0..4 {
            let log = log.clone();
            handle.post(move || log.lock().push(i));
        }

        let ran = queue.drain(Duration::from_secs(1));
        assert_eq!(ran, 4);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_posts_cross_threads() {
        let queue = DispatchQueue::new();
        let handle = queue.handle();

        let join = std::thread::spawn(move || {
            for _ in 0..8 {
                handle.post(|| {});
            }
        });
        join.join().unwrap();

        assert_eq!(queue.len(), 8);
        assert_eq!(queue.drain(Duration::from_secs(1)), 8);
    }

    #[test]
    fn test_budget_bounds_a_drain() {
        let queue = DispatchQueue::new();
        let handle = queue.handle();

        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let counter = counter.clone();
            handle.post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(5));
            });
        }

        // Zero budget still makes progress, but cannot run everything.
        let ran = queue.drain(Duration::ZERO);
        assert_eq!(ran, 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn test_job_may_post_more_work() {
        let queue = DispatchQueue::new();
        let handle = queue.handle();

        let inner_handle = handle.clone();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        handle.post(move || {
            let c2 = c.clone();
            inner_handle.post(move || {
                c2.fetch_add(1, Ordering::SeqCst);
            });
        });

        queue.drain(Duration::from_secs(1));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
