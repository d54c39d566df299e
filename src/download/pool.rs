//! Bounded worker pool with a fan-in barrier.
//!
//! Each unit of work runs in its own Tokio task. A semaphore permit is
//! acquired before a task is spawned, so at most `concurrency` units are in
//! flight; [`WorkerPool::run`] returns only after every spawned task settled.
//!
//! # Example
//!
//! ```
//! use harvester_core::download::WorkerPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = WorkerPool::new(4)?;
//! let doubled = pool.run(vec![1, 2, 3], |n| async move { n * 2 }).await?;
//! assert_eq!(doubled, vec![2, 4, 6]);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Error type for worker pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Live counters for the batch a pool is currently running.
///
/// Updated from worker tasks with atomics so a progress display can poll it
/// without coordinating with the pool.
#[derive(Debug, Default)]
pub struct PoolProgress {
    total: AtomicUsize,
    settled: AtomicUsize,
}

impl PoolProgress {
    /// Number of units in the current batch.
    #[must_use]
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    /// Number of units that finished, successfully or not.
    #[must_use]
    pub fn settled(&self) -> usize {
        self.settled.load(Ordering::SeqCst)
    }

    fn begin(&self, total: usize) {
        self.settled.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn record_settled(&self) {
        self.settled.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fixed-size pool of concurrent tasks.
#[derive(Debug)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    progress: Arc<PoolProgress>,
}

impl WorkerPool {
    /// Creates a pool that runs at most `concurrency` units at once.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    pub fn new(concurrency: usize) -> Result<Self, PoolError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(PoolError::InvalidConcurrency { value: concurrency });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            progress: Arc::new(PoolProgress::default()),
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns a handle to the pool's progress counters.
    #[must_use]
    pub fn progress(&self) -> Arc<PoolProgress> {
        Arc::clone(&self.progress)
    }

    /// Runs `work` for every item and waits for all of them.
    ///
    /// Outcomes are returned in input order. A task that panics is logged and
    /// contributes no outcome; it never fails the batch.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(level = "debug", skip_all, fields(concurrency = self.concurrency, items = items.len()))]
    pub async fn run<I, T, F, Fut>(&self, items: Vec<I>, work: F) -> Result<Vec<T>, PoolError>
    where
        F: Fn(I) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.progress.begin(items.len());
        let mut handles = Vec::with_capacity(items.len());

        for item in items {
            // Blocks while the pool is saturated
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| PoolError::SemaphoreClosed)?;

            let task = work(item);
            let progress = Arc::clone(&self.progress);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let outcome = task.await;
                progress.record_settled();
                outcome
            }));
        }

        debug!(task_count = handles.len(), "waiting for pool tasks to settle");

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    warn!(error = %e, "pool task panicked");
                    self.progress.record_settled();
                }
            }
        }

        Ok(outcomes)
    }
}
