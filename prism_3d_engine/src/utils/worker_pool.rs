//! Bounded worker pool for batch CPU work
//!
//! Wraps a dedicated `rayon::ThreadPool`. Every entry point blocks the
//! calling thread until all partitions finished, so from the caller's side
//! a parallel map is just a slower-to-start, faster-to-finish loop.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::error::{Error, Result};

/// Fixed-size pool of worker threads
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Build a pool with `thread_count` workers (`0` = one per logical core)
    ///
    /// # Errors
    ///
    /// Returns `InitializationFailed` if the threads cannot be spawned.
    pub fn new(thread_count: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|index| format!("prism3d-worker-{}", index))
            .build()
            .map_err(|e| {
                Error::InitializationFailed(format!("Failed to build worker pool: {}", e))
            })?;
        Ok(Self { pool })
    }

    /// Number of worker threads
    pub fn thread_count(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Map every item in parallel, keeping input order in the output
    pub fn par_map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Send + Sync,
    {
        self.pool.install(|| items.par_iter().map(|item| f(item)).collect())
    }

    /// Process `items` in chunks of `chunk_size` and concatenate the results
    ///
    /// A `chunk_size` of 0 is treated as 1.
    pub fn par_chunks_map<T, R, F>(&self, items: &[T], chunk_size: usize, f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&[T]) -> Vec<R> + Send + Sync,
    {
        let chunk_size = chunk_size.max(1);
        self.pool.install(|| {
            items
                .par_chunks(chunk_size)
                .map(|chunk| f(chunk))
                .collect::<Vec<Vec<R>>>()
                .into_iter()
                .flatten()
                .collect()
        })
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("thread_count", &self.thread_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "worker_pool_tests.rs"]
mod tests;
