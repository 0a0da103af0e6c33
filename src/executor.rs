//! Chunked parallel execution over a linear item range.
//!
//! The range `[0, N)` is split into contiguous, non-overlapping chunks, one
//! per worker. Each chunk's callback gets the chunk's starting index and a
//! mutable slice of exactly that chunk, so workers can only write their own
//! part of the output. All workers are joined before [`ParallelExecutor::run`]
//! returns.

use std::num::NonZeroUsize;
use std::ops::Range;

use crate::error::{Error, Result};

/// Worker configuration for a [`ParallelExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Number of worker threads (at least 1).
    pub workers: usize,
}

impl ExecutorConfig {
    pub fn with_workers(workers: usize) -> Self {
        ExecutorConfig { workers }
    }
}

impl Default for ExecutorConfig {
    /// One worker per available hardware thread.
    fn default() -> Self {
        let workers = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        ExecutorConfig { workers }
    }
}

/// Runs a per-chunk function over disjoint slices of an output buffer.
#[derive(Debug)]
pub struct ParallelExecutor {
    workers: usize,
    pool: Option<rayon::ThreadPool>,
}

impl ParallelExecutor {
    pub fn new(config: ExecutorConfig) -> Result<Self> {
        if config.workers == 0 {
            return Err(Error::parameter("worker count must be at least 1"));
        }
        let pool = if config.workers > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(config.workers)
                    .thread_name(|i| format!("bitmap-filter-{i}"))
                    .build()?,
            )
        } else {
            None
        };
        Ok(ParallelExecutor {
            workers: config.workers,
            pool,
        })
    }

    pub fn with_workers(workers: usize) -> Result<Self> {
        Self::new(ExecutorConfig::with_workers(workers))
    }

    /// A single-worker executor that runs every chunk on the calling thread.
    pub fn sequential() -> Self {
        ParallelExecutor {
            workers: 1,
            pool: None,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Partition `[0, total)` into contiguous chunks.
    ///
    /// Uses `workers` chunks of `total / workers` items; the last chunk also
    /// takes the remainder. One worker, or more workers than items, gives a
    /// single chunk.
    pub fn plan(&self, total: usize) -> Vec<Range<usize>> {
        if total == 0 {
            return Vec::new();
        }
        let threads = self.workers;
        if threads <= 1 || threads > total {
            return vec![0..total];
        }

        let length = total / threads;
        (0..threads)
            .map(|i| {
                let start = i * length;
                let end = if i + 1 == threads { total } else { start + length };
                start..end
            })
            .collect()
    }

    /// Run `f(start, chunk)` for every chunk of `data` and wait for all of them.
    pub fn run<T, F>(&self, data: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        let plan = self.plan(data.len());
        log::trace!("running {} chunk(s) over {} items", plan.len(), data.len());

        let mut chunks = Vec::with_capacity(plan.len());
        let mut rest = data;
        for range in &plan {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(range.len());
            chunks.push((range.start, head));
            rest = tail;
        }

        match &self.pool {
            Some(pool) if chunks.len() > 1 => {
                let f = &f;
                pool.scope(|scope| {
                    for (start, chunk) in chunks {
                        scope.spawn(move |_| f(start, chunk));
                    }
                });
            }
            _ => {
                for (start, chunk) in chunks {
                    f(start, chunk);
                }
            }
        }
    }
}

impl Default for ParallelExecutor {
    /// Sized to the available hardware threads; falls back to sequential
    /// execution if the pool cannot be built.
    fn default() -> Self {
        Self::new(ExecutorConfig::default()).unwrap_or_else(|err| {
            log::warn!("{err}; running filters sequentially");
            Self::sequential()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_covers_remainder_in_last_chunk() {
        let exec = ParallelExecutor::with_workers(4).unwrap();
        let plan = exec.plan(10);
        assert_eq!(plan, vec![0..2, 2..4, 4..6, 6..10]);
    }

    #[test]
    fn test_plan_even_split() {
        let exec = ParallelExecutor::with_workers(3).unwrap();
        assert_eq!(exec.plan(9), vec![0..3, 3..6, 6..9]);
    }

    #[test]
    fn test_plan_more_workers_than_items() {
        let exec = ParallelExecutor::with_workers(8).unwrap();
        assert_eq!(exec.plan(5), vec![0..5]);
    }

    #[test]
    fn test_plan_single_worker() {
        assert_eq!(ParallelExecutor::sequential().plan(7), vec![0..7]);
        assert!(ParallelExecutor::sequential().plan(0).is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            ParallelExecutor::with_workers(0),
            Err(Error::Parameter(_))
        ));
    }

    #[test]
    fn test_run_visits_every_item_once() {
        let exec = ParallelExecutor::with_workers(3).unwrap();
        let mut data = vec![0usize; 101];
        exec.run(&mut data, |start, chunk| {
            for (offset, v) in chunk.iter_mut().enumerate() {
                *v += start + offset + 1;
            }
        });
        for (i, v) in data.iter().enumerate() {
            assert_eq!(*v, i + 1);
        }
    }

    #[test]
    fn test_run_on_empty_slice() {
        let exec = ParallelExecutor::with_workers(2).unwrap();
        let mut data: Vec<u8> = Vec::new();
        exec.run(&mut data, |_, _| panic!("no chunks expected"));
    }
}
