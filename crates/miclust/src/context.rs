//! Per-run worker pools.
//!
//! Every parallel phase in this crate runs inside a [`RunContext`], which owns
//! a dedicated thread pool for the lifetime of one clustering or evaluation
//! call. Dropping the context tears the pool down, so repeated experiment
//! iterations never leak threads or share executor state.

use crate::{Error, Result};

/// A worker pool owned by a single clustering or evaluation run.
#[must_use]
pub struct RunContext {
    /// The pool the run's parallel phases execute in.
    pool: rayon::ThreadPool,
}

impl RunContext {
    /// Creates a context with the given number of workers.
    ///
    /// `n_workers == 0` means one worker per available core.
    ///
    /// # Errors
    ///
    /// [`Error::WorkerPool`] if the pool cannot be created. This is fatal for
    /// the current run only; distance matrices built by prior runs are
    /// unaffected.
    pub fn new(n_workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(n_workers)
            .build()
            .map_err(|e| Error::WorkerPool(e.to_string()))?;
        ftlog::info!("Created run context with {} workers", pool.current_num_threads());
        Ok(Self { pool })
    }

    /// The number of workers in the pool.
    #[must_use]
    pub fn n_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Executes `op` inside the run's pool.
    ///
    /// Rayon parallel iterators inside `op` are scheduled on this pool rather
    /// than the global one.
    pub fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_work_in_its_own_pool() {
        let ctx = RunContext::new(2).unwrap();
        assert_eq!(ctx.n_workers(), 2);
        let sum = ctx.install(|| {
            use rayon::prelude::*;
            (0..100_u64).into_par_iter().sum::<u64>()
        });
        assert_eq!(sum, 4950);
    }
}
