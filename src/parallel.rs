//! Rayon thread pool setup
//!
//! Weight computation, clipping and per-time-step reductions all run on the
//! global Rayon pool. The pool can be configured once per process.

use crate::errors::{BasinGridError, Result};
use rayon::ThreadPoolBuilder;
use tracing::info;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    /// `None` keeps Rayon's default (one thread per logical core)
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Use every available CPU core
    pub fn all_cores() -> Self {
        Self::with_threads(num_cpus::get())
    }

    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Build the global Rayon pool
    ///
    /// # Errors
    ///
    /// [`BasinGridError::ThreadPoolError`] for a zero thread count or when
    /// the global pool was already initialized.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(BasinGridError::ThreadPoolError(
                "thread count must be at least 1".to_string(),
            )),
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        BasinGridError::ThreadPoolError(format!(
                            "failed to initialize thread pool with {num_threads} threads: {e}"
                        ))
                    })?;
                info!(threads = num_threads, "configured parallel processing");
                Ok(())
            }
            None => {
                info!(
                    threads = rayon::current_num_threads(),
                    "using default thread pool"
                );
                Ok(())
            }
        }
    }

    /// Threads in the pool currently in use
    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

/// Parallel processing environment of this process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
    pub available_parallelism: usize,
}

impl ParallelInfo {
    pub fn detect() -> Self {
        Self {
            current_threads: rayon::current_num_threads(),
            available_cores: num_cpus::get(),
            available_parallelism: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
        }
    }

    pub fn log(&self) {
        info!(
            current_threads = self.current_threads,
            available_cores = self.available_cores,
            available_parallelism = self.available_parallelism,
            "parallel processing environment"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_is_rejected() {
        let err = ParallelConfig::with_threads(0).setup_global_pool();
        assert!(matches!(err, Err(BasinGridError::ThreadPoolError(_))));
    }

    #[test]
    fn info_reports_at_least_one_thread() {
        let info = ParallelInfo::detect();
        assert!(info.current_threads >= 1);
        assert!(info.available_cores >= 1);
    }
}
