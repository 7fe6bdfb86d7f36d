//! Parallel processing configuration
//!
//! Reductions over time and depth run on Rayon's global pool. The pool is
//! configured once per process, usually from the `--threads` CLI flag.

use crate::errors::{FesomError, Result};
use rayon::ThreadPoolBuilder;
use tracing::info;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Create a configuration that uses a specific number of threads
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
        }
    }

    /// Set up the global Rayon thread pool with the specified configuration
    ///
    /// # Errors
    ///
    /// Fails when the thread count is zero or the global pool was already built.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(FesomError::ThreadPoolError(
                "thread count must be at least 1".to_string(),
            )),
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        FesomError::ThreadPoolError(format!(
                            "Failed to initialize thread pool with {num_threads} threads: {e}"
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

    /// Get the current number of threads being used
    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
}

/// Get information about the current parallel configuration
pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        assert!(ParallelConfig::default().num_threads.is_none());
        assert_eq!(ParallelConfig::with_threads(3).num_threads, Some(3));
        assert!(ParallelConfig::all_cores().num_threads.unwrap() > 0);
    }

    #[test]
    fn zero_threads_rejected() {
        let err = ParallelConfig::with_threads(0).setup_global_pool();
        assert!(matches!(err, Err(FesomError::ThreadPoolError(_))));
    }

    #[test]
    fn info_reports_threads() {
        let info = get_parallel_info();
        assert!(info.current_threads > 0);
        assert!(info.available_cores > 0);
    }
}
