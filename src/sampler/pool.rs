//! Chain task dispatch
//!
//! Submits `num_chains` independent chain tasks to a worker pool sized by the
//! `cores` setting and collects every result before returning. There is no
//! streaming and no early cancellation: the caller gets one fully
//! materialized trace, or the failure of the lowest-numbered failing chain.

use super::Seed;
use crate::trace::{Trace, TraceRecord};
use crate::{Error, Result};

/// One recorded draw, before the pool tags it with its chain id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    /// Step index within the chain
    pub step: u64,
    /// Loss at the draw
    pub loss: f64,
}

impl Draw {
    /// Create a new draw.
    #[must_use]
    pub const fn new(step: u64, loss: f64) -> Self {
        Self { step, loss }
    }
}

/// Work item handed to a chain task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainTask {
    chain: u32,
    seed: Option<u64>,
}

impl ChainTask {
    /// Chain id in `[0, num_chains)`.
    #[must_use]
    pub const fn chain(&self) -> u32 {
        self.chain
    }

    /// Seed for this chain, if the run is seeded.
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }
}

/// Worker pool for chain tasks.
pub struct ChainPool {
    cores: usize,
    progress: bool,
    #[cfg(feature = "rayon")]
    pool: rayon::ThreadPool,
}

impl ChainPool {
    /// Create a pool with `cores` worker threads.
    ///
    /// # Errors
    ///
    /// Returns error if `cores` is zero or the thread pool cannot be built
    pub fn new(cores: usize) -> Result<Self> {
        if cores == 0 {
            return Err(Error::InvalidConfig("cores must be at least 1".to_string()));
        }

        #[cfg(feature = "rayon")]
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cores)
            .thread_name(|i| format!("llc-chain-{i}"))
            .build()
            .map_err(|e| Error::Sampler(format!("Failed to build chain pool: {e}")))?;

        Ok(Self {
            cores,
            progress: false,
            #[cfg(feature = "rayon")]
            pool,
        })
    }

    /// Log each finished chain at info level instead of debug.
    #[must_use]
    pub const fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub const fn cores(&self) -> usize {
        self.cores
    }

    /// Whether finished chains are reported at info level.
    #[must_use]
    pub const fn progress(&self) -> bool {
        self.progress
    }

    /// Run one task per chain and assemble the trace.
    ///
    /// Records are ordered by chain id, then by the order the task returned
    /// its draws, regardless of which worker finished first.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] if `num_chains` is zero or the seed scheme
    ///   does not fit `num_chains`
    /// - [`Error::ChainFailed`] wrapping the failure of the lowest-numbered
    ///   failing chain
    pub fn run<F>(&self, num_chains: usize, seed: &Seed, task: F) -> Result<Trace>
    where
        F: Fn(ChainTask) -> Result<Vec<Draw>> + Sync,
    {
        if num_chains == 0 {
            return Err(Error::InvalidConfig(
                "num_chains must be at least 1".to_string(),
            ));
        }
        if self.cores > num_chains {
            tracing::warn!(
                cores = self.cores,
                num_chains,
                "more cores than chains; extra workers stay idle"
            );
        }

        let tasks = seed
            .chain_seeds(num_chains)?
            .into_iter()
            .enumerate()
            .map(|(chain, seed)| {
                u32::try_from(chain)
                    .map(|chain| ChainTask { chain, seed })
                    .map_err(|_| {
                        Error::InvalidConfig(format!("num_chains {num_chains} exceeds u32 range"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let run_one = |task_spec: ChainTask| {
            let draws = task(task_spec);
            if let Ok(ref draws) = draws {
                if self.progress {
                    tracing::info!(chain = task_spec.chain, draws = draws.len(), "chain finished");
                } else {
                    tracing::debug!(chain = task_spec.chain, draws = draws.len(), "chain finished");
                }
            }
            (task_spec.chain, draws)
        };

        #[cfg(feature = "rayon")]
        let results: Vec<(u32, Result<Vec<Draw>>)> = {
            use rayon::prelude::*;
            self.pool
                .install(|| tasks.into_par_iter().map(run_one).collect())
        };

        #[cfg(not(feature = "rayon"))]
        let results: Vec<(u32, Result<Vec<Draw>>)> = tasks.into_iter().map(run_one).collect();

        let mut records = Vec::new();
        for (chain, draws) in results {
            let draws = draws.map_err(|source| Error::ChainFailed {
                chain,
                source: Box::new(source),
            })?;
            records.extend(
                draws
                    .into_iter()
                    .map(|draw| TraceRecord::new(chain, draw.step, draw.loss)),
            );
        }

        Trace::from_records(records)
    }
}

impl std::fmt::Debug for ChainPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainPool")
            .field("cores", &self.cores)
            .field("progress", &self.progress)
            .finish()
    }
}
