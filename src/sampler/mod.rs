//! Chain sampler contract
//!
//! The estimator does not know how chains are run. It needs something that,
//! given a model, a data loader, a loss criterion and a configuration, returns
//! a fully materialized [`Trace`] covering chains `0..num_chains`. That is the
//! [`ChainSampler`] trait.
//!
//! Implementations typically dispatch one task per chain on a
//! [`ChainPool`] and let it tag draws with chain ids and assemble the trace.
//!
//! # Example
//!
//! ```rust
//! use llc_estimator::sampler::{
//!     BaselineConfig, ChainPool, ChainSampler, Draw, SamplerConfig,
//! };
//! use llc_estimator::{Result, Trace};
//!
//! /// Replays a constant loss per chain.
//! struct ConstantSampler;
//!
//! impl ChainSampler for ConstantSampler {
//!     type Model = f64;
//!     type Loader = Vec<f64>;
//!     type Criterion = ();
//!
//!     fn sample(&self, model: &f64, _: &Vec<f64>, _: &(), config: &SamplerConfig) -> Result<Trace> {
//!         ChainPool::new(config.cores)?
//!             .with_progress(config.progress)
//!             .run(config.num_chains, &config.seed, |_task| {
//!                 Ok((0..config.num_draws as u64).map(|s| Draw::new(s, *model)).collect())
//!             })
//!     }
//!
//!     fn sample_baseline(&self, model: &f64, _: &Vec<f64>, _: &(), config: &BaselineConfig) -> Result<Trace> {
//!         ChainPool::new(config.cores)?
//!             .with_progress(config.progress)
//!             .run(config.num_chains, &config.seed, |_| Ok(vec![Draw::new(0, *model)]))
//!     }
//! }
//! ```

mod config;
mod pool;

pub use config::{
    BaselineConfig, Device, Hyperparameter, SamplerConfig, Seed, SgldConfig, StepRule,
    Temperature,
};
pub use pool::{ChainPool, ChainTask, Draw};

use crate::{Result, Trace};

/// Dataset whose size drives the `n / ln(n)` normalization.
pub trait Dataset {
    /// Number of samples in the dataset.
    fn len(&self) -> usize;

    /// Check if the dataset has no samples.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Dataset for [T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }
}

impl<T> Dataset for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

/// Executes sampling chains around a model's current parameters.
///
/// Both calls must return traces whose chain ids are exactly
/// `0..config.num_chains`. Failures propagate unchanged to the estimator's
/// caller.
pub trait ChainSampler {
    /// Model whose parameters are sampled
    type Model: ?Sized;
    /// Data loader; only its dataset size is read by the estimator
    type Loader: Dataset + ?Sized;
    /// Loss criterion
    type Criterion: ?Sized;

    /// Run the measurement chains.
    ///
    /// # Errors
    ///
    /// Any sampling failure (divergence, device error, malformed loader)
    fn sample(
        &self,
        model: &Self::Model,
        loader: &Self::Loader,
        criterion: &Self::Criterion,
        config: &SamplerConfig,
    ) -> Result<Trace>;

    /// Run the baseline chains with the neutral procedure.
    ///
    /// # Errors
    ///
    /// Any sampling failure (divergence, device error, malformed loader)
    fn sample_baseline(
        &self,
        model: &Self::Model,
        loader: &Self::Loader,
        criterion: &Self::Criterion,
        config: &BaselineConfig,
    ) -> Result<Trace>;
}
