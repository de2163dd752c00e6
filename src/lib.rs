//! # llc-estimator: Local Learning Coefficient Estimation
//!
//! Estimates the local learning coefficient (LLC) of a trained model near its
//! current parameters. Several independent sampling chains are run around the
//! parameters, each chain's average loss is compared with a baseline trace,
//! and the differences are normalized by `n / ln(n)` for a dataset of `n`
//! samples.
//!
//! ## Design Principles
//!
//! - **Columnar traces**: `(chain, step, loss)` records live in an Arrow
//!   `RecordBatch` and persist to Parquet
//! - **Explicit joins**: measurement and baseline chains are paired by chain
//!   id, and any mismatch fails loudly
//! - **Immutable configuration**: every call derives fresh sampler configs
//! - **Pluggable sampling**: the MCMC step rule lives behind [`ChainSampler`]
//!
//! ## Example Usage
//!
//! ```rust
//! use llc_estimator::{learning_coeff_from_traces, summary_from_traces, Trace, TraceRecord};
//!
//! let trace = Trace::from_records(vec![
//!     TraceRecord::new(0, 0, 2.0),
//!     TraceRecord::new(1, 0, 2.2),
//!     TraceRecord::new(2, 0, 1.8),
//! ])?;
//! let baseline = Trace::from_records((0..3).map(|c| TraceRecord::new(c, 0, 1.0)))?;
//!
//! let llc = learning_coeff_from_traces(&trace, &baseline, 100, 3)?;
//! assert!((llc - 21.71).abs() < 0.01);
//!
//! let summary = summary_from_traces(trace, &baseline, 100, 3)?;
//! assert_eq!(summary.num_chains(), 3);
//! assert!((summary.get("chain_1").unwrap() - 26.06).abs() < 0.01);
//! # Ok::<(), llc_estimator::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod estimator;
pub mod sampler;
pub mod stats;
pub mod summary;
pub mod trace;
pub mod viz;

pub use config::EstimatorConfig;
pub use error::{Error, Result};
pub use estimator::{
    estimate_learning_coeff, estimate_learning_coeff_with_summary, learning_coeff_from_traces,
    normalization_factor, summary_from_traces, LearningCoeffSummary,
};
pub use sampler::{BaselineConfig, ChainSampler, Dataset, SamplerConfig};
pub use summary::ChainSummary;
pub use trace::{Trace, TraceRecord};
