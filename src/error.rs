//! Error types for llc-estimator
//!
//! Every error is reported synchronously at the call site. Nothing here is
//! retried or recovered; that policy belongs to the caller.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// llc-estimator error types
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid sampler or estimator configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset too small for the `n / ln(n)` normalization
    #[error("Degenerate dataset size n = {n}: normalization n / ln(n) requires n > 1")]
    DegenerateDatasetSize {
        /// Dataset size reported by the loader
        n: usize,
    },

    /// Trace chains do not match the expected chain index space
    #[error("Chain mismatch: expected chains 0..{expected}, missing {missing:?}, unexpected {unexpected:?}")]
    ChainMismatch {
        /// Number of chains the caller asked for
        expected: usize,
        /// Chain ids that should be present but are not
        missing: Vec<u32>,
        /// Chain ids that are present but should not be
        unexpected: Vec<u32>,
    },

    /// Trace has no records
    #[error("Trace is empty: sampler produced no draws")]
    EmptyTrace,

    /// Numerical divergence inside a chain
    #[error("Non-finite loss at chain {chain}, step {step}: sampler diverged")]
    NonFiniteLoss {
        /// Chain that diverged
        chain: u32,
        /// Step of the offending draw
        step: u64,
    },

    /// A chain task failed inside the chain pool
    #[error("Chain {chain} failed: {source}")]
    ChainFailed {
        /// Chain that failed first
        chain: u32,
        /// Underlying failure
        source: Box<Error>,
    },

    /// Upstream sampler failure
    #[error("Sampler error: {0}")]
    Sampler(String),

    /// Storage error (Parquet/Arrow)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
