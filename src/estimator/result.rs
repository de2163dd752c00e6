//! Per-chain estimation result

use crate::trace::Trace;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Per-chain learning coefficients with their mean and spread.
///
/// Exposes the scalar entries under stable keys (`mean`, `std`,
/// `chain_0`..`chain_{k-1}`) and keeps the raw measurement trace for
/// diagnostics such as [`crate::viz::plot_learning_coeff_trace`].
///
/// `std` is the sample (Bessel-corrected) standard deviation across chains;
/// a single chain reports `0.0`.
///
/// Serializing produces a JSON object of the scalar entries only; persist the
/// trace with [`Trace::write_parquet`].
#[derive(Debug, Clone, PartialEq)]
pub struct LearningCoeffSummary {
    mean: f64,
    std: f64,
    chains: Vec<f64>,
    trace: Trace,
}

impl LearningCoeffSummary {
    pub(crate) const fn new(mean: f64, std: f64, chains: Vec<f64>, trace: Trace) -> Self {
        Self {
            mean,
            std,
            chains,
            trace,
        }
    }

    /// Mean coefficient across chains.
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation across chains.
    #[must_use]
    pub const fn std(&self) -> f64 {
        self.std
    }

    /// Coefficient of every chain, ordered by chain id.
    #[must_use]
    pub fn chains(&self) -> &[f64] {
        &self.chains
    }

    /// Coefficient of chain `i`.
    #[must_use]
    pub fn chain(&self, i: usize) -> Option<f64> {
        self.chains.get(i).copied()
    }

    /// Number of chains.
    #[must_use]
    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    /// Raw measurement trace.
    #[must_use]
    pub const fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Consume the summary, keeping only the trace.
    #[must_use]
    pub fn into_trace(self) -> Trace {
        self.trace
    }

    /// Look up a scalar entry by key (`"mean"`, `"std"` or `"chain_<i>"`).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "mean" => Some(self.mean),
            "std" => Some(self.std),
            _ => key
                .strip_prefix("chain_")
                .and_then(|i| i.parse::<usize>().ok())
                .and_then(|i| self.chain(i)),
        }
    }

    /// Scalar entries in stable order: `mean`, `std`, `chain_0`, `chain_1`, ...
    #[must_use]
    pub fn entries(&self) -> Vec<(String, f64)> {
        let mut entries = Vec::with_capacity(self.chains.len() + 2);
        entries.push(("mean".to_string(), self.mean));
        entries.push(("std".to_string(), self.std));
        entries.extend(
            self.chains
                .iter()
                .enumerate()
                .map(|(i, &llc)| (format!("chain_{i}"), llc)),
        );
        entries
    }
}

impl Serialize for LearningCoeffSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.entries();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in &entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
