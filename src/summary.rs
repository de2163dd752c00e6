//! Per-chain loss summaries
//!
//! `GROUP BY chain` + `AVG(loss)` over a trace, and an explicit join of two
//! summaries on chain id. Measurement and baseline traces are produced by
//! independent sampler calls, so chains are paired by identifier, never by
//! position.

use crate::stats;
use crate::trace::Trace;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Mean loss of each chain, keyed by chain id.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSummary {
    means: BTreeMap<u32, f64>,
}

impl ChainSummary {
    /// Reduce a trace to per-chain mean losses.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyTrace`] if the trace has no records
    /// - [`Error::NonFiniteLoss`] if any loss is NaN or infinite
    #[allow(clippy::cast_precision_loss)]
    pub fn from_trace(trace: &Trace) -> Result<Self> {
        if trace.is_empty() {
            return Err(Error::EmptyTrace);
        }
        trace.check_finite()?;

        let mut acc: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
        for record in trace.records() {
            let entry = acc.entry(record.chain()).or_insert((0.0, 0));
            entry.0 += record.loss();
            entry.1 += 1;
        }

        let means = acc
            .into_iter()
            .map(|(chain, (sum, count))| (chain, sum / count as f64))
            .collect();

        Ok(Self { means })
    }

    /// Build a summary directly from chain means.
    #[must_use]
    pub fn from_means<I>(means: I) -> Self
    where
        I: IntoIterator<Item = (u32, f64)>,
    {
        Self {
            means: means.into_iter().collect(),
        }
    }

    /// Mean loss of one chain.
    #[must_use]
    pub fn get(&self, chain: u32) -> Option<f64> {
        self.means.get(&chain).copied()
    }

    /// Number of chains summarized.
    #[must_use]
    pub fn len(&self) -> usize {
        self.means.len()
    }

    /// Check if no chain is summarized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Chain ids, ascending.
    #[must_use]
    pub fn chain_ids(&self) -> Vec<u32> {
        self.means.keys().copied().collect()
    }

    /// Chain means ordered by chain id.
    #[must_use]
    pub fn means(&self) -> Vec<f64> {
        self.means.values().copied().collect()
    }

    /// Average of per-chain means; every chain weighs the same regardless of
    /// how many draws it recorded.
    #[must_use]
    pub fn grand_mean(&self) -> Option<f64> {
        stats::mean(&self.means())
    }

    /// Require the chain id set to be exactly `0..num_chains`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChainMismatch`] listing missing and unexpected ids
    pub fn expect_chains(&self, num_chains: usize) -> Result<()> {
        let expected: BTreeSet<u32> = (0..num_chains)
            .map(|c| {
                u32::try_from(c).map_err(|_| {
                    Error::InvalidConfig(format!("num_chains {num_chains} exceeds u32 range"))
                })
            })
            .collect::<Result<_>>()?;
        let actual: BTreeSet<u32> = self.means.keys().copied().collect();

        if expected == actual {
            return Ok(());
        }

        Err(Error::ChainMismatch {
            expected: num_chains,
            missing: expected.difference(&actual).copied().collect(),
            unexpected: actual.difference(&expected).copied().collect(),
        })
    }

    /// Pair this summary with `other` by chain id.
    ///
    /// Returns `(chain, self_mean, other_mean)` ordered by chain id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChainMismatch`] if the two id sets differ
    pub fn join(&self, other: &Self) -> Result<Vec<(u32, f64, f64)>> {
        let mine: BTreeSet<u32> = self.means.keys().copied().collect();
        let theirs: BTreeSet<u32> = other.means.keys().copied().collect();

        if mine != theirs {
            return Err(Error::ChainMismatch {
                expected: self.len(),
                missing: mine.difference(&theirs).copied().collect(),
                unexpected: theirs.difference(&mine).copied().collect(),
            });
        }

        // Equal key sets: both maps iterate in the same id order
        Ok(self
            .means
            .iter()
            .zip(other.means.values())
            .map(|((&chain, &mine), &theirs)| (chain, mine, theirs))
            .collect())
    }
}
