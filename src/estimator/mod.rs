//! Local learning coefficient estimation
//!
//! The estimator calls the sampler twice (measurement, then baseline),
//! reduces each trace to per-chain mean losses, and normalizes the difference:
//!
//! ```text
//! llc = (avg_loss - baseline_loss) * n / ln(n)
//! ```
//!
//! where `n` is the dataset size. Two forms are offered:
//!
//! - [`estimate_learning_coeff`]: pooled scalar. Each side is collapsed to the
//!   average of its per-chain means before differencing.
//! - [`estimate_learning_coeff_with_summary`]: one coefficient per chain
//!   (measurement chain `i` joined with baseline chain `i` by id), then their
//!   mean and sample standard deviation.
//!
//! Both forms weigh chains equally, so the pooled value equals the summary
//! mean up to floating-point reduction order.
//!
//! The pure reductions ([`learning_coeff_from_traces`],
//! [`summary_from_traces`]) take traces directly and serve offline
//! re-estimation of stored runs.

mod result;

pub use result::LearningCoeffSummary;

use crate::config::EstimatorConfig;
use crate::sampler::{ChainSampler, Dataset};
use crate::stats;
use crate::summary::ChainSummary;
use crate::trace::Trace;
use crate::{Error, Result};

/// `n / ln(n)` for a dataset of `n` samples.
///
/// # Errors
///
/// Returns [`Error::DegenerateDatasetSize`] for `n <= 1`, where `ln(n)` is
/// zero or undefined
#[allow(clippy::cast_precision_loss)]
pub fn normalization_factor(n: usize) -> Result<f64> {
    if n <= 1 {
        return Err(Error::DegenerateDatasetSize { n });
    }
    let n = n as f64;
    Ok(n / n.ln())
}

/// `(avg_loss - baseline_loss) * n / ln(n)`, evaluated left to right.
#[allow(clippy::cast_precision_loss)]
fn normalize(avg_loss: f64, baseline_loss: f64, n: usize) -> Result<f64> {
    if n <= 1 {
        return Err(Error::DegenerateDatasetSize { n });
    }
    let n = n as f64;
    Ok((avg_loss - baseline_loss) * n / n.ln())
}

/// Per-chain summaries of both traces, each required to cover exactly
/// `0..num_chains`.
fn chain_summaries(
    trace: &Trace,
    baseline: &Trace,
    num_chains: usize,
) -> Result<(ChainSummary, ChainSummary)> {
    let measured = ChainSummary::from_trace(trace)?;
    measured.expect_chains(num_chains)?;

    let reference = ChainSummary::from_trace(baseline)?;
    reference.expect_chains(num_chains)?;

    Ok((measured, reference))
}

/// Pooled coefficient from a measurement trace and a baseline trace.
///
/// # Errors
///
/// - [`Error::DegenerateDatasetSize`] if `n <= 1`
/// - [`Error::EmptyTrace`] / [`Error::NonFiniteLoss`] for unusable traces
/// - [`Error::ChainMismatch`] if either trace does not cover exactly
///   `0..num_chains`
pub fn learning_coeff_from_traces(
    trace: &Trace,
    baseline: &Trace,
    n: usize,
    num_chains: usize,
) -> Result<f64> {
    normalization_factor(n)?;
    let (measured, reference) = chain_summaries(trace, baseline, num_chains)?;

    let avg_loss = measured.grand_mean().ok_or(Error::EmptyTrace)?;
    let baseline_loss = reference.grand_mean().ok_or(Error::EmptyTrace)?;

    normalize(avg_loss, baseline_loss, n)
}

/// Per-chain coefficients, their mean and sample standard deviation.
///
/// The measurement trace is moved into the result for later inspection.
///
/// # Errors
///
/// Same as [`learning_coeff_from_traces`]
pub fn summary_from_traces(
    trace: Trace,
    baseline: &Trace,
    n: usize,
    num_chains: usize,
) -> Result<LearningCoeffSummary> {
    normalization_factor(n)?;
    let (measured, reference) = chain_summaries(&trace, baseline, num_chains)?;

    let chains = measured
        .join(&reference)?
        .into_iter()
        .map(|(chain, avg_loss, baseline_loss)| {
            let llc = normalize(avg_loss, baseline_loss, n)?;
            tracing::debug!(chain, avg_loss, baseline_loss, llc, "chain coefficient");
            Ok(llc)
        })
        .collect::<Result<Vec<f64>>>()?;

    let mean = stats::mean(&chains).ok_or(Error::EmptyTrace)?;
    let std = stats::sample_std(&chains).ok_or(Error::EmptyTrace)?;

    Ok(LearningCoeffSummary::new(mean, std, chains, trace))
}

/// Validate, then run measurement and baseline sampling back to back.
fn sample_both<S: ChainSampler>(
    sampler: &S,
    model: &S::Model,
    loader: &S::Loader,
    criterion: &S::Criterion,
    config: &EstimatorConfig,
) -> Result<(Trace, Trace, usize)> {
    config.validate()?;
    let n = loader.len();
    normalization_factor(n)?;

    if config.verbose {
        tracing::info!(
            num_chains = config.num_chains,
            num_draws = config.num_draws,
            num_baseline_draws = config.num_baseline_draws,
            n,
            "sampling learning coefficient chains"
        );
    } else {
        tracing::debug!(
            num_chains = config.num_chains,
            num_draws = config.num_draws,
            num_baseline_draws = config.num_baseline_draws,
            n,
            "sampling learning coefficient chains"
        );
    }

    let trace = sampler.sample(model, loader, criterion, &config.sampler_config())?;
    let baseline = sampler.sample_baseline(model, loader, criterion, &config.baseline_config())?;

    Ok((trace, baseline, n))
}

/// Estimate the local learning coefficient as a single pooled value.
///
/// # Errors
///
/// - [`Error::InvalidConfig`] / [`Error::DegenerateDatasetSize`] before any
///   sampling happens
/// - any sampler failure, unchanged
/// - [`Error::ChainMismatch`] if a trace does not cover exactly
///   `0..num_chains`
pub fn estimate_learning_coeff<S: ChainSampler>(
    sampler: &S,
    model: &S::Model,
    loader: &S::Loader,
    criterion: &S::Criterion,
    config: &EstimatorConfig,
) -> Result<f64> {
    let (trace, baseline, n) = sample_both(sampler, model, loader, criterion, config)?;
    let llc = learning_coeff_from_traces(&trace, &baseline, n, config.num_chains)?;

    if config.verbose {
        tracing::info!(llc, "learning coefficient estimated");
    } else {
        tracing::debug!(llc, "learning coefficient estimated");
    }
    Ok(llc)
}

/// Estimate per-chain learning coefficients with their mean and spread.
///
/// # Errors
///
/// Same as [`estimate_learning_coeff`]
pub fn estimate_learning_coeff_with_summary<S: ChainSampler>(
    sampler: &S,
    model: &S::Model,
    loader: &S::Loader,
    criterion: &S::Criterion,
    config: &EstimatorConfig,
) -> Result<LearningCoeffSummary> {
    let (trace, baseline, n) = sample_both(sampler, model, loader, criterion, config)?;
    let summary = summary_from_traces(trace, &baseline, n, config.num_chains)?;

    if config.verbose {
        tracing::info!(
            mean = summary.mean(),
            std = summary.std(),
            "learning coefficient estimated"
        );
    } else {
        tracing::debug!(
            mean = summary.mean(),
            std = summary.std(),
            "learning coefficient estimated"
        );
    }
    Ok(summary)
}
