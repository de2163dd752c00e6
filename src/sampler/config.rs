//! Sampler configuration values
//!
//! Configurations are immutable values. The estimator derives a fresh
//! [`SamplerConfig`] and [`BaselineConfig`] for every call; no step-rule
//! object is ever shared between calls.

use crate::estimator::normalization_factor;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Seeding scheme for a multi-chain run.
///
/// Serialized as `null`, a single integer, or a list of integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    /// Chains are not seeded
    #[default]
    None,
    /// Chain `i` receives `seed + i` (wrapping)
    Shared(u64),
    /// Chain `i` receives `seeds[i]`
    PerChain(Vec<u64>),
}

impl Seed {
    /// Resolve one optional seed per chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a per-chain list does not hold
    /// exactly `num_chains` seeds
    pub fn chain_seeds(&self, num_chains: usize) -> Result<Vec<Option<u64>>> {
        match self {
            Self::None => Ok(vec![None; num_chains]),
            Self::Shared(seed) => Ok((0..num_chains as u64)
                .map(|i| Some(seed.wrapping_add(i)))
                .collect()),
            Self::PerChain(seeds) => {
                if seeds.len() != num_chains {
                    return Err(Error::InvalidConfig(format!(
                        "expected {num_chains} per-chain seeds, got {}",
                        seeds.len()
                    )));
                }
                Ok(seeds.iter().copied().map(Some).collect())
            }
        }
    }
}

/// Device the sampler evaluates the model on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    /// Host CPU
    #[default]
    Cpu,
    /// CUDA device by ordinal
    Cuda(usize),
}

/// SGLD inverse temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    /// `n / ln(n)` for the loader's dataset size
    #[default]
    Adaptive,
    /// Fixed value
    Fixed(f64),
}

impl Temperature {
    /// Resolve the temperature for a dataset of `n` samples.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateDatasetSize`] if adaptive and `n <= 1`
    pub fn resolve(self, n: usize) -> Result<f64> {
        match self {
            Self::Adaptive => normalization_factor(n),
            Self::Fixed(value) => Ok(value),
        }
    }
}

/// Free-form step-rule hyperparameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hyperparameter {
    /// Numeric value
    Value(f64),
    /// Let the sampler pick the value from the dataset size
    Adaptive,
}

/// Stochastic gradient Langevin dynamics hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgldConfig {
    /// Step size
    pub lr: f64,
    /// Scale of the injected Gaussian noise
    pub noise_level: f64,
    /// L2 penalty on the parameters
    pub weight_decay: f64,
    /// Strength of the pull back towards the initial parameters
    pub elasticity: f64,
    /// Inverse temperature applied to the loss gradient
    pub temperature: Temperature,
}

impl Default for SgldConfig {
    fn default() -> Self {
        Self {
            lr: 0.01,
            noise_level: 1.0,
            weight_decay: 0.0,
            elasticity: 0.0,
            temperature: Temperature::Adaptive,
        }
    }
}

impl SgldConfig {
    /// Set the step size
    #[must_use]
    pub const fn lr(mut self, lr: f64) -> Self {
        self.lr = lr;
        self
    }

    /// Set the noise level
    #[must_use]
    pub const fn noise_level(mut self, noise_level: f64) -> Self {
        self.noise_level = noise_level;
        self
    }

    /// Set the weight decay
    #[must_use]
    pub const fn weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Set the elasticity
    #[must_use]
    pub const fn elasticity(mut self, elasticity: f64) -> Self {
        self.elasticity = elasticity;
        self
    }

    /// Set the temperature
    #[must_use]
    pub const fn temperature(mut self, temperature: Temperature) -> Self {
        self.temperature = temperature;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.lr.is_finite() && self.lr > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sgld lr must be positive and finite, got {}",
                self.lr
            )));
        }
        for (name, value) in [
            ("noise_level", self.noise_level),
            ("weight_decay", self.weight_decay),
            ("elasticity", self.elasticity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "sgld {name} must be non-negative and finite, got {value}"
                )));
            }
        }
        if let Temperature::Fixed(t) = self.temperature {
            if !(t.is_finite() && t > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "sgld temperature must be positive and finite, got {t}"
                )));
            }
        }
        Ok(())
    }
}

/// Update rule the sampler applies between draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepRule {
    /// Stochastic gradient Langevin dynamics
    Sgld(SgldConfig),
    /// Sampler-specific rule identified by name
    Custom {
        /// Rule name understood by the sampler
        name: String,
        /// Hyperparameters keyed by name
        #[serde(default)]
        params: BTreeMap<String, Hyperparameter>,
    },
}

impl Default for StepRule {
    fn default() -> Self {
        Self::Sgld(SgldConfig::default())
    }
}

impl StepRule {
    /// Validate hyperparameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for out-of-range SGLD values or a
    /// custom rule without a name
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Sgld(sgld) => sgld.validate(),
            Self::Custom { name, .. } if name.trim().is_empty() => Err(Error::InvalidConfig(
                "custom step rule needs a name".to_string(),
            )),
            Self::Custom { .. } => Ok(()),
        }
    }
}

fn require_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(Error::InvalidConfig(format!("{name} must be at least 1")));
    }
    Ok(())
}

/// Measurement-mode sampler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Update rule and its hyperparameters
    pub step_rule: StepRule,
    /// Draws recorded per chain
    pub num_draws: usize,
    /// Independent chains
    pub num_chains: usize,
    /// Steps discarded before the first draw
    pub num_burnin_steps: usize,
    /// Stride between recorded draws
    pub num_steps_bw_draws: usize,
    /// Worker threads for chain execution
    pub cores: usize,
    /// Seeding scheme
    pub seed: Seed,
    /// Evaluation device
    pub device: Device,
    /// Report per-chain progress; pass to [`ChainPool::with_progress`](super::ChainPool::with_progress)
    pub progress: bool,
    /// Emit informational logs
    pub verbose: bool,
}

impl SamplerConfig {
    /// Total optimizer steps each chain takes, saturating at `usize::MAX`.
    ///
    /// [`SamplerConfig::validate`] rejects schedules that do not fit.
    #[must_use]
    pub const fn total_steps(&self) -> usize {
        self.num_burnin_steps
            .saturating_add(self.num_draws.saturating_mul(self.num_steps_bw_draws))
    }

    fn checked_total_steps(&self) -> Option<usize> {
        self.num_draws
            .checked_mul(self.num_steps_bw_draws)?
            .checked_add(self.num_burnin_steps)
    }

    /// Whether `step` (0-based) is recorded as a draw.
    #[must_use]
    pub const fn is_draw_step(&self, step: usize) -> bool {
        self.num_steps_bw_draws > 0
            && step >= self.num_burnin_steps
            && step < self.total_steps()
            && (step - self.num_burnin_steps) % self.num_steps_bw_draws == 0
    }

    /// Validate counts, seeds and step rule.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        require_positive("num_draws", self.num_draws)?;
        require_positive("num_chains", self.num_chains)?;
        require_positive("num_steps_bw_draws", self.num_steps_bw_draws)?;
        require_positive("cores", self.cores)?;
        if self.checked_total_steps().is_none() {
            return Err(Error::InvalidConfig(format!(
                "draw schedule overflows: {} burn-in steps + {} draws x {} steps between draws",
                self.num_burnin_steps, self.num_draws, self.num_steps_bw_draws
            )));
        }
        self.seed.chain_seeds(self.num_chains)?;
        self.step_rule.validate()
    }
}

/// Baseline-mode sampler configuration. Baseline sampling uses a fixed
/// neutral procedure, so there is no step rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Independent chains
    pub num_chains: usize,
    /// Draws recorded per chain
    pub num_baseline_draws: usize,
    /// Worker threads for chain execution
    pub cores: usize,
    /// Seeding scheme
    pub seed: Seed,
    /// Evaluation device
    pub device: Device,
    /// Report per-chain progress; pass to [`ChainPool::with_progress`](super::ChainPool::with_progress)
    pub progress: bool,
    /// Emit informational logs
    pub verbose: bool,
}

impl BaselineConfig {
    /// Validate counts and seeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        require_positive("num_chains", self.num_chains)?;
        require_positive("num_baseline_draws", self.num_baseline_draws)?;
        require_positive("cores", self.cores)?;
        self.seed.chain_seeds(self.num_chains).map(|_| ())
    }
}
