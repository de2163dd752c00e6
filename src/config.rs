//! Estimator configuration
//!
//! One immutable value describes a whole estimation call. The measurement
//! and baseline sampler configurations are derived from it on every call, so
//! two calls never share a step-rule object.
//!
//! ```rust
//! use llc_estimator::config::EstimatorConfig;
//! use llc_estimator::sampler::{Seed, SgldConfig, StepRule};
//!
//! let config = EstimatorConfig::default()
//!     .num_chains(4)
//!     .num_draws(200)
//!     .seed(Seed::Shared(42))
//!     .step_rule(StepRule::Sgld(SgldConfig::default().lr(1e-3)));
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.sampler_config().num_chains, 4);
//! ```

use crate::sampler::{BaselineConfig, Device, SamplerConfig, Seed, StepRule};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Configuration of one learning coefficient estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Measurement step rule
    pub step_rule: StepRule,
    /// Draws per measurement chain
    pub num_draws: usize,
    /// Chains per sampler call
    pub num_chains: usize,
    /// Burn-in steps per measurement chain
    pub num_burnin_steps: usize,
    /// Stride between recorded measurement draws
    pub num_steps_bw_draws: usize,
    /// Draws per baseline chain
    pub num_baseline_draws: usize,
    /// Worker threads for chain execution
    pub cores: usize,
    /// Seeding scheme shared by both sampler calls
    pub seed: Seed,
    /// Evaluation device
    pub device: Device,
    /// Report per-chain progress
    pub progress: bool,
    /// Emit informational logs
    pub verbose: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            step_rule: StepRule::default(),
            num_draws: 100,
            num_chains: 10,
            num_burnin_steps: 0,
            num_steps_bw_draws: 1,
            num_baseline_draws: 100,
            cores: 1,
            seed: Seed::None,
            device: Device::Cpu,
            progress: true,
            verbose: true,
        }
    }
}

impl EstimatorConfig {
    /// Parse a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or fails validation
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the measurement step rule
    #[must_use]
    pub fn step_rule(mut self, step_rule: StepRule) -> Self {
        self.step_rule = step_rule;
        self
    }

    /// Set the draws per measurement chain
    #[must_use]
    pub const fn num_draws(mut self, num_draws: usize) -> Self {
        self.num_draws = num_draws;
        self
    }

    /// Set the number of chains
    #[must_use]
    pub const fn num_chains(mut self, num_chains: usize) -> Self {
        self.num_chains = num_chains;
        self
    }

    /// Set the burn-in steps
    #[must_use]
    pub const fn num_burnin_steps(mut self, num_burnin_steps: usize) -> Self {
        self.num_burnin_steps = num_burnin_steps;
        self
    }

    /// Set the stride between draws
    #[must_use]
    pub const fn num_steps_bw_draws(mut self, num_steps_bw_draws: usize) -> Self {
        self.num_steps_bw_draws = num_steps_bw_draws;
        self
    }

    /// Set the draws per baseline chain
    #[must_use]
    pub const fn num_baseline_draws(mut self, num_baseline_draws: usize) -> Self {
        self.num_baseline_draws = num_baseline_draws;
        self
    }

    /// Set the worker thread count
    #[must_use]
    pub const fn cores(mut self, cores: usize) -> Self {
        self.cores = cores;
        self
    }

    /// Set the seeding scheme
    #[must_use]
    pub fn seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self
    }

    /// Set the device
    #[must_use]
    pub const fn device(mut self, device: Device) -> Self {
        self.device = device;
        self
    }

    /// Enable or disable progress reporting
    #[must_use]
    pub const fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Enable or disable informational logs
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Fresh measurement sampler configuration.
    #[must_use]
    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            step_rule: self.step_rule.clone(),
            num_draws: self.num_draws,
            num_chains: self.num_chains,
            num_burnin_steps: self.num_burnin_steps,
            num_steps_bw_draws: self.num_steps_bw_draws,
            cores: self.cores,
            seed: self.seed.clone(),
            device: self.device,
            progress: self.progress,
            verbose: self.verbose,
        }
    }

    /// Fresh baseline sampler configuration.
    #[must_use]
    pub fn baseline_config(&self) -> BaselineConfig {
        BaselineConfig {
            num_chains: self.num_chains,
            num_baseline_draws: self.num_baseline_draws,
            cores: self.cores,
            seed: self.seed.clone(),
            device: self.device,
            progress: self.progress,
            verbose: self.verbose,
        }
    }

    /// Validate both derived sampler configurations.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] describing the first invalid
    /// field
    pub fn validate(&self) -> Result<()> {
        self.sampler_config().validate()?;
        self.baseline_config().validate()
    }
}
