//! Shared samplers for integration tests
//!
//! - `FixedSampler`: replays canned traces and counts calls
//! - `FailingSampler`: always fails
//! - `ToySgld`: SGLD on a one-parameter linear model `y = w * x`

#![allow(dead_code)]

use llc_estimator::sampler::{
    BaselineConfig, ChainPool, ChainSampler, Dataset, Draw, SamplerConfig, StepRule,
};
use llc_estimator::{Error, Result, Trace, TraceRecord};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================================
// Canned traces
// ============================================================================

/// One trace with `draws` records per chain, every record of chain `c`
/// holding `means[c]`.
pub fn trace_with_means(means: &[f64], draws: u64) -> Trace {
    Trace::from_records(means.iter().enumerate().flat_map(|(c, &m)| {
        let chain = u32::try_from(c).unwrap();
        (0..draws).map(move |s| TraceRecord::new(chain, s, m))
    }))
    .unwrap()
}

/// Loader with `n` dummy samples.
pub fn loader_of_size(n: usize) -> Vec<f64> {
    vec![0.0; n]
}

pub struct FixedSampler {
    pub trace: Trace,
    pub baseline: Trace,
    pub sample_calls: AtomicUsize,
    pub baseline_calls: AtomicUsize,
}

impl FixedSampler {
    pub fn new(trace: Trace, baseline: Trace) -> Self {
        Self {
            trace,
            baseline,
            sample_calls: AtomicUsize::new(0),
            baseline_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> (usize, usize) {
        (
            self.sample_calls.load(Ordering::SeqCst),
            self.baseline_calls.load(Ordering::SeqCst),
        )
    }
}

impl ChainSampler for FixedSampler {
    type Model = ();
    type Loader = Vec<f64>;
    type Criterion = ();

    fn sample(&self, _: &(), _: &Vec<f64>, _: &(), _: &SamplerConfig) -> Result<Trace> {
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.trace.clone())
    }

    fn sample_baseline(&self, _: &(), _: &Vec<f64>, _: &(), _: &BaselineConfig) -> Result<Trace> {
        self.baseline_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.baseline.clone())
    }
}

pub struct FailingSampler;

impl ChainSampler for FailingSampler {
    type Model = ();
    type Loader = Vec<f64>;
    type Criterion = ();

    fn sample(&self, _: &(), _: &Vec<f64>, _: &(), _: &SamplerConfig) -> Result<Trace> {
        Err(Error::Sampler("device lost".to_string()))
    }

    fn sample_baseline(&self, _: &(), _: &Vec<f64>, _: &(), _: &BaselineConfig) -> Result<Trace> {
        Err(Error::Sampler("baseline unreachable".to_string()))
    }
}

// ============================================================================
// Toy SGLD
// ============================================================================

/// Linear model `y = w * x`.
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub w: f64,
}

/// `(x, y)` pairs drawn in minibatches.
#[derive(Debug, Clone)]
pub struct PairLoader {
    pub data: Vec<(f64, f64)>,
    pub batch_size: usize,
}

impl Dataset for PairLoader {
    fn len(&self) -> usize {
        self.data.len()
    }
}

/// `(prediction, target) -> loss`
pub type Criterion = fn(f64, f64) -> f64;

pub fn squared_error(prediction: f64, target: f64) -> f64 {
    (prediction - target) * (prediction - target)
}

/// Noisy samples of `y = 2x` on `[-1, 1]`.
pub fn line_data(n: usize, batch_size: usize) -> PairLoader {
    let mut rng = StdRng::seed_from_u64(7);
    let data = (0..n)
        .map(|_| {
            let x: f64 = rng.gen_range(-1.0..1.0);
            (x, 2.0 * x + 0.1 * rng.gen_range(-1.0f64..1.0))
        })
        .collect();
    PairLoader { data, batch_size }
}

fn rng_for(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

fn minibatch(loader: &PairLoader, rng: &mut StdRng) -> Vec<(f64, f64)> {
    (0..loader.batch_size)
        .map(|_| loader.data[rng.gen_range(0..loader.data.len())])
        .collect()
}

fn batch_loss(w: f64, batch: &[(f64, f64)], criterion: Criterion) -> f64 {
    let total: f64 = batch.iter().map(|&(x, y)| criterion(w * x, y)).sum();
    total / batch.len() as f64
}

pub struct ToySgld;

impl ChainSampler for ToySgld {
    type Model = Line;
    type Loader = PairLoader;
    type Criterion = Criterion;

    fn sample(
        &self,
        model: &Line,
        loader: &PairLoader,
        criterion: &Criterion,
        config: &SamplerConfig,
    ) -> Result<Trace> {
        let StepRule::Sgld(sgld) = &config.step_rule else {
            return Err(Error::Sampler("toy sampler only runs sgld".to_string()));
        };
        let temperature = sgld.temperature.resolve(loader.len())?;
        let criterion = *criterion;

        ChainPool::new(config.cores)?
            .with_progress(config.progress)
            .run(config.num_chains, &config.seed, |task| {
                let mut rng = rng_for(task.seed());
                let mut w = model.w;
                let mut draws = Vec::with_capacity(config.num_draws);

                for step in 0..config.total_steps() {
                    let batch = minibatch(loader, &mut rng);
                    let loss = batch_loss(w, &batch, criterion);
                    if config.is_draw_step(step) {
                        draws.push(Draw::new(step as u64, loss));
                    }

                    let h = 1e-6;
                    let grad = (batch_loss(w + h, &batch, criterion)
                        - batch_loss(w - h, &batch, criterion))
                        / (2.0 * h);
                    let drift = temperature * grad
                        + sgld.elasticity * (w - model.w)
                        + sgld.weight_decay * w;
                    let noise: f64 = rng.sample(StandardNormal);
                    w += -sgld.lr / 2.0 * drift + noise * sgld.lr.sqrt() * sgld.noise_level;

                    if !w.is_finite() {
                        return Err(Error::Sampler(format!(
                            "parameter diverged at step {step}"
                        )));
                    }
                }
                Ok(draws)
            })
    }

    fn sample_baseline(
        &self,
        model: &Line,
        loader: &PairLoader,
        criterion: &Criterion,
        config: &BaselineConfig,
    ) -> Result<Trace> {
        let criterion = *criterion;
        ChainPool::new(config.cores)?
            .with_progress(config.progress)
            .run(config.num_chains, &config.seed, |task| {
                let mut rng = rng_for(task.seed());
                Ok((0..config.num_baseline_draws as u64)
                    .map(|step| {
                        let batch = minibatch(loader, &mut rng);
                        Draw::new(step, batch_loss(model.w, &batch, criterion))
                    })
                    .collect())
            })
    }
}
