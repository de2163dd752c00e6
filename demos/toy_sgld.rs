//! Learning coefficient of a two-parameter product model
//!
//! The model `y = a * b * x` is singular at the origin: the loss only depends
//! on the product `a * b`. Its learning coefficient is lower than the
//! regular-model value of `d / 2 = 1`, which a regular count of parameters
//! would miss.
//!
//! Run with: RUST_LOG=info cargo run --example toy_sgld

use anyhow::Context;
use llc_estimator::sampler::{
    BaselineConfig, ChainPool, ChainSampler, Dataset, Draw, SamplerConfig, Seed, SgldConfig,
    StepRule,
};
use llc_estimator::viz::{plot_learning_coeff_trace, JsonRenderer, PlotStyle};
use llc_estimator::{estimate_learning_coeff_with_summary, EstimatorConfig, Error, Trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing_subscriber::EnvFilter;

/// `y = a * b * x`
struct Product {
    a: f64,
    b: f64,
}

struct Samples(Vec<(f64, f64)>);

impl Dataset for Samples {
    fn len(&self) -> usize {
        self.0.len()
    }
}

#[allow(clippy::cast_precision_loss)]
fn loss(a: f64, b: f64, data: &[(f64, f64)]) -> f64 {
    data.iter()
        .map(|&(x, y)| (a * b * x - y).powi(2))
        .sum::<f64>()
        / data.len() as f64
}

fn rng_for(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// Full-batch SGLD on `(a, b)` with an elastic pull to the start point.
struct FullBatchSgld;

impl ChainSampler for FullBatchSgld {
    type Model = Product;
    type Loader = Samples;
    type Criterion = ();

    fn sample(
        &self,
        model: &Product,
        data: &Samples,
        _: &(),
        config: &SamplerConfig,
    ) -> llc_estimator::Result<Trace> {
        let StepRule::Sgld(sgld) = &config.step_rule else {
            return Err(Error::Sampler("only sgld is supported".to_string()));
        };
        let beta = sgld.temperature.resolve(data.len())?;

        ChainPool::new(config.cores)?
            .with_progress(config.progress)
            .run(config.num_chains, &config.seed, |task| {
                let mut rng = rng_for(task.seed());
                let (mut a, mut b) = (model.a, model.b);
                let mut draws = Vec::with_capacity(config.num_draws);

                for step in 0..config.total_steps() {
                    if config.is_draw_step(step) {
                        draws.push(Draw::new(step as u64, loss(a, b, &data.0)));
                    }
                    // d/da mean((abx - y)^2) = mean(2 (abx - y) b x)
                    let n = data.0.len() as f64;
                    let (ga, gb) = data.0.iter().fold((0.0, 0.0), |(ga, gb), &(x, y)| {
                        let r = 2.0 * (a * b * x - y) * x / n;
                        (ga + r * b, gb + r * a)
                    });
                    let noise = sgld.lr.sqrt() * sgld.noise_level;
                    a += -sgld.lr / 2.0 * (beta * ga + sgld.elasticity * (a - model.a))
                        + noise * rng.sample::<f64, _>(StandardNormal);
                    b += -sgld.lr / 2.0 * (beta * gb + sgld.elasticity * (b - model.b))
                        + noise * rng.sample::<f64, _>(StandardNormal);
                }
                Ok(draws)
            })
    }

    fn sample_baseline(
        &self,
        model: &Product,
        data: &Samples,
        _: &(),
        config: &BaselineConfig,
    ) -> llc_estimator::Result<Trace> {
        let at_start = loss(model.a, model.b, &data.0);
        ChainPool::new(config.cores)?
            .with_progress(config.progress)
            .run(config.num_chains, &config.seed, |_| {
                Ok((0..config.num_baseline_draws as u64)
                    .map(|step| Draw::new(step, at_start))
                    .collect())
            })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Data from the true parameter a * b = 0
    let mut rng = StdRng::seed_from_u64(0);
    let data = Samples(
        (0..1_000)
            .map(|_| {
                let x = rng.gen_range(-1.0..1.0);
                let noise: f64 = rng.sample(StandardNormal);
                (x, 0.1 * noise)
            })
            .collect(),
    );

    let config = EstimatorConfig::default()
        .num_chains(4)
        .num_draws(400)
        .num_burnin_steps(100)
        .cores(4)
        .seed(Seed::Shared(2024))
        .step_rule(StepRule::Sgld(
            SgldConfig::default().lr(1e-4).elasticity(100.0),
        ));

    let summary = estimate_learning_coeff_with_summary(
        &FullBatchSgld,
        &Product { a: 0.0, b: 0.0 },
        &data,
        &(),
        &config,
    )
    .context("learning coefficient estimation failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);

    let path = std::env::temp_dir().join("toy_sgld_trace.parquet");
    summary.trace().write_parquet(&path)?;
    println!("trace written to {}", path.display());

    let mut renderer = JsonRenderer::pretty(std::io::sink());
    plot_learning_coeff_trace(summary.trace(), &PlotStyle::new(), &mut renderer)?;

    Ok(())
}
