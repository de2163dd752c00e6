//! Toy SGLD runs through the chain pool
//!
//! Exercises seeding, worker-count independence and failure propagation with
//! a real (if tiny) stochastic sampler.

mod common;

use common::{line_data, squared_error, Criterion, Line, ToySgld};
use llc_estimator::sampler::{ChainSampler, Seed, SgldConfig, StepRule, Temperature};
use llc_estimator::{estimate_learning_coeff, estimate_learning_coeff_with_summary};
use llc_estimator::{EstimatorConfig, Error};

const CRITERION: Criterion = squared_error;

fn config() -> EstimatorConfig {
    EstimatorConfig::default()
        .num_chains(4)
        .num_draws(50)
        .num_burnin_steps(10)
        .num_steps_bw_draws(2)
        .num_baseline_draws(30)
        .seed(Seed::Shared(42))
        .step_rule(StepRule::Sgld(SgldConfig::default().lr(1e-4)))
        .verbose(false)
}

#[test]
fn test_trace_shape_follows_draw_schedule() {
    let loader = line_data(200, 16);
    let sampler_config = config().sampler_config();
    let trace = ToySgld
        .sample(&Line { w: 2.0 }, &loader, &CRITERION, &sampler_config)
        .unwrap();

    assert_eq!(trace.chain_ids(), vec![0, 1, 2, 3]);
    assert_eq!(trace.len(), 4 * 50);

    // burn-in 10, stride 2 -> steps 10, 12, ..., 108
    let steps: Vec<u64> = trace.chain_records(0).iter().map(|r| r.step()).collect();
    assert_eq!(steps.first(), Some(&10));
    assert_eq!(steps.last(), Some(&108));
    assert!(steps.windows(2).all(|w| w[1] - w[0] == 2));
}

#[test]
fn test_seeded_runs_are_bit_identical() {
    let loader = line_data(200, 16);
    let model = Line { w: 2.0 };

    let first =
        estimate_learning_coeff_with_summary(&ToySgld, &model, &loader, &CRITERION, &config())
            .unwrap();
    let second =
        estimate_learning_coeff_with_summary(&ToySgld, &model, &loader, &CRITERION, &config())
            .unwrap();

    assert_eq!(first.mean().to_bits(), second.mean().to_bits());
    assert_eq!(first.std().to_bits(), second.std().to_bits());
    assert_eq!(first.chains(), second.chains());
    assert_eq!(first.trace(), second.trace());
}

#[test]
fn test_result_independent_of_core_count() {
    let loader = line_data(200, 16);
    let model = Line { w: 2.0 };

    let serial =
        estimate_learning_coeff(&ToySgld, &model, &loader, &CRITERION, &config().cores(1))
            .unwrap();
    let parallel =
        estimate_learning_coeff(&ToySgld, &model, &loader, &CRITERION, &config().cores(4))
            .unwrap();

    assert_eq!(serial.to_bits(), parallel.to_bits());
}

#[test]
fn test_per_chain_seeds_match_shared_offsets() {
    let loader = line_data(200, 16);
    let model = Line { w: 2.0 };

    let shared =
        estimate_learning_coeff(&ToySgld, &model, &loader, &CRITERION, &config()).unwrap();
    let explicit = estimate_learning_coeff(
        &ToySgld,
        &model,
        &loader,
        &CRITERION,
        &config().seed(Seed::PerChain(vec![42, 43, 44, 45])),
    )
    .unwrap();

    assert_eq!(shared.to_bits(), explicit.to_bits());
}

#[test]
fn test_different_seeds_differ() {
    let loader = line_data(200, 16);
    let model = Line { w: 2.0 };

    let a = estimate_learning_coeff(&ToySgld, &model, &loader, &CRITERION, &config()).unwrap();
    let b = estimate_learning_coeff(
        &ToySgld,
        &model,
        &loader,
        &CRITERION,
        &config().seed(Seed::Shared(7)),
    )
    .unwrap();

    assert_ne!(a.to_bits(), b.to_bits());
}

#[test]
fn test_estimate_is_finite_with_fixed_temperature() {
    let loader = line_data(200, 16);
    let config = config().step_rule(StepRule::Sgld(
        SgldConfig::default()
            .lr(1e-4)
            .elasticity(100.0)
            .temperature(Temperature::Fixed(10.0)),
    ));

    let summary = estimate_learning_coeff_with_summary(
        &ToySgld,
        &Line { w: 2.0 },
        &loader,
        &CRITERION,
        &config,
    )
    .unwrap();

    assert!(summary.mean().is_finite());
    assert!(summary.std().is_finite());
    assert!(summary.std() >= 0.0);
}

#[test]
fn test_divergent_chain_fails_whole_call() {
    let loader = line_data(200, 16);
    let config = config().step_rule(StepRule::Sgld(SgldConfig::default().lr(1e6)));

    let result = estimate_learning_coeff(&ToySgld, &Line { w: 2.0 }, &loader, &CRITERION, &config);

    match result {
        Err(Error::ChainFailed { chain, source }) => {
            assert_eq!(chain, 0);
            assert!(source.to_string().contains("diverged"));
        }
        other => panic!("expected ChainFailed, got {other:?}"),
    }
}

#[test]
fn test_unsupported_step_rule_propagates() {
    let loader = line_data(200, 16);
    let config = config().step_rule(StepRule::Custom {
        name: "sgnht".to_string(),
        params: Default::default(),
    });

    let result = estimate_learning_coeff(&ToySgld, &Line { w: 2.0 }, &loader, &CRITERION, &config);
    assert!(matches!(result, Err(Error::Sampler(_))));
}
