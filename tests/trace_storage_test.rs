//! Trace persistence and offline re-estimation

mod common;

use common::trace_with_means;
use llc_estimator::{learning_coeff_from_traces, summary_from_traces, Trace, TraceRecord};
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "llc-estimator-{}-{name}.parquet",
        std::process::id()
    ))
}

#[test]
fn test_reestimate_from_stored_traces() {
    let trace = trace_with_means(&[2.0, 2.2, 1.8], 50);
    let baseline = trace_with_means(&[1.0, 1.0, 1.0], 50);

    let trace_path = temp_path("measure");
    let baseline_path = temp_path("baseline");
    trace.write_parquet(&trace_path).unwrap();
    baseline.write_parquet(&baseline_path).unwrap();

    let stored_trace = Trace::read_parquet(&trace_path).unwrap();
    let stored_baseline = Trace::read_parquet(&baseline_path).unwrap();
    std::fs::remove_file(&trace_path).ok();
    std::fs::remove_file(&baseline_path).ok();

    let live = learning_coeff_from_traces(&trace, &baseline, 100, 3).unwrap();
    let stored = learning_coeff_from_traces(&stored_trace, &stored_baseline, 100, 3).unwrap();
    assert_eq!(live.to_bits(), stored.to_bits());

    let summary = summary_from_traces(stored_trace, &stored_baseline, 100, 3).unwrap();
    assert_eq!(summary.trace(), &trace);
}

#[test]
fn test_large_trace_spans_multiple_batches() {
    // Parquet reader yields 1024-row batches; the loaded trace is one value
    let trace = Trace::from_records((0..4u32).flat_map(|c| {
        (0..2_000u64).map(move |s| TraceRecord::new(c, s, f64::from(c) * 0.25))
    }))
    .unwrap();

    let path = temp_path("large");
    trace.write_parquet(&path).unwrap();
    let loaded = Trace::read_parquet(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.len(), 8_000);
    assert_eq!(loaded.chain_ids(), vec![0, 1, 2, 3]);
    assert_eq!(loaded, trace);
}

#[test]
fn test_empty_trace_roundtrip() {
    let path = temp_path("empty");
    Trace::empty().write_parquet(&path).unwrap();
    let loaded = Trace::read_parquet(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert!(loaded.is_empty());
}
