// crates/compliance-kpi-core/tests/proptest_aggregation.rs
// ============================================================================
// Module: Aggregation Property Tests
// Description: Property-based checks for KPI count and readiness invariants.
// ============================================================================
//! ## Overview
//! Generates arbitrary score columns mixing numbers, numeric text, and junk
//! and checks the invariants every KPI record must hold.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use compliance_kpi_core::RawScore;
use compliance_kpi_core::aggregate;
use compliance_kpi_core::coerce_scores;
use proptest::prelude::*;

fn raw_score() -> impl Strategy<Value = RawScore> {
    prop_oneof![
        (-20.0_f64 .. 140.0).prop_map(RawScore::Number),
        (0.0_f64 .. 100.0).prop_map(|value| RawScore::Text(format!("{value}"))),
        Just(RawScore::Empty),
        "[a-zA-Z%/ ]{1,6}".prop_map(RawScore::Text),
    ]
}

proptest! {
    #[test]
    fn bucket_counts_sum_to_total(column in prop::collection::vec(raw_score(), 0 .. 64)) {
        let coerced = coerce_scores(&column);
        let kpi = aggregate(&coerced.scores);
        prop_assert_eq!(kpi.green + kpi.amber + kpi.red, kpi.total);
        prop_assert_eq!(kpi.total as usize, coerced.scores.len());
        prop_assert_eq!(coerced.scores.len() + coerced.dropped, column.len());
    }

    #[test]
    fn readiness_is_rounded_and_bounded(scores in prop::collection::vec(0.0_f64 .. 100.0, 1 .. 64)) {
        let kpi = aggregate(&scores);
        let scaled = kpi.readiness * 10.0;
        prop_assert!((scaled - scaled.round()).abs() < 1e-6);
        prop_assert!(kpi.readiness >= 0.0);
        prop_assert!(kpi.readiness <= 100.0);
    }

    #[test]
    fn readiness_is_finite_for_any_finite_scores(scores in prop::collection::vec(prop::num::f64::NORMAL, 1 .. 16)) {
        let kpi = aggregate(&scores);
        prop_assert!(kpi.readiness.is_finite());
    }

    #[test]
    fn aggregation_is_order_independent_for_counts(mut scores in prop::collection::vec(0.0_f64 .. 100.0, 0 .. 32)) {
        let forward = aggregate(&scores);
        scores.reverse();
        let reversed = aggregate(&scores);
        prop_assert_eq!(forward.total, reversed.total);
        prop_assert_eq!(forward.green, reversed.green);
        prop_assert_eq!(forward.amber, reversed.amber);
        prop_assert_eq!(forward.red, reversed.red);
    }
}
