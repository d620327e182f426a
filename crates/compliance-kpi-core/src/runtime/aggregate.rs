// crates/compliance-kpi-core/src/runtime/aggregate.rs
// ============================================================================
// Module: KPI Aggregation
// Description: Reduces a coerced score column to a KPI record.
// Purpose: Count RAG buckets and compute rounded mean readiness.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Aggregation is a pure function of the valid scores. Empty input is valid
//! and yields [`KpiRecord::EMPTY`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::KpiRecord;
use crate::core::RagBucket;
use crate::core::round_one_decimal;

// ============================================================================
// SECTION: Aggregation
// ============================================================================

/// Aggregates valid (finite) scores into a KPI record.
#[must_use]
pub fn aggregate(scores: &[f64]) -> KpiRecord {
    if scores.is_empty() {
        return KpiRecord::EMPTY;
    }
    #[allow(clippy::cast_precision_loss, reason = "Score counts are far below 2^52.")]
    let count = scores.len() as f64;
    let mut kpi = KpiRecord::EMPTY;
    let mut sum = 0.0_f64;
    for &score in scores {
        sum += score;
        match RagBucket::classify(score) {
            RagBucket::Green => kpi.green += 1,
            RagBucket::Amber => kpi.amber += 1,
            RagBucket::Red => kpi.red += 1,
        }
    }
    kpi.total = kpi.green + kpi.amber + kpi.red;
    let mean = if sum.is_finite() {
        sum / count
    } else {
        // The plain sum overflowed; scaled terms stay within the score range
        // up to accumulated rounding at the very edge of f64.
        scores.iter().map(|score| score / count).sum::<f64>().clamp(-f64::MAX, f64::MAX)
    };
    kpi.readiness = round_one_decimal(mean);
    kpi
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::aggregate;
    use crate::core::KpiRecord;

    #[test]
    fn mixed_buckets() {
        let kpi = aggregate(&[80.0, 92.0, 65.0]);
        assert_eq!(
            kpi,
            KpiRecord {
                total: 3,
                green: 1,
                amber: 1,
                red: 1,
                readiness: 79.0,
            }
        );
    }

    #[test]
    fn huge_scores_keep_a_finite_mean() {
        let kpi = aggregate(&[1e308, 1e308]);
        assert_eq!(kpi.green, 2);
        assert!(kpi.readiness.is_finite());
        assert_eq!(kpi.readiness, 1e308);
    }

    #[test]
    fn empty_is_all_zero() {
        assert_eq!(aggregate(&[]), KpiRecord::EMPTY);
    }
}
