// crates/compliance-kpi-core/src/runtime/coerce.rs
// ============================================================================
// Module: Score Coercion
// Description: Normalizes a raw score column to finite numbers.
// Purpose: Apply the drop-don't-fail policy for malformed score cells.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Malformed cells are excluded from aggregation: they are neither errors nor
//! zeros. The count of dropped cells is reported so callers can surface it,
//! but it never changes `total` or the readiness mean.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::borrow::Borrow;

use serde::Serialize;

use crate::core::RawScore;

// ============================================================================
// SECTION: Coercion
// ============================================================================

/// Result of coercing one score column.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoercedScores {
    /// Valid scores in input order.
    pub scores: Vec<f64>,
    /// Number of cells dropped as empty or malformed.
    pub dropped: usize,
}

/// Coerces raw cells to finite scores, dropping anything else.
///
/// Numeric text is trimmed before parsing; `NaN` and infinities count as
/// malformed.
#[must_use]
pub fn coerce_scores<I>(raw: I) -> CoercedScores
where
    I: IntoIterator,
    I::Item: Borrow<RawScore>,
{
    let mut coerced = CoercedScores::default();
    for cell in raw {
        match coerce_cell(cell.borrow()) {
            Some(score) => coerced.scores.push(score),
            None => coerced.dropped += 1,
        }
    }
    coerced
}

/// Coerces a single cell.
fn coerce_cell(cell: &RawScore) -> Option<f64> {
    let value = match cell {
        RawScore::Number(value) => *value,
        RawScore::Text(text) => text.trim().parse::<f64>().ok()?,
        RawScore::Empty => return None,
    };
    value.is_finite().then_some(value)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::coerce_scores;
    use crate::core::RawScore;

    #[test]
    fn keeps_numbers_and_numeric_text() {
        let raw = [RawScore::from(80), RawScore::from(" 92.5 "), RawScore::from("1e1")];
        let coerced = coerce_scores(&raw);
        assert_eq!(coerced.scores, vec![80.0, 92.5, 10.0]);
        assert_eq!(coerced.dropped, 0);
    }

    #[test]
    fn drops_blank_malformed_and_non_finite_cells() {
        let raw = [
            RawScore::Empty,
            RawScore::from("N/A"),
            RawScore::from("80%"),
            RawScore::from("   "),
            RawScore::from("NaN"),
            RawScore::Number(f64::INFINITY),
            RawScore::from(65),
        ];
        let coerced = coerce_scores(raw);
        assert_eq!(coerced.scores, vec![65.0]);
        assert_eq!(coerced.dropped, 6);
    }

    #[test]
    fn coercion_is_idempotent() {
        let raw = [RawScore::from("70"), RawScore::from("x"), RawScore::from(90)];
        let once = coerce_scores(&raw);
        let twice = coerce_scores(once.scores.iter().copied().map(RawScore::Number));
        assert_eq!(twice.scores, once.scores);
        assert_eq!(twice.dropped, 0);
    }
}
