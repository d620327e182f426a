// crates/compliance-kpi-core/src/core/kpi.rs
// ============================================================================
// Module: Compliance KPI Records
// Description: RAG bucket thresholds and the per-control-set KPI record.
// Purpose: Define the single canonical threshold and rounding convention.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`KpiRecord`] summarizes one control set for one run. Bucket boundaries
//! are inclusive on the low end: a score of exactly [`GREEN_THRESHOLD`] is
//! green and exactly [`AMBER_THRESHOLD`] is amber. Every report and dashboard
//! consumer must classify through [`RagBucket::classify`] so the boundaries
//! cannot drift.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Lowest score classified as green.
pub const GREEN_THRESHOLD: f64 = 90.0;
/// Lowest score classified as amber.
pub const AMBER_THRESHOLD: f64 = 70.0;

/// Red/amber/green classification of a single score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagBucket {
    /// Score below [`AMBER_THRESHOLD`].
    Red,
    /// Score in `[AMBER_THRESHOLD, GREEN_THRESHOLD)`.
    Amber,
    /// Score at or above [`GREEN_THRESHOLD`].
    Green,
}

impl RagBucket {
    /// Classifies a finite score.
    #[must_use]
    pub fn classify(score: f64) -> Self {
        if score >= GREEN_THRESHOLD {
            Self::Green
        } else if score >= AMBER_THRESHOLD {
            Self::Amber
        } else {
            Self::Red
        }
    }

    /// Returns the lowercase label used in logs and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Amber => "amber",
            Self::Green => "green",
        }
    }
}

// ============================================================================
// SECTION: KPI Record
// ============================================================================

/// Aggregate readiness metrics for one control set in one run.
///
/// # Invariants
/// - `green + amber + red == total`.
/// - `readiness` is the mean of valid scores rounded to one decimal, or `0.0`
///   when `total == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiRecord {
    /// Count of records with a valid score.
    pub total: u64,
    /// Count of green scores.
    pub green: u64,
    /// Count of amber scores.
    pub amber: u64,
    /// Count of red scores.
    pub red: u64,
    /// Mean readiness, one decimal place.
    pub readiness: f64,
}

impl KpiRecord {
    /// The KPI record for a control set with no valid scores.
    pub const EMPTY: Self = Self {
        total: 0,
        green: 0,
        amber: 0,
        red: 0,
        readiness: 0.0,
    };

    /// Returns the count for a single bucket.
    #[must_use]
    pub const fn count(&self, bucket: RagBucket) -> u64 {
        match bucket {
            RagBucket::Red => self.red,
            RagBucket::Amber => self.amber,
            RagBucket::Green => self.green,
        }
    }
}

impl Default for KpiRecord {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ============================================================================
// SECTION: Rounding
// ============================================================================

/// Rounds to one decimal place, halves away from zero.
///
/// The multiplication happens in `f64`, so a mean whose binary value sits just
/// below a half (for example `70.05`) rounds down.
/// Values too large to scale are already whole numbers and are returned as is.
#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    let scaled = value * 10.0;
    if scaled.is_finite() { scaled.round() / 10.0 } else { value }
}
