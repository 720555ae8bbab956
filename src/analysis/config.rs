use serde::{Deserialize, Serialize};

/// Operator-tunable cut-offs for the discrepancy and misbehaviour rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisThresholds {
    /// Sentiment readings below this confidence are not trusted.
    pub confidence_threshold: f64,
    /// Minimum |polarity - normalized mark| that counts as a discrepancy.
    pub gap_tolerance: f64,
    /// Minimum zero-shot score for a non-normal category to be reported.
    pub misbehaviour_warn_min: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.20,
            gap_tolerance: 0.70,
            misbehaviour_warn_min: 0.30,
        }
    }
}
