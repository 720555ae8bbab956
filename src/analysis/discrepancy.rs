use serde::Serialize;

use super::config::AnalysisThresholds;
use super::domain::normalized_mark;
use super::sentiment::SentimentResult;

/// Comparison of a comment's sentiment with the mark that accompanied it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscrepancyResult {
    pub detected: bool,
    pub polarity: f64,
    pub confidence: f64,
    pub normalized_mark: f64,
}

/// Flags a discrepancy when a trusted sentiment reading sits at least
/// `gap_tolerance` away from the normalized mark. Readings below the
/// confidence threshold never flag.
pub fn detect(
    sentiment: &SentimentResult,
    average_mark: f64,
    thresholds: &AnalysisThresholds,
) -> DiscrepancyResult {
    let normalized_mark = normalized_mark(average_mark);
    let trusted = sentiment.confidence >= thresholds.confidence_threshold;
    let gap = (sentiment.polarity - normalized_mark).abs();

    DiscrepancyResult {
        detected: trusted && gap >= thresholds.gap_tolerance,
        polarity: sentiment.polarity,
        confidence: sentiment.confidence,
        normalized_mark,
    }
}
