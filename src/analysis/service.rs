use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use super::config::AnalysisThresholds;
use super::discrepancy::{self, DiscrepancyResult};
use super::domain::EvaluationRecord;
use super::misbehaviour::{MisbehaviourCategory, MisbehaviourClassifier, MisbehaviourResult};
use super::models::{InferenceSource, SentimentModel, ZeroShotClassifier};
use super::sentiment::ClauseSentimentScorer;
use super::text::normalize_comment;

/// Service owning both model handles. Build it once at startup and share it.
pub struct AnalysisService<S, Z> {
    sentiment: ClauseSentimentScorer<S>,
    misbehaviour: MisbehaviourClassifier<Z>,
    thresholds: AnalysisThresholds,
}

impl<S, Z> AnalysisService<S, Z>
where
    S: SentimentModel,
    Z: ZeroShotClassifier,
{
    pub fn new(sentiment: Arc<S>, zero_shot: Arc<Z>, thresholds: AnalysisThresholds) -> Self {
        Self {
            sentiment: ClauseSentimentScorer::new(sentiment),
            misbehaviour: MisbehaviourClassifier::new(zero_shot, thresholds.misbehaviour_warn_min),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &AnalysisThresholds {
        &self.thresholds
    }

    /// Analyze a single evaluation record.
    pub fn analyze(&self, record: &EvaluationRecord) -> Result<AnalysisResult, AnalysisError> {
        validate_criteria(record)?;

        let comment = normalize_comment(record.comment.as_deref());
        let average_mark = record.average_mark();

        let misbehaviour = self.misbehaviour.classify(&comment);
        let sentiment = self.sentiment.score(&comment);
        let discrepancy = discrepancy::detect(&sentiment, average_mark, &self.thresholds);

        let explanation = explain(&misbehaviour, &discrepancy);
        debug!(
            evaluation_id = ?record.evaluation_id,
            misbehaviour = misbehaviour.detected,
            discrepancy = discrepancy.detected,
            "evaluation analyzed"
        );

        let ids = record.identifiers();
        Ok(AnalysisResult {
            evaluation_id: ids.evaluation_id,
            peer_id: ids.peer_id,
            evaluator_id: ids.evaluator_id,
            activity_id: ids.activity_id,
            misbehaviour_detected: misbehaviour.detected,
            misbehaviour_category: misbehaviour.category,
            misbehaviour_label: misbehaviour.category.label().to_string(),
            misbehaviour_confidence: misbehaviour.confidence,
            misbehaviour_category_index: misbehaviour.category.ordinal(),
            misbehaviour_source: misbehaviour.source,
            mark_discrepancy_detected: false,
            comment_discrepancy_detected: discrepancy.detected,
            sentiment_norm: discrepancy.polarity,
            sentiment_confidence: discrepancy.confidence,
            sentiment_source: sentiment.source,
            average_mark,
            normalized_mark: discrepancy.normalized_mark,
            explanation,
            analysis_timestamp: Utc::now().timestamp(),
        })
    }
}

/// Scores are averaged as stored; the platform writes 0 for unset criteria.
fn validate_criteria(record: &EvaluationRecord) -> Result<(), AnalysisError> {
    for (index, score) in record.criteria().iter().enumerate() {
        if let Some(value) = score.filter(|value| !value.is_finite()) {
            return Err(AnalysisError::NonFiniteCriterion {
                criterion: index + 1,
                value,
            });
        }
    }
    Ok(())
}

fn explain(misbehaviour: &MisbehaviourResult, discrepancy: &DiscrepancyResult) -> String {
    let mut findings = Vec::new();

    if misbehaviour.detected {
        findings.push(format!(
            "Misbehaviour detected: {} (confidence: {:.2})",
            misbehaviour.category.label(),
            misbehaviour.confidence
        ));
    }
    if discrepancy.detected {
        findings.push(format!(
            "Comment-mark discrepancy: sentiment={:.2}, mark_norm={:.2} (confidence: {:.2})",
            discrepancy.polarity, discrepancy.normalized_mark, discrepancy.confidence
        ));
    }

    if findings.is_empty() {
        "No issues detected".to_string()
    } else {
        findings.join("; ")
    }
}

/// Per-record output, flattened for the platform's consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub evaluation_id: Option<i64>,
    pub peer_id: Option<i64>,
    pub evaluator_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub misbehaviour_detected: bool,
    pub misbehaviour_category: MisbehaviourCategory,
    pub misbehaviour_label: String,
    pub misbehaviour_confidence: f64,
    pub misbehaviour_category_index: u8,
    pub misbehaviour_source: InferenceSource,
    /// Reserved; no rule computes it yet.
    pub mark_discrepancy_detected: bool,
    pub comment_discrepancy_detected: bool,
    pub sentiment_norm: f64,
    pub sentiment_confidence: f64,
    pub sentiment_source: InferenceSource,
    pub average_mark: f64,
    pub normalized_mark: f64,
    pub explanation: String,
    pub analysis_timestamp: i64,
}

/// Error raised while analyzing a single record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    #[error("criteria{criterion} score {value} is not a finite number")]
    NonFiniteCriterion { criterion: usize, value: f64 },
    #[error("invalid evaluation record: {0}")]
    InvalidRecord(String),
}
