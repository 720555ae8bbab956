use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::models::{InferenceSource, ModelError, ZeroShotClassifier};

/// Hypothesis wrapped around each candidate phrase by the zero-shot model.
pub const HYPOTHESIS_TEMPLATE: &str = "In a team project, this behaviour is {}.";

/// Fixed set of behaviour categories reported back to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MisbehaviourCategory {
    Normal,
    Aggressive,
    Uncooperative,
    Irresponsible,
    Harassment,
    Dishonest,
}

impl MisbehaviourCategory {
    pub const ALL: [MisbehaviourCategory; 6] = [
        MisbehaviourCategory::Normal,
        MisbehaviourCategory::Aggressive,
        MisbehaviourCategory::Uncooperative,
        MisbehaviourCategory::Irresponsible,
        MisbehaviourCategory::Harassment,
        MisbehaviourCategory::Dishonest,
    ];

    /// 1-based position used by the platform's category column.
    pub fn ordinal(self) -> u8 {
        match self {
            MisbehaviourCategory::Normal => 1,
            MisbehaviourCategory::Aggressive => 2,
            MisbehaviourCategory::Uncooperative => 3,
            MisbehaviourCategory::Irresponsible => 4,
            MisbehaviourCategory::Harassment => 5,
            MisbehaviourCategory::Dishonest => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MisbehaviourCategory::Normal => "Normal or positive teamwork behaviour",
            MisbehaviourCategory::Aggressive => "Aggressive or hostile behaviour",
            MisbehaviourCategory::Uncooperative => "Uncooperative or ignoring messages behaviour",
            MisbehaviourCategory::Irresponsible => "Irresponsible or unreliable behaviour",
            MisbehaviourCategory::Harassment => "Harassment or inappropriate comments behaviour",
            MisbehaviourCategory::Dishonest => "Dishonest or plagiarism behaviour",
        }
    }

    /// Longer phrasing handed to the zero-shot model for better separation.
    pub fn candidate_phrase(self) -> &'static str {
        match self {
            MisbehaviourCategory::Normal => "Normal, respectful, helpful teamwork behaviour",
            MisbehaviourCategory::Aggressive => {
                "Aggressive or hostile behaviour (yelling, insults, threats)"
            }
            MisbehaviourCategory::Uncooperative => {
                "Uncooperative behaviour (ignores messages or instructions, refuses to respond)"
            }
            MisbehaviourCategory::Irresponsible => {
                "Irresponsible or unreliable behaviour (misses deadlines, fails to complete assigned tasks)"
            }
            MisbehaviourCategory::Harassment => {
                "Harassment or inappropriate comments (offensive or discriminatory remarks)"
            }
            MisbehaviourCategory::Dishonest => "Dishonest behaviour such as plagiarism or cheating",
        }
    }

    /// Maps a model label back to its category, accepting either the candidate
    /// phrase or the display label.
    pub fn from_model_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.candidate_phrase() == label || category.label() == label)
    }

    pub fn is_normal(self) -> bool {
        self == MisbehaviourCategory::Normal
    }
}

/// Outcome of classifying one comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MisbehaviourResult {
    pub detected: bool,
    pub category: MisbehaviourCategory,
    pub confidence: f64,
    pub source: InferenceSource,
}

impl MisbehaviourResult {
    fn normal(source: InferenceSource) -> Self {
        Self {
            detected: false,
            category: MisbehaviourCategory::Normal,
            confidence: 0.0,
            source,
        }
    }
}

/// Label-mapping layer over a zero-shot classifier.
pub struct MisbehaviourClassifier<Z> {
    model: Arc<Z>,
    warn_min: f64,
}

impl<Z> MisbehaviourClassifier<Z>
where
    Z: ZeroShotClassifier,
{
    pub fn new(model: Arc<Z>, warn_min: f64) -> Self {
        Self { model, warn_min }
    }

    pub fn classify(&self, text: &str) -> MisbehaviourResult {
        if text.trim().is_empty() {
            return MisbehaviourResult::normal(InferenceSource::EmptyText);
        }

        match self.top_category(text) {
            Ok((category, score)) => {
                let confidence = score.clamp(0.0, 1.0);
                MisbehaviourResult {
                    detected: !category.is_normal() && confidence >= self.warn_min,
                    category,
                    confidence,
                    source: InferenceSource::Model,
                }
            }
            Err(err) => {
                warn!(error = %err, "misbehaviour classification fell back to normal");
                MisbehaviourResult::normal(InferenceSource::fallback(&err))
            }
        }
    }

    fn top_category(&self, text: &str) -> Result<(MisbehaviourCategory, f64), ModelError> {
        let candidates: Vec<&str> = MisbehaviourCategory::ALL
            .iter()
            .map(|category| category.candidate_phrase())
            .collect();

        let ranking = self
            .model
            .classify(text, &candidates, HYPOTHESIS_TEMPLATE)?;
        let (label, score) = ranking.top().ok_or(ModelError::EmptyResponse)?;
        let category = MisbehaviourCategory::from_model_label(label)
            .ok_or_else(|| ModelError::UnknownLabel(label.to_string()))?;

        Ok((category, score))
    }
}
