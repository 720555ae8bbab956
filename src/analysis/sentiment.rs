use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::models::{InferenceSource, ModelError, SentimentModel};
use super::text::{clause_weights, normalize_weights, split_clauses};

/// Clause-weighted polarity and confidence for one comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub polarity: f64,
    pub confidence: f64,
    pub source: InferenceSource,
}

impl SentimentResult {
    fn neutral(source: InferenceSource) -> Self {
        Self {
            polarity: 0.0,
            confidence: 0.0,
            source,
        }
    }
}

/// Weighting layer over a sentiment model.
pub struct ClauseSentimentScorer<S> {
    model: Arc<S>,
}

impl<S> ClauseSentimentScorer<S>
where
    S: SentimentModel,
{
    pub fn new(model: Arc<S>) -> Self {
        Self { model }
    }

    /// Scores an already normalized comment. Empty text never reaches the
    /// model and model failures degrade to a zero reading.
    pub fn score(&self, text: &str) -> SentimentResult {
        let clauses = split_clauses(text);
        if clauses.is_empty() {
            return SentimentResult::neutral(InferenceSource::EmptyText);
        }

        match self.weighted(&clauses) {
            Ok((polarity, confidence)) => SentimentResult {
                polarity: polarity.clamp(-1.0, 1.0),
                confidence: confidence.clamp(0.0, 1.0),
                source: InferenceSource::Model,
            },
            Err(err) => {
                warn!(
                    error = %err,
                    clauses = clauses.len(),
                    "sentiment scoring fell back to neutral"
                );
                SentimentResult::neutral(InferenceSource::fallback(&err))
            }
        }
    }

    fn weighted(&self, clauses: &[String]) -> Result<(f64, f64), ModelError> {
        let distributions = self.model.predict(clauses)?;
        if distributions.is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        let used = distributions.len().min(clauses.len());
        let weights = normalize_weights(&clause_weights(clauses.len())[..used]);

        let (polarity, confidence) = distributions
            .iter()
            .zip(&weights)
            .fold((0.0, 0.0), |(pol, conf), (distribution, weight)| {
                (
                    pol + distribution.polarity() * weight,
                    conf + distribution.confidence() * weight,
                )
            });

        Ok((polarity, confidence))
    }
}
