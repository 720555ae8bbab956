use serde::Serialize;

/// Probability mass a sentiment model assigns to each polarity class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SentimentDistribution {
    pub negative: f64,
    pub neutral: f64,
    pub positive: f64,
}

impl SentimentDistribution {
    pub fn new(negative: f64, neutral: f64, positive: f64) -> Self {
        Self {
            negative,
            neutral,
            positive,
        }
    }

    /// Builds a distribution from `(label, score)` pairs. Labels are matched
    /// case-insensitively and unknown labels are ignored.
    pub fn from_labels<'a, I>(scores: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut distribution = Self::default();
        for (label, score) in scores {
            match label.trim().to_ascii_lowercase().as_str() {
                "negative" => distribution.negative = score,
                "neutral" => distribution.neutral = score,
                "positive" => distribution.positive = score,
                _ => {}
            }
        }
        distribution
    }

    pub fn polarity(&self) -> f64 {
        self.positive - self.negative
    }

    pub fn confidence(&self) -> f64 {
        self.negative.max(self.neutral).max(self.positive)
    }
}

/// Candidate phrases re-ranked by a zero-shot classifier, best first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ZeroShotRanking {
    pub labels: Vec<String>,
    pub scores: Vec<f64>,
}

impl ZeroShotRanking {
    pub fn top(&self) -> Option<(&str, f64)> {
        let label = self.labels.first()?;
        let score = self.scores.first()?;
        Some((label.as_str(), *score))
    }
}

/// Sentiment model contract: one distribution per input text, in order.
pub trait SentimentModel: Send + Sync {
    fn predict(&self, texts: &[String]) -> Result<Vec<SentimentDistribution>, ModelError>;
}

/// Zero-shot text classifier contract.
pub trait ZeroShotClassifier: Send + Sync {
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
        hypothesis_template: &str,
    ) -> Result<ZeroShotRanking, ModelError>;
}

/// Error raised by a model adapter.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("inference request failed: {0}")]
    Transport(String),
    #[error("inference endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected inference payload: {0}")]
    Payload(String),
    #[error("model returned no predictions")]
    EmptyResponse,
    #[error("model returned unrecognised label '{0}'")]
    UnknownLabel(String),
}

/// Where a sentiment or misbehaviour reading came from, so callers can tell a
/// genuine neutral prediction from a substituted one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InferenceSource {
    Model,
    EmptyText,
    Fallback { reason: String },
}

impl InferenceSource {
    pub fn fallback(error: &ModelError) -> Self {
        Self::Fallback {
            reason: error.to_string(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}
