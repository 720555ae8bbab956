use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::analysis::{
    AnalysisService, AnalysisThresholds, EvaluationRecord, MisbehaviourCategory, ModelError,
    SentimentDistribution, SentimentModel, ZeroShotClassifier, ZeroShotRanking,
};

pub(super) const POSITIVE: SentimentDistribution = SentimentDistribution {
    negative: 0.02,
    neutral: 0.08,
    positive: 0.9,
};
pub(super) const NEGATIVE: SentimentDistribution = SentimentDistribution {
    negative: 0.9,
    neutral: 0.08,
    positive: 0.02,
};
pub(super) const NEUTRAL: SentimentDistribution = SentimentDistribution {
    negative: 0.1,
    neutral: 0.8,
    positive: 0.1,
};

/// Scores clauses by keyword so tests can reason about clause weighting.
#[derive(Default)]
pub(super) struct KeywordSentiment {
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<String>>>,
}

impl KeywordSentiment {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn seen(&self) -> Vec<Vec<String>> {
        self.seen.lock().expect("sentiment mutex poisoned").clone()
    }
}

impl SentimentModel for KeywordSentiment {
    fn predict(&self, texts: &[String]) -> Result<Vec<SentimentDistribution>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("sentiment mutex poisoned")
            .push(texts.to_vec());

        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                let negative = ["missed", "rude", "never", "late", "ignored"]
                    .iter()
                    .any(|word| lower.contains(word));
                let positive = ["great", "excellent", "helpful", "good"]
                    .iter()
                    .any(|word| lower.contains(word));
                match (positive, negative) {
                    (_, true) => NEGATIVE,
                    (true, false) => POSITIVE,
                    (false, false) => NEUTRAL,
                }
            })
            .collect())
    }
}

/// Returns the configured distributions regardless of input.
pub(super) struct FixedSentiment(pub(super) Vec<SentimentDistribution>);

impl SentimentModel for FixedSentiment {
    fn predict(&self, _texts: &[String]) -> Result<Vec<SentimentDistribution>, ModelError> {
        Ok(self.0.clone())
    }
}

pub(super) struct FailingSentiment;

impl SentimentModel for FailingSentiment {
    fn predict(&self, _texts: &[String]) -> Result<Vec<SentimentDistribution>, ModelError> {
        Err(ModelError::Transport("connection refused".to_string()))
    }
}

/// Always ranks `label` first with `score`.
pub(super) struct FixedZeroShot {
    label: String,
    score: f64,
    calls: AtomicUsize,
}

impl FixedZeroShot {
    pub(super) fn category(category: MisbehaviourCategory, score: f64) -> Self {
        Self::phrase(category.candidate_phrase(), score)
    }

    pub(super) fn phrase(label: &str, score: f64) -> Self {
        Self {
            label: label.to_string(),
            score,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ZeroShotClassifier for FixedZeroShot {
    fn classify(
        &self,
        _text: &str,
        candidate_labels: &[&str],
        _hypothesis_template: &str,
    ) -> Result<ZeroShotRanking, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut labels = vec![self.label.clone()];
        labels.extend(
            candidate_labels
                .iter()
                .filter(|candidate| **candidate != self.label)
                .map(|candidate| candidate.to_string()),
        );
        let remainder = (1.0 - self.score) / (labels.len() - 1).max(1) as f64;
        let mut scores = vec![self.score];
        scores.resize(labels.len(), remainder);
        Ok(ZeroShotRanking { labels, scores })
    }
}

pub(super) struct FailingZeroShot;

impl ZeroShotClassifier for FailingZeroShot {
    fn classify(
        &self,
        _text: &str,
        _candidate_labels: &[&str],
        _hypothesis_template: &str,
    ) -> Result<ZeroShotRanking, ModelError> {
        Err(ModelError::Status {
            status: 503,
            body: "model loading".to_string(),
        })
    }
}

/// Picks a category from obvious keywords, defaulting to normal behaviour.
pub(super) struct KeywordZeroShot;

impl ZeroShotClassifier for KeywordZeroShot {
    fn classify(
        &self,
        text: &str,
        _candidate_labels: &[&str],
        _hypothesis_template: &str,
    ) -> Result<ZeroShotRanking, ModelError> {
        let lower = text.to_lowercase();
        let (category, score) = if lower.contains("yelled") || lower.contains("rude") {
            (MisbehaviourCategory::Aggressive, 0.82)
        } else if lower.contains("deadline") {
            (MisbehaviourCategory::Irresponsible, 0.64)
        } else {
            (MisbehaviourCategory::Normal, 0.91)
        };
        Ok(ZeroShotRanking {
            labels: vec![category.candidate_phrase().to_string()],
            scores: vec![score],
        })
    }
}

pub(super) fn service<S, Z>(sentiment: S, zero_shot: Z) -> AnalysisService<S, Z>
where
    S: SentimentModel,
    Z: ZeroShotClassifier,
{
    AnalysisService::new(
        Arc::new(sentiment),
        Arc::new(zero_shot),
        AnalysisThresholds::default(),
    )
}

pub(super) fn record(id: i64, comment: &str, criteria: [Option<f64>; 5]) -> EvaluationRecord {
    EvaluationRecord {
        evaluation_id: Some(id),
        peer_id: Some(100 + id),
        evaluator_id: Some(200 + id),
        activity_id: Some(7),
        comment: Some(comment.to_string()),
        timecreated: Some(1_700_000_000),
        criteria1: criteria[0],
        criteria2: criteria[1],
        criteria3: criteria[2],
        criteria4: criteria[3],
        criteria5: criteria[4],
    }
}

pub(super) fn uniform(score: f64) -> [Option<f64>; 5] {
    [Some(score); 5]
}
