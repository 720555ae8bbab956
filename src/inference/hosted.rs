use std::time::Instant;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::analysis::{
    ModelError, SentimentDistribution, SentimentModel, ZeroShotClassifier, ZeroShotRanking,
};
use crate::config::InferenceConfig;

/// Blocking client for a Hugging Face style inference API. One instance serves
/// both the sentiment and the zero-shot model.
pub struct HostedInference {
    client: Client,
    base_url: String,
    token: Option<String>,
    sentiment_model: String,
    zero_shot_model: String,
}

impl HostedInference {
    pub fn new(config: &InferenceConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .user_agent(concat!("speval-ai/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| ModelError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            sentiment_model: config.sentiment_model.clone(),
            zero_shot_model: config.zero_shot_model.clone(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/{}", self.base_url, model)
    }

    fn post(&self, model: &str, body: serde_json::Value) -> Result<String, ModelError> {
        let started = Instant::now();
        let mut request = self.client.post(self.endpoint(model)).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|err| ModelError::Transport(err.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|err| ModelError::Transport(err.to_string()))?;

        debug!(
            model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "inference call finished"
        );

        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

impl SentimentModel for HostedInference {
    fn predict(&self, texts: &[String]) -> Result<Vec<SentimentDistribution>, ModelError> {
        let body = json!({
            "inputs": texts,
            "parameters": { "top_k": 3 },
            "options": { "wait_for_model": true },
        });
        let raw = self.post(&self.sentiment_model, body)?;
        parse_sentiment(&raw)
    }
}

impl ZeroShotClassifier for HostedInference {
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
        hypothesis_template: &str,
    ) -> Result<ZeroShotRanking, ModelError> {
        let body = json!({
            "inputs": text,
            "parameters": {
                "candidate_labels": candidate_labels,
                "hypothesis_template": hypothesis_template,
                "multi_label": false,
            },
            "options": { "wait_for_model": true },
        });
        let raw = self.post(&self.zero_shot_model, body)?;
        parse_zero_shot(&raw)
    }
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SentimentPayload {
    Batched(Vec<Vec<LabelScore>>),
    Single(Vec<LabelScore>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ZeroShotPayload {
    Ranked { labels: Vec<String>, scores: Vec<f64> },
    Pairs(Vec<LabelScore>),
}

fn parse_sentiment(raw: &str) -> Result<Vec<SentimentDistribution>, ModelError> {
    let payload: SentimentPayload =
        serde_json::from_str(raw).map_err(|err| ModelError::Payload(err.to_string()))?;

    let groups = match payload {
        SentimentPayload::Batched(groups) => groups,
        SentimentPayload::Single(scores) => vec![scores],
    };

    Ok(groups
        .iter()
        .map(|scores| {
            SentimentDistribution::from_labels(
                scores.iter().map(|entry| (entry.label.as_str(), entry.score)),
            )
        })
        .collect())
}

fn parse_zero_shot(raw: &str) -> Result<ZeroShotRanking, ModelError> {
    let payload: ZeroShotPayload =
        serde_json::from_str(raw).map_err(|err| ModelError::Payload(err.to_string()))?;

    let (labels, scores) = match payload {
        ZeroShotPayload::Ranked { labels, scores } => (labels, scores),
        ZeroShotPayload::Pairs(mut pairs) => {
            pairs.sort_by(|a, b| b.score.total_cmp(&a.score));
            pairs
                .into_iter()
                .map(|entry| (entry.label, entry.score))
                .unzip()
        }
    };

    if labels.len() != scores.len() {
        return Err(ModelError::Payload(format!(
            "{} labels but {} scores",
            labels.len(),
            scores.len()
        )));
    }
    Ok(ZeroShotRanking { labels, scores })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_batched_sentiment_payload() {
        let raw = r#"[
            [{"label": "positive", "score": 0.9}, {"label": "neutral", "score": 0.08}, {"label": "negative", "score": 0.02}],
            [{"label": "negative", "score": 0.7}, {"label": "neutral", "score": 0.2}, {"label": "positive", "score": 0.1}]
        ]"#;

        let distributions = parse_sentiment(raw).expect("payload parses");

        assert_eq!(distributions.len(), 2);
        assert_eq!(distributions[0], SentimentDistribution::new(0.02, 0.08, 0.9));
        assert_eq!(distributions[1], SentimentDistribution::new(0.7, 0.2, 0.1));
    }

    #[test]
    fn parses_flat_sentiment_payload_as_single_input() {
        let raw = r#"[{"label": "Neutral", "score": 0.6}, {"label": "Positive", "score": 0.4}]"#;

        let distributions = parse_sentiment(raw).expect("payload parses");

        assert_eq!(distributions, vec![SentimentDistribution::new(0.0, 0.6, 0.4)]);
    }

    #[test]
    fn parses_ranked_zero_shot_payload() {
        let raw = r#"{"sequence": "x", "labels": ["b", "a"], "scores": [0.8, 0.2]}"#;

        let ranking = parse_zero_shot(raw).expect("payload parses");

        assert_eq!(ranking.top(), Some(("b", 0.8)));
    }

    #[test]
    fn sorts_pair_zero_shot_payload() {
        let raw = r#"[{"label": "a", "score": 0.1}, {"label": "b", "score": 0.7}, {"label": "c", "score": 0.2}]"#;

        let ranking = parse_zero_shot(raw).expect("payload parses");

        assert_eq!(ranking.labels, vec!["b", "c", "a"]);
        assert_eq!(ranking.scores, vec![0.7, 0.2, 0.1]);
    }

    #[test]
    fn rejects_mismatched_zero_shot_payload() {
        let raw = r#"{"labels": ["a", "b"], "scores": [1.0]}"#;
        assert!(matches!(parse_zero_shot(raw), Err(ModelError::Payload(_))));
    }

    #[test]
    fn rejects_error_objects() {
        let raw = r#"{"error": "Model is currently loading"}"#;
        assert!(matches!(parse_sentiment(raw), Err(ModelError::Payload(_))));
        assert!(matches!(parse_zero_shot(raw), Err(ModelError::Payload(_))));
    }
}
