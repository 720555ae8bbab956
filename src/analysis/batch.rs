use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::domain::{EvaluationRecord, RecordIdentifiers};
use super::models::{SentimentModel, ZeroShotClassifier};
use super::service::{AnalysisError, AnalysisResult, AnalysisService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    Error,
}

/// Stand-in for a record whose analysis failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPlaceholder {
    pub evaluation_id: Option<i64>,
    pub peer_id: Option<i64>,
    pub evaluator_id: Option<i64>,
    pub activity_id: Option<i64>,
    pub error: String,
    pub analysis_timestamp: i64,
}

impl ErrorPlaceholder {
    fn new(ids: RecordIdentifiers, error: &AnalysisError) -> Self {
        Self {
            evaluation_id: ids.evaluation_id,
            peer_id: ids.peer_id,
            evaluator_id: ids.evaluator_id,
            activity_id: ids.activity_id,
            error: error.to_string(),
            analysis_timestamp: Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchEntry {
    Analysis(Box<AnalysisResult>),
    Failed(ErrorPlaceholder),
}

impl BatchEntry {
    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            BatchEntry::Analysis(result) => Some(&**result),
            BatchEntry::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ErrorPlaceholder> {
        match self {
            BatchEntry::Analysis(_) => None,
            BatchEntry::Failed(placeholder) => Some(placeholder),
        }
    }
}

/// Envelope returned for every batch, including malformed input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub status: BatchStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<BatchEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

impl BatchResult {
    fn success(results: Vec<BatchEntry>) -> Self {
        Self {
            status: BatchStatus::Success,
            processed_count: Some(results.len()),
            results: Some(results),
            error: None,
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: BatchStatus::Error,
            results: None,
            processed_count: None,
            error: Some(message.into()),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn entries(&self) -> &[BatchEntry] {
        self.results.as_deref().unwrap_or_default()
    }
}

/// Input item before analysis: a decoded record, or the identifiers that
/// could be recovered from an item that failed to decode.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingRecord {
    Decoded(EvaluationRecord),
    Rejected(RecordIdentifiers, AnalysisError),
}

impl<S, Z> AnalysisService<S, Z>
where
    S: SentimentModel,
    Z: ZeroShotClassifier,
{
    /// Analyze records in order. A failing record becomes an error placeholder
    /// and the remaining records are still processed.
    pub fn process_batch(&self, records: &[EvaluationRecord]) -> BatchResult {
        let pending = records.iter().cloned().map(PendingRecord::Decoded);
        self.process_pending(pending)
    }

    /// Entry point for the platform's JSON payload: an array of records or a
    /// single record object. Any other shape yields an error envelope.
    pub fn process_json(&self, raw: &str) -> BatchResult {
        let payload: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "rejecting malformed analysis payload");
                return BatchResult::failure(format!("invalid JSON input: {err}"));
            }
        };

        match payload {
            Value::Array(items) => self.process_pending(items.into_iter().map(decode_element)),
            object @ Value::Object(_) => {
                self.process_pending(std::iter::once(decode_element(object)))
            }
            _ => BatchResult::failure("Invalid input format"),
        }
    }

    /// Same as [`process_batch`](Self::process_batch), for inputs where
    /// decoding may already have failed for some items.
    pub fn process_pending<I>(&self, pending: I) -> BatchResult
    where
        I: IntoIterator<Item = PendingRecord>,
    {
        let mut entries = Vec::new();
        let mut failures = 0usize;

        for item in pending {
            let outcome = match item {
                PendingRecord::Decoded(record) => self
                    .analyze(&record)
                    .map_err(|err| (record.identifiers(), err)),
                PendingRecord::Rejected(ids, err) => Err((ids, err)),
            };

            match outcome {
                Ok(result) => entries.push(BatchEntry::Analysis(Box::new(result))),
                Err((ids, err)) => {
                    warn!(
                        evaluation_id = ?ids.evaluation_id,
                        error = %err,
                        "evaluation analysis failed"
                    );
                    failures += 1;
                    entries.push(BatchEntry::Failed(ErrorPlaceholder::new(ids, &err)));
                }
            }
        }

        info!(processed = entries.len(), failures, "evaluation batch analyzed");
        BatchResult::success(entries)
    }
}

fn decode_element(value: Value) -> PendingRecord {
    if !value.is_object() {
        return PendingRecord::Rejected(
            RecordIdentifiers::default(),
            AnalysisError::InvalidRecord("expected a JSON object".to_string()),
        );
    }

    let ids = RecordIdentifiers::salvage(&value);
    match serde_json::from_value::<EvaluationRecord>(value) {
        Ok(record) => PendingRecord::Decoded(record),
        Err(err) => PendingRecord::Rejected(ids, AnalysisError::InvalidRecord(err.to_string())),
    }
}
