//! Peer evaluation comment analysis: clause-aware sentiment, mark/comment
//! discrepancy detection, and misbehaviour classification over two injected
//! text models.

mod batch;
mod config;
pub mod discrepancy;
pub mod domain;
pub mod legacy_csv;
pub mod misbehaviour;
pub mod models;
pub mod sentiment;
mod service;
pub mod text;

#[cfg(test)]
mod tests;

pub use batch::{BatchEntry, BatchResult, BatchStatus, ErrorPlaceholder, PendingRecord};
pub use config::AnalysisThresholds;
pub use discrepancy::DiscrepancyResult;
pub use domain::{average_mark, normalized_mark, EvaluationRecord, RecordIdentifiers};
pub use misbehaviour::{MisbehaviourCategory, MisbehaviourResult, HYPOTHESIS_TEMPLATE};
pub use models::{
    InferenceSource, ModelError, SentimentDistribution, SentimentModel, ZeroShotClassifier,
    ZeroShotRanking,
};
pub use sentiment::SentimentResult;
pub use service::{AnalysisError, AnalysisResult, AnalysisService};
