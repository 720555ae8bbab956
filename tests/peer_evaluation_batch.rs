use std::io::Cursor;
use std::sync::Arc;

use speval_ai::analysis::legacy_csv;
use speval_ai::analysis::{
    AnalysisService, AnalysisThresholds, BatchStatus, EvaluationRecord, MisbehaviourCategory,
    ModelError, SentimentDistribution, SentimentModel, ZeroShotClassifier, ZeroShotRanking,
};

/// Lexicon stand-in for the hosted sentiment model.
struct LexiconSentiment;

impl SentimentModel for LexiconSentiment {
    fn predict(&self, texts: &[String]) -> Result<Vec<SentimentDistribution>, ModelError> {
        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                if ["excellent", "helpful", "great"]
                    .iter()
                    .any(|word| lower.contains(word))
                {
                    SentimentDistribution::new(0.01, 0.04, 0.95)
                } else if ["missed", "ignored", "copied"]
                    .iter()
                    .any(|word| lower.contains(word))
                {
                    SentimentDistribution::new(0.85, 0.1, 0.05)
                } else {
                    SentimentDistribution::new(0.1, 0.8, 0.1)
                }
            })
            .collect())
    }
}

/// Ranks the candidate matching an obvious keyword first.
struct KeywordBehaviour;

impl ZeroShotClassifier for KeywordBehaviour {
    fn classify(
        &self,
        text: &str,
        candidate_labels: &[&str],
        hypothesis_template: &str,
    ) -> Result<ZeroShotRanking, ModelError> {
        assert_eq!(hypothesis_template, "In a team project, this behaviour is {}.");
        assert_eq!(candidate_labels.len(), 6);

        let lower = text.to_lowercase();
        let winner = if lower.contains("copied") {
            MisbehaviourCategory::Dishonest
        } else if lower.contains("ignored") {
            MisbehaviourCategory::Uncooperative
        } else {
            MisbehaviourCategory::Normal
        };

        let mut labels = vec![winner.candidate_phrase().to_string()];
        labels.extend(
            candidate_labels
                .iter()
                .filter(|label| **label != winner.candidate_phrase())
                .map(|label| label.to_string()),
        );
        let mut scores = vec![0.75];
        scores.resize(labels.len(), 0.05);
        Ok(ZeroShotRanking { labels, scores })
    }
}

fn analyzer() -> AnalysisService<LexiconSentiment, KeywordBehaviour> {
    AnalysisService::new(
        Arc::new(LexiconSentiment),
        Arc::new(KeywordBehaviour),
        AnalysisThresholds::default(),
    )
}

#[test]
fn excellent_teammate_with_top_marks_is_clean() {
    let payload = r#"{
        "id": 1, "userid": 2, "peerid": 3, "spevalid": 4,
        "criteria1": 5, "criteria2": 5, "criteria3": 5, "criteria4": 5, "criteria5": 5,
        "comment1": "Excellent teammate, always helpful"
    }"#;

    let batch = analyzer().process_json(payload);

    assert_eq!(batch.status, BatchStatus::Success);
    let result = batch.entries()[0]
        .analysis()
        .expect("record analyzed");
    assert_eq!(result.average_mark, 5.0);
    assert_eq!(result.normalized_mark, 1.0);
    assert!(!result.misbehaviour_detected);
    assert!(!result.comment_discrepancy_detected);
    assert_eq!(result.explanation, "No issues detected");
}

#[test]
fn mixed_batch_reports_each_finding_in_order() {
    let records = vec![
        EvaluationRecord {
            evaluation_id: Some(10),
            comment: Some("Copied my report section".to_string()),
            criteria1: Some(5.0),
            criteria2: Some(5.0),
            ..EvaluationRecord::default()
        },
        EvaluationRecord {
            evaluation_id: Some(11),
            comment: Some("Ignored every message we sent".to_string()),
            criteria1: Some(2.0),
            ..EvaluationRecord::default()
        },
        EvaluationRecord {
            evaluation_id: Some(12),
            comment: Some("Great ideas".to_string()),
            criteria1: Some(f64::NAN),
            ..EvaluationRecord::default()
        },
    ];

    let batch = analyzer().process_batch(&records);
    let entries = batch.entries();
    assert_eq!(batch.processed_count, Some(3));

    let dishonest = entries[0].analysis().expect("first analyzed");
    assert!(dishonest.misbehaviour_detected);
    assert_eq!(dishonest.misbehaviour_category_index, 6);
    assert!(dishonest.comment_discrepancy_detected);
    assert!(dishonest.explanation.contains("; "));

    let uncooperative = entries[1].analysis().expect("second analyzed");
    assert!(uncooperative.misbehaviour_detected);
    assert_eq!(uncooperative.misbehaviour_category_index, 3);
    assert!(!uncooperative.comment_discrepancy_detected);

    let rejected = entries[2].failure().expect("third rejected");
    assert_eq!(rejected.evaluation_id, Some(12));
    assert!(rejected.error.contains("not a finite number"));
}

#[test]
fn legacy_csv_flow_produces_flag_table() {
    let export = "id,userid,peerid,comment1,criteria1,criteria2\n\
                  1,2,3,Excellent teammate,5,5\n\
                  2,3,4,Copied my code,5,4\n";
    let mut output = Vec::new();

    let rows = legacy_csv::analyze_csv(&analyzer(), Cursor::new(export), &mut output, 9)
        .expect("csv flow succeeds");

    assert_eq!(rows, 2);
    let text = String::from_utf8(output).expect("utf8 output");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "id,spevalid,misbehaviourflag,markdiscrepancyflag,commentdiscrepancyflag,notes,timecreated"
    );
    assert!(lines[1].starts_with("1,9,false,false,false,No issues detected,"));
    assert!(lines[2].starts_with("2,9,true,false,true,"));
}
