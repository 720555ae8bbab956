//! Flat-file flow kept for the platform's original CSV export/import.

use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use super::batch::{BatchEntry, BatchResult, PendingRecord};
use super::domain::{EvaluationRecord, RecordIdentifiers};
use super::models::{SentimentModel, ZeroShotClassifier};
use super::service::{AnalysisError, AnalysisService};

/// Activity id applied when an export carries none.
pub const DEFAULT_ACTIVITY_ID: i64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum LegacyCsvError {
    #[error("failed to access CSV file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid evaluation CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("analysis returned no results: {0}")]
    Batch(String),
}

#[derive(Debug, Serialize)]
struct FlagRow<'a> {
    id: Option<i64>,
    spevalid: Option<i64>,
    misbehaviourflag: bool,
    markdiscrepancyflag: bool,
    commentdiscrepancyflag: bool,
    notes: &'a str,
    timecreated: i64,
}

/// Reads an evaluation export. A row that cannot be decoded is kept as a
/// rejected entry so it still gets a flag row. When no row names an activity,
/// every row is assigned `fallback_activity_id`.
pub fn read_records<R: Read>(
    reader: R,
    fallback_activity_id: i64,
) -> Result<Vec<PendingRecord>, LegacyCsvError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let pending = match row.deserialize::<EvaluationRecord>(Some(&headers)) {
            Ok(record) => PendingRecord::Decoded(record),
            Err(err) => PendingRecord::Rejected(
                salvage_row(&headers, &row),
                AnalysisError::InvalidRecord(err.to_string()),
            ),
        };
        rows.push(pending);
    }

    if rows.iter().all(|row| activity_id(row).is_none()) {
        for row in &mut rows {
            match row {
                PendingRecord::Decoded(record) => record.activity_id = Some(fallback_activity_id),
                PendingRecord::Rejected(ids, _) => ids.activity_id = Some(fallback_activity_id),
            }
        }
    }

    Ok(rows)
}

fn activity_id(row: &PendingRecord) -> Option<i64> {
    match row {
        PendingRecord::Decoded(record) => record.activity_id,
        PendingRecord::Rejected(ids, _) => ids.activity_id,
    }
}

fn salvage_row(headers: &csv::StringRecord, row: &csv::StringRecord) -> RecordIdentifiers {
    let fields: serde_json::Map<String, serde_json::Value> = headers
        .iter()
        .zip(row.iter())
        .map(|(name, value)| (name.to_string(), serde_json::Value::from(value)))
        .collect();
    RecordIdentifiers::salvage(&serde_json::Value::Object(fields))
}

/// Writes one flag row per batch entry, preserving order.
pub fn write_flags<W: Write>(writer: W, batch: &BatchResult) -> Result<usize, LegacyCsvError> {
    if let Some(message) = &batch.error {
        return Err(LegacyCsvError::Batch(message.clone()));
    }

    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in batch.entries() {
        let row = match entry {
            BatchEntry::Analysis(result) => FlagRow {
                id: result.evaluation_id,
                spevalid: result.activity_id,
                misbehaviourflag: result.misbehaviour_detected,
                markdiscrepancyflag: result.mark_discrepancy_detected,
                commentdiscrepancyflag: result.comment_discrepancy_detected,
                notes: &result.explanation,
                timecreated: result.analysis_timestamp,
            },
            BatchEntry::Failed(placeholder) => FlagRow {
                id: placeholder.evaluation_id,
                spevalid: placeholder.activity_id,
                misbehaviourflag: false,
                markdiscrepancyflag: false,
                commentdiscrepancyflag: false,
                notes: &placeholder.error,
                timecreated: placeholder.analysis_timestamp,
            },
        };
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;

    Ok(batch.entries().len())
}

pub fn analyze_csv<S, Z, R, W>(
    service: &AnalysisService<S, Z>,
    reader: R,
    writer: W,
    fallback_activity_id: i64,
) -> Result<usize, LegacyCsvError>
where
    S: SentimentModel,
    Z: ZeroShotClassifier,
    R: Read,
    W: Write,
{
    let rows = read_records(reader, fallback_activity_id)?;
    let batch = service.process_pending(rows);
    write_flags(writer, &batch)
}

pub fn analyze_csv_file<S, Z>(
    service: &AnalysisService<S, Z>,
    input: &Path,
    output: &Path,
    fallback_activity_id: i64,
) -> Result<usize, LegacyCsvError>
where
    S: SentimentModel,
    Z: ZeroShotClassifier,
{
    let reader = std::fs::File::open(input)?;
    let writer = std::fs::File::create(output)?;
    let rows = analyze_csv(service, reader, writer, fallback_activity_id)?;
    info!(rows, output = %output.display(), "legacy flag table written");
    Ok(rows)
}
