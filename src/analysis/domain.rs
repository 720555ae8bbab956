use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Neutral mark used when a record carries no criteria scores.
pub const NEUTRAL_MARK: f64 = 3.0;

/// One peer evaluation as exported by the course platform.
///
/// Field names follow the platform's column names so JSON payloads and CSV
/// exports deserialize without a mapping layer. Numeric fields are lenient:
/// numbers, numeric strings, `null` and empty strings are all accepted. The
/// comment is taken verbatim as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(rename = "id", default, deserialize_with = "lenient_id")]
    pub evaluation_id: Option<i64>,
    #[serde(rename = "peerid", default, deserialize_with = "lenient_id")]
    pub peer_id: Option<i64>,
    #[serde(rename = "userid", default, deserialize_with = "lenient_id")]
    pub evaluator_id: Option<i64>,
    #[serde(rename = "spevalid", default, deserialize_with = "lenient_id")]
    pub activity_id: Option<i64>,
    #[serde(rename = "comment1", default, deserialize_with = "empty_string_as_none")]
    pub comment: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub timecreated: Option<i64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub criteria1: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub criteria2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub criteria3: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub criteria4: Option<f64>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub criteria5: Option<f64>,
}

impl EvaluationRecord {
    pub fn criteria(&self) -> [Option<f64>; 5] {
        [
            self.criteria1,
            self.criteria2,
            self.criteria3,
            self.criteria4,
            self.criteria5,
        ]
    }

    pub fn identifiers(&self) -> RecordIdentifiers {
        RecordIdentifiers {
            evaluation_id: self.evaluation_id,
            peer_id: self.peer_id,
            evaluator_id: self.evaluator_id,
            activity_id: self.activity_id,
        }
    }

    /// Mean of the criteria that are present, or [`NEUTRAL_MARK`] when none are.
    pub fn average_mark(&self) -> f64 {
        average_mark(&self.criteria())
    }
}

/// Identifiers carried through to results and error placeholders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordIdentifiers {
    pub evaluation_id: Option<i64>,
    pub peer_id: Option<i64>,
    pub evaluator_id: Option<i64>,
    pub activity_id: Option<i64>,
}

impl RecordIdentifiers {
    /// Best-effort extraction from a payload element that failed to decode.
    pub fn salvage(value: &serde_json::Value) -> Self {
        let field = |name: &str| value.get(name).and_then(id_from_value);
        Self {
            evaluation_id: field("id"),
            peer_id: field("peerid"),
            evaluator_id: field("userid"),
            activity_id: field("spevalid"),
        }
    }
}

pub fn average_mark(criteria: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = criteria.iter().flatten().copied().collect();
    if present.is_empty() {
        return NEUTRAL_MARK;
    }
    present.iter().sum::<f64>() / present.len() as f64
}

/// Rescales a 1–5 mark onto the [-1, 1] polarity scale.
pub fn normalized_mark(mark: f64) -> f64 {
    (mark - NEUTRAL_MARK) / 2.0
}

fn id_from_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|v| v.fract() == 0.0).map(|v| v as i64)),
        serde_json::Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

enum Lenient {
    Missing,
    Number(f64),
    Text(String),
}

struct LenientVisitor;

impl<'de> Visitor<'de> for LenientVisitor {
    type Value = Lenient;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a string, or null")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Lenient, E> {
        Ok(Lenient::Number(v as f64))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Lenient, E> {
        Ok(Lenient::Number(v as f64))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Lenient, E> {
        Ok(Lenient::Number(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Lenient, E> {
        Ok(Lenient::Text(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Lenient, E> {
        if v.trim().is_empty() {
            Ok(Lenient::Missing)
        } else {
            Ok(Lenient::Text(v.to_string()))
        }
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Lenient, E> {
        if v.trim().is_empty() {
            Ok(Lenient::Missing)
        } else {
            Ok(Lenient::Text(v))
        }
    }

    fn visit_none<E: de::Error>(self) -> Result<Lenient, E> {
        Ok(Lenient::Missing)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Lenient, E> {
        Ok(Lenient::Missing)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Lenient, D::Error> {
        deserializer.deserialize_any(LenientVisitor)
    }
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match deserializer.deserialize_any(LenientVisitor)? {
        Lenient::Missing => Ok(None),
        Lenient::Number(value) if value.fract() == 0.0 => Ok(Some(value as i64)),
        Lenient::Number(value) => Err(de::Error::custom(format!(
            "identifier {value} is not an integer"
        ))),
        Lenient::Text(text) => text
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("identifier '{text}' is not an integer"))),
    }
}

/// Non-numeric criteria text counts as missing, matching the platform's export
/// where unanswered criteria appear as placeholders.
fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match deserializer.deserialize_any(LenientVisitor)? {
        Lenient::Missing => None,
        Lenient::Number(value) => Some(value).filter(|v| v.is_finite()),
        Lenient::Text(text) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
    })
}

/// Reads the comment as raw text so CSV type inference never reformats it.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
