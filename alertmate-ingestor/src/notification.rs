//! Validation of ingested notifications.
//!
//! Only `id` is required. Everything else is optional so that producers other
//! than alertmate devices can post minimal records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Epoch values above this magnitude are read as milliseconds, not seconds.
const MILLIS_THRESHOLD: f64 = 2e10;

/// Offset-less datetime layouts, read as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// A validated notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// Unique notification id
    pub id: String,
    /// Source system
    pub source: Option<String>,
    /// Notification type
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Event timestamp, serialized as RFC 3339
    pub timestamp: Option<DateTime<Utc>>,
    /// Arbitrary payload
    pub payload: Map<String, Value>,
}

/// One validation failure, reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Path of the offending field (empty for the body itself)
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl FieldError {
    fn new(field: Option<&str>, kind: &'static str, msg: &str) -> Self {
        Self {
            loc: field.map(|f| vec![f.to_string()]).unwrap_or_default(),
            msg: msg.to_string(),
            kind,
        }
    }
}

impl Notification {
    /// Validate a parsed JSON body, collecting every field error.
    pub fn validate(body: &Value) -> Result<Self, Vec<FieldError>> {
        let Some(obj) = body.as_object() else {
            return Err(vec![FieldError::new(
                None,
                "model_type",
                "Input should be a valid object",
            )]);
        };

        let mut errors = Vec::new();

        let id = match obj.get("id") {
            Some(Value::String(id)) => Some(id.clone()),
            None => {
                errors.push(FieldError::new(Some("id"), "missing", "Field required"));
                None
            }
            Some(_) => {
                errors.push(FieldError::new(
                    Some("id"),
                    "string_type",
                    "Input should be a valid string",
                ));
                None
            }
        };

        let source = optional_string(obj, "source", &mut errors);
        let kind = optional_string(obj, "type", &mut errors);

        let timestamp = match obj.get("timestamp") {
            None | Some(Value::Null) => None,
            Some(value) => match parse_timestamp(value) {
                Some(ts) => Some(ts),
                None => {
                    errors.push(FieldError::new(
                        Some("timestamp"),
                        "datetime_parsing",
                        "Input should be a valid datetime",
                    ));
                    None
                }
            },
        };

        let payload = match obj.get("payload") {
            None => Map::new(),
            Some(Value::Object(payload)) => payload.clone(),
            Some(_) => {
                errors.push(FieldError::new(
                    Some("payload"),
                    "dict_type",
                    "Input should be a valid dictionary",
                ));
                Map::new()
            }
        };

        match id {
            Some(id) if errors.is_empty() => Ok(Notification {
                id,
                source,
                kind,
                timestamp,
                payload,
            }),
            _ => Err(errors),
        }
    }

    /// Normalized record as logged on acceptance
    pub fn record(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::new(
                Some(field),
                "string_type",
                "Input should be a valid string",
            ));
            None
        }
    }
}

/// Accepts epoch numbers (seconds, or milliseconds above 2e10), numeric
/// strings, RFC 3339 strings, and ISO 8601 datetimes or dates without an
/// offset (read as UTC).
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_f64().and_then(from_epoch),
        Value::String(s) => parse_datetime_str(s.trim()),
        _ => None,
    }
}

fn parse_datetime_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        });
    if let Some(naive) = naive {
        return Some(Utc.from_utc_datetime(&naive));
    }

    s.parse::<f64>().ok().and_then(from_epoch)
}

fn from_epoch(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() > MILLIS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}
