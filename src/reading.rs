use crate::timefmt::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Raw values arrive in milli-units of the measured quantity.
pub const RAW_SCALE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl Reading {
    pub fn from_raw(timestamp: DateTime<Utc>, raw: i64) -> Self {
        Self {
            timestamp,
            value: raw as f64 / RAW_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("missing value field")]
    MissingValue,
    #[error("value field {0:?} is not an integer")]
    InvalidValue(String),
    #[error("timestamp field {0:?} is not a date-time")]
    InvalidTimestamp(String),
}

/// Parses one `timestamp,rawValue` record. The line is split on its first
/// comma only, so anything after it belongs to the value field.
pub fn parse_line(line: &str) -> Result<Reading, LineError> {
    let (ts_field, value_field) = line.split_once(',').ok_or(LineError::MissingValue)?;

    let raw = value_field
        .trim()
        .parse::<i64>()
        .map_err(|_| LineError::InvalidValue(value_field.to_string()))?;
    let timestamp = parse_timestamp(ts_field)
        .ok_or_else(|| LineError::InvalidTimestamp(ts_field.to_string()))?;

    Ok(Reading::from_raw(timestamp, raw))
}

/// Yields every non-empty line of a response body with its parse outcome.
pub fn parse_body(body: &str) -> impl Iterator<Item = (&str, Result<Reading, LineError>)> {
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(|line| (line, parse_line(line)))
}
