use crate::workflows::pip::{EmployeeId, Observation};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::io::Read;

use super::ScoreImportError;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub(crate) fn parse_observations<R: Read>(reader: R) -> Result<Vec<Observation>, ScoreImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut observations = Vec::new();

    for (index, record) in csv_reader.deserialize::<ScoreRow>().enumerate() {
        let row = record?;
        // Header is line 1.
        let line = index + 2;
        let timestamp = parse_timestamp(&row.date).ok_or_else(|| ScoreImportError::Timestamp {
            line,
            value: row.date.clone(),
        })?;
        let employee_id = row.employee_id.trim();
        if employee_id.is_empty() {
            return Err(ScoreImportError::MissingEmployee { line });
        }

        observations.push(Observation {
            employee_id: EmployeeId::new(employee_id),
            score: row.score,
            timestamp,
        });
    }

    Ok(observations)
}

#[derive(Debug, Deserialize)]
struct ScoreRow {
    employee_id: String,
    score: f64,
    #[serde(alias = "timestamp")]
    date: String,
}

/// Parse RFC 3339, `YYYY-MM-DD[ T]HH:MM:SS[.f]`, or a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}
