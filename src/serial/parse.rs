use crate::error::ParseError;
use crate::models::sensor::SensorType;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct ParsedRecord {
    pub key: SensorType,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Parses one decoded line of the form `<sensorKey><delimiter><numericValue>`.
///
/// Readings are stamped on receipt, the device clock is not trusted.
pub fn parse_record(line: &str, delimiter: char) -> Result<ParsedRecord, ParseError> {
    let parts: Vec<&str> = line.split(delimiter).collect();
    if parts.len() != 2 {
        return Err(ParseError::MalformedLine(line.to_owned()));
    }

    let key: SensorType = parts[0].trim().parse()?;
    let raw_value = parts[1].trim();
    let value: f64 = raw_value
        .parse()
        .map_err(|_| ParseError::NonNumericValue(raw_value.to_owned()))?;
    if !value.is_finite() {
        return Err(ParseError::NonNumericValue(raw_value.to_owned()));
    }

    Ok(ParsedRecord {
        key,
        value,
        timestamp: Utc::now(),
    })
}
