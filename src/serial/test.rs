use super::line::LineReader;
use super::parse::parse_record;
use crate::error::{ParseError, SerialError};
use crate::models::sensor::SensorType;

use std::time::Duration;
use tokio::io::{duplex, AsyncWriteExt};

/*
 * Line reader
 */

#[tokio::test]
async fn test_line_reassembly_across_chunks() {
    // Prepare
    let (mut tx, rx) = duplex(64);
    let mut reader = LineReader::with_timeout(rx, Duration::from_millis(200));

    // Execute
    tx.write_all(b"tempera").await.unwrap();
    tx.write_all(b"ture:21.5\nhumi").await.unwrap();
    let first = reader.next_line().await.unwrap();
    tx.write_all(b"dity:40\r\n").await.unwrap();
    let second = reader.next_line().await.unwrap();

    // Validate
    assert_eq!(first, Some("temperature:21.5".to_owned()));
    assert_eq!(second, Some("humidity:40".to_owned()));
}

#[tokio::test]
async fn test_line_read_timeout_yields_none() {
    // Prepare
    let (_tx, rx) = duplex(64);
    let mut reader = LineReader::with_timeout(rx, Duration::from_millis(50));

    // Execute
    let line = reader.next_line().await.unwrap();

    // Validate
    assert_eq!(line, None);
}

#[tokio::test]
async fn test_line_invalid_bytes_replaced() {
    // Prepare
    let (mut tx, rx) = duplex(64);
    let mut reader = LineReader::with_timeout(rx, Duration::from_millis(200));

    // Execute
    tx.write_all(b"temp\xff:1\n").await.unwrap();
    let line = reader.next_line().await.unwrap();

    // Validate
    assert_eq!(line, Some("temp\u{FFFD}:1".to_owned()));
}

#[tokio::test]
async fn test_line_eof_is_stream_error() {
    // Prepare
    let (mut tx, rx) = duplex(64);
    let mut reader = LineReader::with_timeout(rx, Duration::from_millis(200));

    // Execute
    tx.write_all(b"partial").await.unwrap();
    drop(tx);
    let res = reader.next_line().await;

    // Validate - the truncated tail is never emitted
    assert!(matches!(res, Err(SerialError::Eof)));
}

/*
 * Record parser
 */

#[test]
fn test_parse_valid_record() {
    let record = parse_record("temperature:21.5", ':').unwrap();

    assert_eq!(record.key, SensorType::Temperature);
    assert_eq!(record.value, 21.5);
}

#[test]
fn test_parse_value_fidelity() {
    assert_eq!(parse_record("co2:442", ':').unwrap().value, 442.0);
    assert_eq!(parse_record("pressure:1013.25", ':').unwrap().value, 1013.25);
    assert_eq!(parse_record("temperature:-4.5", ':').unwrap().value, -4.5);
}

#[test]
fn test_parse_key_case_insensitive() {
    assert_eq!(
        parse_record("Temperature:1.0", ':').unwrap().key,
        SensorType::Temperature
    );
    assert_eq!(
        parse_record("SOIL_MOISTURE:55", ':').unwrap().key,
        SensorType::SoilMoisture
    );
}

#[test]
fn test_parse_surrounding_whitespace() {
    let record = parse_record(" humidity : 40 ", ':').unwrap();

    assert_eq!(record.key, SensorType::Humidity);
    assert_eq!(record.value, 40.0);
}

#[test]
fn test_parse_non_numeric_value() {
    let res = parse_record("temperature:not-a-number", ':');

    assert_eq!(
        res.unwrap_err(),
        ParseError::NonNumericValue("not-a-number".to_owned())
    );
}

#[test]
fn test_parse_nan_rejected() {
    let res = parse_record("temperature:NaN", ':');

    assert!(matches!(res, Err(ParseError::NonNumericValue(_))));
}

#[test]
fn test_parse_malformed_line() {
    assert!(matches!(
        parse_record("temperature", ':'),
        Err(ParseError::MalformedLine(_))
    ));
    assert!(matches!(
        parse_record("a:b:c", ':'),
        Err(ParseError::MalformedLine(_))
    ));
    assert!(matches!(
        parse_record("", ':'),
        Err(ParseError::MalformedLine(_))
    ));
}

#[test]
fn test_parse_unknown_key() {
    let res = parse_record("voltage:3.3", ':');

    assert_eq!(res.unwrap_err(), ParseError::UnknownKey("voltage".to_owned()));
}

#[test]
fn test_parse_custom_delimiter() {
    let record = parse_record("humidity=40", '=').unwrap();

    assert_eq!(record.key, SensorType::Humidity);
    assert_eq!(record.value, 40.0);
}
