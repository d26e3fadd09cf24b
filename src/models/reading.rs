use crate::error::DBError;
use crate::sensor::handle::Reading;
use chrono::{DateTime, Utc};

#[derive(sqlx::FromRow, Debug)]
pub struct ReadingDao {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) value: f64,
}

impl From<ReadingDao> for Reading {
    fn from(val: ReadingDao) -> Self {
        Reading {
            timestamp: val.timestamp,
            value: val.value,
        }
    }
}

pub async fn insert(
    conn: &sqlx::SqlitePool,
    sensor_id: i64,
    timestamp: DateTime<Utc>,
    value: f64,
) -> Result<(), DBError> {
    sqlx::query("INSERT INTO readings (sensor_id, timestamp, value) VALUES (?, ?, ?)")
        .bind(sensor_id)
        .bind(timestamp)
        .bind(value)
        .execute(conn)
        .await?;
    Ok(())
}

/// READ readings
pub async fn get(
    conn: &sqlx::SqlitePool,
    sensor_id: i64,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Vec<ReadingDao>, DBError> {
    Ok(sqlx::query_as::<_, ReadingDao>(
        r#"SELECT timestamp, value
            FROM readings
            WHERE sensor_id = ?
            AND timestamp >= ? AND timestamp < ?
            ORDER BY timestamp ASC"#,
    )
    .bind(sensor_id)
    .bind(from)
    .bind(until)
    .fetch_all(conn)
    .await?)
}

pub async fn get_latest(
    conn: &sqlx::SqlitePool,
    sensor_id: i64,
) -> Result<Option<ReadingDao>, DBError> {
    Ok(sqlx::query_as::<_, ReadingDao>(
        r#"SELECT timestamp, value
            FROM readings
            WHERE sensor_id = ?
            ORDER BY timestamp DESC LIMIT 1"#,
    )
    .bind(sensor_id)
    .fetch_optional(conn)
    .await?)
}
