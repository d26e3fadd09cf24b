use crate::error::{DBError, ParseError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Wire key vocabulary and static unit/default-range table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, utoipa::ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SensorType {
    Temperature,
    Humidity,
    Light,
    SoilMoisture,
    Distance,
    Pressure,
    Co2,
    MagneticField,
}

impl SensorType {
    pub const ALL: [SensorType; 8] = [
        SensorType::Temperature,
        SensorType::Humidity,
        SensorType::Light,
        SensorType::SoilMoisture,
        SensorType::Distance,
        SensorType::Pressure,
        SensorType::Co2,
        SensorType::MagneticField,
    ];

    pub fn unit(&self) -> &'static str {
        match self {
            SensorType::Temperature => "°C",
            SensorType::Humidity => "%",
            SensorType::Light => "lux",
            SensorType::SoilMoisture => "%",
            SensorType::Distance => "cm",
            SensorType::Pressure => "hPa",
            SensorType::Co2 => "ppm",
            SensorType::MagneticField => "µT",
        }
    }

    pub fn default_range(&self) -> (f64, f64) {
        match self {
            SensorType::Temperature => (-10.0, 50.0),
            SensorType::Humidity => (0.0, 100.0),
            SensorType::Light => (0.0, 100_000.0),
            SensorType::SoilMoisture => (0.0, 100.0),
            SensorType::Distance => (0.0, 400.0),
            SensorType::Pressure => (300.0, 1100.0),
            SensorType::Co2 => (400.0, 5000.0),
            SensorType::MagneticField => (-100.0, 100.0),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SensorType::Temperature => "Temperature",
            SensorType::Humidity => "Humidity",
            SensorType::Light => "Light",
            SensorType::SoilMoisture => "Soil Moisture",
            SensorType::Distance => "Distance",
            SensorType::Pressure => "Pressure",
            SensorType::Co2 => "CO2",
            SensorType::MagneticField => "Magnetic Field",
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "temperature",
            SensorType::Humidity => "humidity",
            SensorType::Light => "light",
            SensorType::SoilMoisture => "soil_moisture",
            SensorType::Distance => "distance",
            SensorType::Pressure => "pressure",
            SensorType::Co2 => "co2",
            SensorType::MagneticField => "magnetic_field",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "temperature" => Ok(SensorType::Temperature),
            "humidity" => Ok(SensorType::Humidity),
            "light" => Ok(SensorType::Light),
            "soil_moisture" => Ok(SensorType::SoilMoisture),
            "distance" => Ok(SensorType::Distance),
            "pressure" => Ok(SensorType::Pressure),
            "co2" => Ok(SensorType::Co2),
            "magnetic_field" => Ok(SensorType::MagneticField),
            _ => Err(ParseError::UnknownKey(s.to_owned())),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct SensorDao {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) sensor_type: SensorType,
    pub(crate) enabled: bool,
    pub(crate) min_value: Option<f64>,
    pub(crate) max_value: Option<f64>,
    pub(crate) created_at: DateTime<Utc>,
}

impl SensorDao {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn sensor_type(&self) -> SensorType {
        self.sensor_type
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn range(&self) -> (Option<f64>, Option<f64>) {
        (self.min_value, self.max_value)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_range(&mut self, min_value: Option<f64>, max_value: Option<f64>) {
        self.min_value = min_value;
        self.max_value = max_value;
    }
}

pub async fn insert(
    conn: &sqlx::SqlitePool,
    name_opt: Option<String>,
    sensor_type: SensorType,
    min_value: Option<f64>,
    max_value: Option<f64>,
) -> Result<SensorDao, DBError> {
    let name = name_opt.unwrap_or_else(|| format!("{} Sensor", sensor_type.display_name()));

    Ok(sqlx::query_as::<_, SensorDao>(
        r#"INSERT INTO sensors (name, sensor_type, enabled, min_value, max_value, created_at)
            VALUES (?, ?, 1, ?, ?, ?) RETURNING *"#,
    )
    .bind(name)
    .bind(sensor_type)
    .bind(min_value)
    .bind(max_value)
    .bind(Utc::now())
    .fetch_one(conn)
    .await?)
}

/// READ sensors
pub async fn read(conn: &sqlx::SqlitePool) -> Result<Vec<SensorDao>, DBError> {
    Ok(
        sqlx::query_as::<_, SensorDao>("SELECT * FROM sensors ORDER BY name")
            .fetch_all(conn)
            .await?,
    )
}

pub async fn read_for_project(
    conn: &sqlx::SqlitePool,
    project_id: i64,
) -> Result<Vec<SensorDao>, DBError> {
    Ok(sqlx::query_as::<_, SensorDao>(
        r#"SELECT s.* FROM sensors s
            JOIN project_sensors ps ON (ps.sensor_id = s.id)
            WHERE ps.project_id = ?
            ORDER BY s.name"#,
    )
    .bind(project_id)
    .fetch_all(conn)
    .await?)
}

pub async fn set_enabled(
    conn: &sqlx::SqlitePool,
    sensor_id: i64,
    enabled: bool,
) -> Result<(), DBError> {
    let result = sqlx::query("UPDATE sensors SET enabled = ? WHERE id = ?")
        .bind(enabled)
        .bind(sensor_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DBError::SensorNotFound(sensor_id));
    }
    Ok(())
}

pub async fn set_range(
    conn: &sqlx::SqlitePool,
    sensor_id: i64,
    min_value: Option<f64>,
    max_value: Option<f64>,
) -> Result<(), DBError> {
    let result = sqlx::query("UPDATE sensors SET min_value = ?, max_value = ? WHERE id = ?")
        .bind(min_value)
        .bind(max_value)
        .bind(sensor_id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DBError::SensorNotFound(sensor_id));
    }
    Ok(())
}
