use super::build_response;
use super::query::{ProjectQuery, WindowQuery};
use crate::error::{ApiError, ObserverError};
use crate::models::sensor::SensorType;
use crate::sensor::ConcurrentObserver;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    observer: &Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    sensor_types()
        .or(register_sensor(observer.clone()))
        .or(sensor_list(observer.clone()))
        .or(sensor_status(observer.clone()))
        .or(sensor_toggle(observer.clone()))
        .or(sensor_range(observer.clone()))
        .or(sensor_data(observer.clone()))
}

/// GET /api/sensor/types
///
/// List the sensor types a board may report, with unit and default range
fn sensor_types() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::get()
        .and(warp::path!("api" / "sensor" / "types"))
        .map(|| {
            let types: Vec<dto::SensorTypeDto> = SensorType::ALL
                .iter()
                .map(|sensor_type| {
                    let (min_value, max_value) = sensor_type.default_range();
                    dto::SensorTypeDto {
                        sensor_type: *sensor_type,
                        name: format!("{} Sensor", sensor_type.display_name()),
                        unit: sensor_type.unit().to_owned(),
                        min_value,
                        max_value,
                    }
                })
                .collect();
            warp::reply::json(&types)
        })
        .boxed()
}

/// POST /api/sensor
///
/// Register a new sensor
///
/// Lines for a sensor key are only ingested once a sensor
/// of that type got registered
fn register_sensor(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::post())
        .and(warp::path!("api" / "sensor"))
        .and(warp::body::json())
        .and_then(
            |observer: Arc<ConcurrentObserver>, body: dto::SensorRegisterRequestDto| async move {
                let resp = observer
                    .register_sensor(body.name, body.sensor_type, body.min_value, body.max_value)
                    .await
                    .map(dto::SensorDto::from);
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/sensor?project=<id>
///
/// List sensors with current value and alert state,
/// optionally filtered by project membership
fn sensor_list(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "sensor"))
        .and(warp::query::<ProjectQuery>())
        .and_then(
            |observer: Arc<ConcurrentObserver>, query: ProjectQuery| async move {
                let resp = observer.list_sensors(query.project()).await.map(|statuses| {
                    statuses
                        .into_iter()
                        .map(dto::SensorDto::from)
                        .collect::<Vec<_>>()
                });
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/sensor/:id
///
/// Fetch a sensor status
///
/// Returns a `SensorDto` with the latest value, unit, range and alert state.
/// A sensor without any reading yet reports `value: null`
fn sensor_status(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "sensor" / i64))
        .and_then(
            |observer: Arc<ConcurrentObserver>, sensor_id: i64| async move {
                let resp = observer
                    .sensor_status(sensor_id)
                    .await
                    .map(dto::SensorDto::from);
                build_response(resp)
            },
        )
        .boxed()
}

/// POST /api/sensor/:id/toggle
///
/// Enable or disable ingestion for a sensor, history stays queryable
fn sensor_toggle(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::post())
        .and(warp::path!("api" / "sensor" / i64 / "toggle"))
        .and(warp::body::json())
        .and_then(
            |observer: Arc<ConcurrentObserver>,
             sensor_id: i64,
             body: dto::SensorToggleRequestDto| async move {
                let resp = observer.set_sensor_enabled(sensor_id, body.enabled).await;
                build_response(resp)
            },
        )
        .boxed()
}

/// PUT /api/sensor/:id/range
///
/// Update the valid [min,max] range used by the alert evaluator
fn sensor_range(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::put())
        .and(warp::path!("api" / "sensor" / i64 / "range"))
        .and(warp::body::json())
        .and_then(
            |observer: Arc<ConcurrentObserver>,
             sensor_id: i64,
             body: dto::SensorRangeRequestDto| async move {
                let resp = observer
                    .set_sensor_range(sensor_id, body.min_value, body.max_value)
                    .await;
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/sensor/:id/data?count=&from=&until=
///
/// Fetch readings for charting, most-recent last
///
/// Without bounds the in-memory recent window is served,
/// `from`/`until` switch to durable history
fn sensor_data(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "sensor" / i64 / "data"))
        .and(warp::query::<WindowQuery>())
        .and_then(
            |observer: Arc<ConcurrentObserver>, sensor_id: i64, query: WindowQuery| async move {
                if !query.is_valid() {
                    return build_response::<dto::SensorDataDto>(
                        Err(ApiError::ArgumentError().into()),
                    );
                }
                let resp = fetch_sensor_data(&observer, sensor_id, &query).await;
                build_response(resp)
            },
        )
        .boxed()
}

async fn fetch_sensor_data(
    observer: &ConcurrentObserver,
    sensor_id: i64,
    query: &WindowQuery,
) -> Result<dto::SensorDataDto, ObserverError> {
    let status = observer.sensor_status(sensor_id).await?;
    let data = match query.history_range() {
        Some((from, until)) => observer.history(sensor_id, from, until).await?,
        None => observer.recent_window(sensor_id, query.count()).await?,
    };

    let (min_value, max_value) = status.dao.range();
    Ok(dto::SensorDataDto {
        unit: status.dao.sensor_type().unit().to_owned(),
        data,
        min_value,
        max_value,
    })
}

///
/// DTO
///
pub mod dto {
    use crate::models::sensor::{SensorDao, SensorType};
    use crate::sensor::handle::{AlertState, Reading};
    use crate::sensor::observer::SensorStatus;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct SensorRegisterRequestDto {
        pub name: Option<String>,
        #[serde(rename = "type")]
        pub sensor_type: SensorType,
        pub min_value: Option<f64>,
        pub max_value: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct SensorToggleRequestDto {
        pub enabled: bool,
    }

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct SensorRangeRequestDto {
        pub min_value: Option<f64>,
        pub max_value: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct SensorDto {
        pub id: i64,
        pub name: String,
        #[serde(rename = "type")]
        pub sensor_type: SensorType,
        pub unit: String,
        pub enabled: bool,
        pub min_value: Option<f64>,
        pub max_value: Option<f64>,
        pub created_at: DateTime<Utc>,
        pub value: Option<f64>,
        pub timestamp: Option<DateTime<Utc>>,
        pub alert: Option<AlertState>,
    }

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct SensorDataDto {
        pub unit: String,
        pub data: Vec<Reading>,
        pub min_value: Option<f64>,
        pub max_value: Option<f64>,
    }

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct SensorTypeDto {
        #[serde(rename = "type")]
        pub sensor_type: SensorType,
        pub name: String,
        pub unit: String,
        pub min_value: f64,
        pub max_value: f64,
    }

    impl From<SensorDao> for SensorDto {
        fn from(dao: SensorDao) -> Self {
            let (min_value, max_value) = dao.range();
            SensorDto {
                id: dao.id(),
                name: dao.name().clone(),
                sensor_type: dao.sensor_type(),
                unit: dao.sensor_type().unit().to_owned(),
                enabled: dao.enabled(),
                min_value,
                max_value,
                created_at: dao.created_at(),
                value: None,
                timestamp: None,
                alert: None,
            }
        }
    }

    impl From<SensorStatus> for SensorDto {
        fn from(status: SensorStatus) -> Self {
            let mut dto = SensorDto::from(status.dao);
            dto.value = status.current.map(|reading| reading.value);
            dto.timestamp = status.current.map(|reading| reading.timestamp);
            dto.alert = status.alert;
            dto
        }
    }
}
