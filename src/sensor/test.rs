use std::sync::Arc;

use super::container::SensorContainer;
use super::handle::{Reading, SensorHandle};
use super::*;
use crate::models::reading as reading_model;
use crate::models::sensor::{SensorDao, SensorType};
use chrono::{Duration, Utc};
use tokio::io::{duplex, AsyncWriteExt};

fn build_dao(
    id: i64,
    sensor_type: SensorType,
    min_value: Option<f64>,
    max_value: Option<f64>,
) -> SensorDao {
    SensorDao {
        id,
        name: format!("{} Sensor", sensor_type.display_name()),
        sensor_type,
        enabled: true,
        min_value,
        max_value,
        created_at: Utc::now(),
    }
}

fn reading(value: f64) -> Reading {
    Reading {
        timestamp: Utc::now(),
        value,
    }
}

async fn build_mocked_observer() -> Arc<ConcurrentObserver> {
    let db_conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!().run(&db_conn).await.unwrap();
    ConcurrentObserver::new(db_conn)
}

/*
 * Handle - recent window
 */

#[test]
fn test_window_capacity_eviction() {
    // Prepare
    let mut handle = SensorHandle::from(build_dao(1, SensorType::Temperature, None, None), 3);

    // Execute
    for value in [1.0, 2.0, 3.0, 4.0] {
        handle.push(reading(value));
    }

    // Validate - the oldest entry got evicted
    let recent: Vec<f64> = handle.recent(10).iter().map(|r| r.value).collect();
    assert_eq!(recent, vec![2.0, 3.0, 4.0]);
    assert_eq!(handle.current_value().unwrap().value, 4.0);
}

#[test]
fn test_window_most_recent_last() {
    let mut handle = SensorHandle::from(build_dao(1, SensorType::Light, None, None), 10);
    for value in [1.0, 2.0, 3.0] {
        handle.push(reading(value));
    }

    let recent: Vec<f64> = handle.recent(2).iter().map(|r| r.value).collect();

    assert_eq!(recent, vec![2.0, 3.0]);
}

#[test]
fn test_out_of_order_reading_accepted() {
    let mut handle = SensorHandle::from(build_dao(1, SensorType::Distance, None, None), 10);
    let now = Utc::now();

    handle.push(Reading {
        timestamp: now,
        value: 1.0,
    });
    handle.push(Reading {
        timestamp: now - Duration::seconds(5),
        value: 2.0,
    });

    assert_eq!(handle.recent(10).len(), 2);
}

/*
 * Handle - alert evaluator
 */

#[test]
fn test_alert_edges_fire_once_per_crossing() {
    // Prepare
    let mut handle =
        SensorHandle::from(build_dao(1, SensorType::Humidity, Some(10.0), Some(20.0)), 10);

    // Execute
    let edges: Vec<Option<bool>> = [5.0, 15.0, 25.0, 15.0, 5.0]
        .iter()
        .map(|value| handle.push(reading(*value)).map(|edge| edge.in_range))
        .collect();

    // Validate - the first sample only seeds the state, every
    // boundary crossing afterwards fires exactly one edge
    assert_eq!(
        edges,
        vec![None, Some(true), Some(false), Some(true), Some(false)]
    );
}

#[test]
fn test_alert_steady_state_fires_no_edge() {
    let mut handle =
        SensorHandle::from(build_dao(1, SensorType::Humidity, Some(10.0), Some(20.0)), 10);

    let edges: Vec<Option<bool>> = [5.0, 3.0, 15.0, 17.0, 25.0, 30.0]
        .iter()
        .map(|value| handle.push(reading(*value)).map(|edge| edge.in_range))
        .collect();

    assert_eq!(
        edges,
        vec![None, None, Some(true), None, Some(false), None]
    );
}

#[test]
fn test_alert_without_range_always_in_range() {
    let mut handle = SensorHandle::from(build_dao(1, SensorType::Co2, None, None), 10);

    for value in [5.0, 1_000_000.0, -42.0] {
        assert!(handle.push(reading(value)).is_none());
    }

    assert!(handle.alert_state().unwrap().in_range);
}

#[test]
fn test_alert_min_only_range() {
    let mut handle = SensorHandle::from(build_dao(1, SensorType::Pressure, Some(10.0), None), 10);

    assert!(handle.push(reading(5.0)).is_none());
    let edge = handle.push(reading(15.0)).unwrap();
    assert!(edge.in_range);
    // no upper bound
    assert!(handle.push(reading(100_000.0)).is_none());
}

#[test]
fn test_alert_state_tracks_last_value() {
    let mut handle =
        SensorHandle::from(build_dao(1, SensorType::Temperature, Some(0.0), Some(30.0)), 10);

    handle.push(reading(12.0));
    handle.push(reading(18.0));

    let state = handle.alert_state().unwrap();
    assert!(state.in_range);
    assert_eq!(state.last_value, 18.0);
}

/*
 * Container
 */

#[tokio::test]
async fn test_container_resolves_enabled_sensors() {
    // Prepare
    let mut container = SensorContainer::new();
    container.insert_sensor(SensorHandle::from(
        build_dao(1, SensorType::Temperature, None, None),
        10,
    ));
    let mut disabled = SensorHandle::from(build_dao(2, SensorType::Temperature, None, None), 10);
    disabled.set_enabled(false);
    container.insert_sensor(disabled);
    container.insert_sensor(SensorHandle::from(
        build_dao(3, SensorType::Humidity, None, None),
        10,
    ));

    // Execute
    let ids = container.enabled_ids_for(SensorType::Temperature).await;

    // Validate
    assert_eq!(ids, vec![1]);
}

/*
 * Observer - ingestion pipeline
 */

#[tokio::test]
async fn test_process_line_stores_reading() {
    // Prepare
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::Temperature, None, None)
        .await
        .unwrap();

    // Execute
    observer.process_line("temperature:21.5").await;

    // Validate - write-then-read consistency in window and durable store
    let window = observer.recent_window(dao.id(), 1).await.unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].value, 21.5);

    let latest = reading_model::get_latest(&observer.db_conn, dao.id())
        .await
        .unwrap();
    assert_eq!(latest.unwrap().value, 21.5);
}

#[tokio::test]
async fn test_process_line_fans_out_per_type() {
    let observer = build_mocked_observer().await;
    let first = observer
        .register_sensor(None, SensorType::Light, None, None)
        .await
        .unwrap();
    let second = observer
        .register_sensor(None, SensorType::Light, None, None)
        .await
        .unwrap();

    observer.process_line("light:800").await;

    for id in [first.id(), second.id()] {
        let window = observer.recent_window(id, 10).await.unwrap();
        assert_eq!(window.len(), 1);
    }
}

#[tokio::test]
async fn test_process_line_drops_unregistered_key() {
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::Temperature, None, None)
        .await
        .unwrap();

    observer.process_line("co2:400").await;

    let window = observer.recent_window(dao.id(), 10).await.unwrap();
    assert!(window.is_empty());
}

#[tokio::test]
async fn test_process_line_malformed_keeps_ingesting() {
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::Temperature, None, None)
        .await
        .unwrap();

    observer.process_line("temp:not-a-number").await;
    observer.process_line("temperature:21.5").await;

    let window = observer.recent_window(dao.id(), 10).await.unwrap();
    assert_eq!(window.len(), 1);
}

#[tokio::test]
async fn test_disabled_sensor_keeps_history() {
    // Prepare
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::SoilMoisture, None, None)
        .await
        .unwrap();
    observer.process_line("soil_moisture:55").await;

    // Execute
    observer.set_sensor_enabled(dao.id(), false).await.unwrap();
    observer.process_line("soil_moisture:60").await;

    // Validate - no new readings, history unchanged
    let from = Utc::now() - Duration::minutes(1);
    let until = Utc::now() + Duration::minutes(1);
    let history = observer.history(dao.id(), from, until).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].value, 55.0);
}

#[tokio::test]
async fn test_alert_state_follows_readings() {
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::Humidity, Some(10.0), Some(20.0))
        .await
        .unwrap();

    observer.process_line("humidity:5").await;
    let status = observer.sensor_status(dao.id()).await.unwrap();
    assert!(!status.alert.unwrap().in_range);

    observer.process_line("humidity:15").await;
    let status = observer.sensor_status(dao.id()).await.unwrap();
    assert!(status.alert.unwrap().in_range);
}

#[tokio::test]
async fn test_stream_resumes_without_duplicates() {
    // Prepare
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::Temperature, None, None)
        .await
        .unwrap();

    // Execute - the stream dies mid-session
    let (mut tx, rx) = duplex(64);
    tx.write_all(b"temperature:1\ntemperature:2\n").await.unwrap();
    drop(tx);
    let finished = observer.stream_records(rx).await;
    assert!(!finished);

    // and records keep flowing after the reconnect
    let (mut tx, rx) = duplex(64);
    tx.write_all(b"temperature:3\n").await.unwrap();
    drop(tx);
    observer.stream_records(rx).await;

    // Validate
    let values: Vec<f64> = observer
        .recent_window(dao.id(), 10)
        .await
        .unwrap()
        .iter()
        .map(|r| r.value)
        .collect();
    assert_eq!(values, vec![1.0, 2.0, 3.0]);
}

#[tokio::test]
async fn test_shutdown_stops_streaming() {
    // Prepare
    let observer = build_mocked_observer().await;
    let (_tx, rx) = duplex(64);

    // Execute
    observer.trigger_shutdown();
    let finished = observer.stream_records(rx).await;

    // Validate
    assert!(finished);
}

/*
 * Observer - query and mutation API
 */

#[tokio::test]
async fn test_register_sensor_with_invalid_range() {
    let observer = build_mocked_observer().await;

    let res = observer
        .register_sensor(None, SensorType::Temperature, Some(30.0), Some(10.0))
        .await;

    assert!(res.is_err());
}

#[tokio::test]
async fn test_sensor_status_without_data() {
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::MagneticField, None, None)
        .await
        .unwrap();

    let status = observer.sensor_status(dao.id()).await.unwrap();

    assert!(status.current.is_none());
    assert!(status.alert.is_none());
}

#[tokio::test]
async fn test_sensor_status_falls_back_to_durable_store() {
    // Prepare - a reading persisted before the process restarted
    let observer = build_mocked_observer().await;
    let dao = observer
        .register_sensor(None, SensorType::Temperature, None, None)
        .await
        .unwrap();
    reading_model::insert(&observer.db_conn, dao.id(), Utc::now(), 19.5)
        .await
        .unwrap();

    // Execute
    let status = observer.sensor_status(dao.id()).await.unwrap();

    // Validate
    assert_eq!(status.current.unwrap().value, 19.5);
}

#[tokio::test]
async fn test_status_of_unknown_sensor() {
    let observer = build_mocked_observer().await;

    let res = observer.sensor_status(1337).await;

    assert!(res.is_err());
}

#[tokio::test]
async fn test_populate_restores_sensors() {
    // Prepare
    let observer = build_mocked_observer().await;
    observer
        .register_sensor(None, SensorType::Temperature, None, None)
        .await
        .unwrap();

    // Execute - a second observer on the same database
    let restored = ConcurrentObserver::new(observer.db_conn.clone());
    restored.init().await;

    // Validate
    assert_eq!(restored.sensor_count().await, 1);
}
