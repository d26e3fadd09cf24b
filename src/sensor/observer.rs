use super::container::SensorContainer;
use super::handle::{AlertState, Reading, SensorHandle};
use crate::config::CONFIG;
use crate::error::{ApiError, DBError, ObserverError};
use crate::models::{
    self,
    project::{self as project_model, ProjectDao},
    reading::{self as reading_model},
    sensor::{self as sensor_model, SensorDao, SensorType},
};
use crate::serial::{self, line::LineReader, parse::ParsedRecord};

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::fmt::Debug;
use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncRead;
use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, error, info, warn};

pub struct SensorStatus {
    pub dao: SensorDao,
    pub current: Option<Reading>,
    pub alert: Option<AlertState>,
}

pub struct ConcurrentObserver {
    pub(crate) container: RwLock<SensorContainer>,
    pub(crate) db_conn: SqlitePool,
    ingest_guard: Mutex<()>,
    shutdown: Notify,
    is_shutdown: AtomicBool,
    streaming: AtomicBool,
}

impl Debug for ConcurrentObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentObserver").finish()
    }
}

impl ConcurrentObserver {
    pub fn new(db_conn: SqlitePool) -> Arc<Self> {
        let observer = ConcurrentObserver {
            container: RwLock::new(SensorContainer::new()),
            db_conn,
            ingest_guard: Mutex::new(()),
            shutdown: Notify::new(),
            is_shutdown: AtomicBool::new(false),
            streaming: AtomicBool::new(false),
        };
        Arc::new(observer)
    }

    pub async fn init(&self) {
        if let Err(e) = self.populate_sensors().await {
            error!("Failed restoring sensors: {}", e);
        }
    }

    async fn populate_sensors(&self) -> Result<(), DBError> {
        let start = Utc::now();
        let sensor_daos = sensor_model::read(&self.db_conn).await?;
        let count = sensor_daos.len();

        let mut container = self.container.write().await;
        for sensor_dao in sensor_daos {
            container.insert_sensor(SensorHandle::from(sensor_dao, CONFIG.window_capacity()));
        }

        let duration = Utc::now() - start;
        info!(
            "Restored {} sensors in {} ms",
            count,
            duration.num_milliseconds()
        );
        Ok(())
    }

    pub fn trigger_shutdown(&self) {
        self.is_shutdown.store(true, Ordering::Relaxed);
        self.shutdown.notify_waiters();
    }

    fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::Relaxed)
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Relaxed)
    }

    async fn wait_shutdown(&self) {
        let mut notified = pin!(self.shutdown.notified());
        if self.is_shutdown() {
            return;
        }
        notified.as_mut().enable();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }
}

// Ingestion
impl ConcurrentObserver {
    /// Owns the serial device for the lifetime of the process.
    ///
    /// Walks `Disconnected -> Connecting -> Streaming` forever, with bounded
    /// exponential backoff between failed connect attempts. Exactly one
    /// instance may run per process, a second call refuses to start.
    /// Blocks caller task until shutdown is triggered
    pub async fn dispatch_ingest_loop(self: Arc<ConcurrentObserver>) {
        let guard_res = self.ingest_guard.try_lock();
        if guard_res.is_err() {
            error!("dispatch_ingest_loop() already called!");
            return;
        }
        let _guard = guard_res.unwrap();

        let mut backoff = CONFIG.backoff_initial();
        loop {
            if self.is_shutdown() {
                return;
            }

            match serial::resolve_port().await {
                Ok(stream) => {
                    backoff = CONFIG.backoff_initial();
                    self.streaming.store(true, Ordering::Relaxed);
                    info!("Streaming telemetry");

                    let finished = self.stream_records(stream).await;
                    self.streaming.store(false, Ordering::Relaxed);
                    if finished {
                        info!("Ingestion stopped, serial port released");
                        return;
                    }
                    warn!("Serial stream ended, reconnecting");
                }
                Err(e) => {
                    warn!("{} - retrying in {:?}", e, backoff);
                    tokio::select! {
                        _ = self.wait_shutdown() => return,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(CONFIG.backoff_max());
                }
            }
        }
    }

    /// Returns true on shutdown, false on a stream-level failure.
    pub(crate) async fn stream_records<R>(&self, stream: R) -> bool
    where
        R: AsyncRead + Unpin,
    {
        let mut reader = LineReader::new(stream);
        loop {
            tokio::select! {
                _ = self.wait_shutdown() => return true,
                next = reader.next_line() => match next {
                    Ok(Some(line)) => {
                        if !line.is_empty() {
                            self.process_line(&line).await;
                        }
                    }
                    Ok(None) => (), // read timeout, liveness tick
                    Err(e) => {
                        error!("Serial stream failed: {}", e);
                        return false;
                    }
                }
            }
        }
    }

    pub(crate) async fn process_line(&self, line: &str) {
        let record = match serial::parse::parse_record(line, CONFIG.record_delimiter()) {
            Ok(record) => record,
            Err(e) => {
                warn!("Dropped line {:?}: {}", line, e);
                return;
            }
        };

        let targets = {
            let container = self.container.read().await;
            container.enabled_ids_for(record.key).await
        };
        if targets.is_empty() {
            debug!(key = %record.key, "No enabled sensor registered for key");
            return;
        }

        for sensor_id in targets {
            self.store_reading(sensor_id, &record).await;
        }
    }

    async fn store_reading(&self, sensor_id: i64, record: &ParsedRecord) {
        let reading = Reading {
            timestamp: record.timestamp,
            value: record.value,
        };

        // The window update happens under the per-sensor lock, the durable
        // write outside of it so reads never wait on the write path. The
        // single ingestion task keeps both in per-sensor append order.
        let transition = {
            let container = self.container.read().await;
            let mut sensor = match container.sensor_unchecked(sensor_id).await {
                Some(sensor) => sensor,
                None => {
                    warn!(sensor_id = sensor_id, "Sensor not found");
                    return;
                }
            };
            if !sensor.enabled() {
                return;
            }
            sensor.push(reading)
        };

        if let Some(edge) = transition {
            info!(
                sensor_id = sensor_id,
                in_range = edge.in_range,
                value = edge.value,
                at = %edge.at,
                "Alert state changed"
            );
        }

        let insert = reading_model::insert(&self.db_conn, sensor_id, reading.timestamp, reading.value);
        match tokio::time::timeout(CONFIG.write_timeout(), insert).await {
            Ok(Ok(())) => (),
            Ok(Err(e)) => error!(
                sensor_id = sensor_id,
                "Failed persisting reading, kept in memory only: {}", e
            ),
            Err(_) => error!(
                sensor_id = sensor_id,
                "Durable write timed out, kept in memory only"
            ),
        }
    }
}

// Query and mutation API
impl ConcurrentObserver {
    /*
     * Sensor
     */

    pub async fn register_sensor(
        &self,
        name: Option<String>,
        sensor_type: SensorType,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> Result<SensorDao, ObserverError> {
        validate_range(min_value, max_value)?;

        let sensor_dao =
            sensor_model::insert(&self.db_conn, name, sensor_type, min_value, max_value).await?;
        let dao_id = sensor_dao.id();

        let handle = SensorHandle::from(sensor_dao.clone(), CONFIG.window_capacity());
        self.container.write().await.insert_sensor(handle);

        info!(sensor_id = dao_id, "Registered new sensor");
        Ok(sensor_dao)
    }

    pub async fn set_sensor_enabled(
        &self,
        sensor_id: i64,
        enabled: bool,
    ) -> Result<(), ObserverError> {
        sensor_model::set_enabled(&self.db_conn, sensor_id, enabled).await?;

        let container = self.container.read().await;
        if let Some(mut sensor) = container.sensor_unchecked(sensor_id).await {
            sensor.set_enabled(enabled);
        }

        info!(sensor_id = sensor_id, enabled = enabled, "Toggled sensor");
        Ok(())
    }

    pub async fn set_sensor_range(
        &self,
        sensor_id: i64,
        min_value: Option<f64>,
        max_value: Option<f64>,
    ) -> Result<(), ObserverError> {
        validate_range(min_value, max_value)?;
        sensor_model::set_range(&self.db_conn, sensor_id, min_value, max_value).await?;

        let container = self.container.read().await;
        if let Some(mut sensor) = container.sensor_unchecked(sensor_id).await {
            sensor.set_range(min_value, max_value);
        }

        info!(sensor_id = sensor_id, "Updated sensor range");
        Ok(())
    }

    pub async fn sensor_status(&self, sensor_id: i64) -> Result<SensorStatus, ObserverError> {
        let (dao, mut current, alert) = {
            let container = self.container.read().await;
            let sensor = container
                .sensor_unchecked(sensor_id)
                .await
                .ok_or(DBError::SensorNotFound(sensor_id))?;
            (sensor.dao.clone(), sensor.current_value(), sensor.alert_state())
        };

        // the window is empty after a restart, fall back to stored history
        if current.is_none() {
            current = reading_model::get_latest(&self.db_conn, sensor_id)
                .await?
                .map(Reading::from);
        }

        Ok(SensorStatus {
            dao,
            current,
            alert,
        })
    }

    pub async fn recent_window(
        &self,
        sensor_id: i64,
        count: usize,
    ) -> Result<Vec<Reading>, ObserverError> {
        let container = self.container.read().await;
        let sensor = container
            .sensor_unchecked(sensor_id)
            .await
            .ok_or(DBError::SensorNotFound(sensor_id))?;
        Ok(sensor.recent(count))
    }

    pub async fn history(
        &self,
        sensor_id: i64,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Reading>, ObserverError> {
        if self
            .container
            .read()
            .await
            .sensor_unchecked(sensor_id)
            .await
            .is_none()
        {
            return Err(DBError::SensorNotFound(sensor_id).into());
        }

        let daos = reading_model::get(&self.db_conn, sensor_id, from, until).await?;
        Ok(daos.into_iter().map(Reading::from).collect())
    }

    pub async fn list_sensors(
        &self,
        project_id: Option<i64>,
    ) -> Result<Vec<SensorStatus>, ObserverError> {
        let sensor_daos = match project_id {
            Some(project_id) => {
                project_model::get(&self.db_conn, project_id)
                    .await?
                    .ok_or(DBError::ProjectNotFound(project_id))?;
                sensor_model::read_for_project(&self.db_conn, project_id).await?
            }
            None => sensor_model::read(&self.db_conn).await?,
        };

        let container = self.container.read().await;
        let mut statuses = Vec::with_capacity(sensor_daos.len());
        for dao in sensor_daos {
            let (current, alert) = match container.sensor_unchecked(dao.id()).await {
                Some(sensor) => (sensor.current_value(), sensor.alert_state()),
                None => (None, None),
            };
            statuses.push(SensorStatus {
                dao,
                current,
                alert,
            });
        }
        Ok(statuses)
    }

    /*
     * Project
     */

    pub async fn create_project(
        &self,
        name: String,
        description: Option<String>,
        sensor_types: Vec<SensorType>,
    ) -> Result<ProjectDao, ObserverError> {
        let project_dao = project_model::insert(&self.db_conn, name, description).await?;

        for sensor_type in sensor_types {
            let sensor_dao = self.register_sensor(None, sensor_type, None, None).await?;
            project_model::add_sensor(&self.db_conn, project_dao.id(), sensor_dao.id()).await?;
        }

        info!(project_id = project_dao.id(), "Created project");
        Ok(project_dao)
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectDao>, ObserverError> {
        Ok(project_model::read(&self.db_conn).await?)
    }

    pub async fn add_sensor_to_project(
        &self,
        project_id: i64,
        sensor_id: i64,
    ) -> Result<(), ObserverError> {
        project_model::get(&self.db_conn, project_id)
            .await?
            .ok_or(DBError::ProjectNotFound(project_id))?;
        if self
            .container
            .read()
            .await
            .sensor_unchecked(sensor_id)
            .await
            .is_none()
        {
            return Err(DBError::SensorNotFound(sensor_id).into());
        }

        project_model::add_sensor(&self.db_conn, project_id, sensor_id).await?;
        info!(
            project_id = project_id,
            sensor_id = sensor_id,
            "Added sensor to project"
        );
        Ok(())
    }

    /*
     * Health
     */

    pub async fn sensor_count(&self) -> usize {
        self.container.read().await.len()
    }

    pub async fn check_db(&self) -> String {
        match models::check_schema(&self.db_conn).await {
            Ok(_) => "ok".to_owned(),
            Err(e) => format!("error: {}", e),
        }
    }
}

fn validate_range(min_value: Option<f64>, max_value: Option<f64>) -> Result<(), ApiError> {
    if let (Some(min), Some(max)) = (min_value, max_value) {
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(ApiError::ArgumentError());
        }
    }
    Ok(())
}

static TERMINATED: AtomicUsize = AtomicUsize::new(0);

pub fn register_sigint_handler(observer: &Arc<ConcurrentObserver>) {
    let observer = observer.clone();
    ctrlc::set_handler(move || {
        let count = TERMINATED.fetch_add(1, Ordering::Relaxed);
        if count >= 1 {
            info!("Force killing");
            std::process::exit(0);
        }

        info!("Shutting down, waiting for the serial port to be released");
        observer.trigger_shutdown();
    })
    .unwrap();
}
