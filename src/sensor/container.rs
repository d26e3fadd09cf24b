use super::handle::SensorHandle;
use crate::models::sensor::SensorType;

use std::collections::HashMap;
use tokio::sync::Mutex;

pub struct SensorContainer {
    sensors: HashMap<i64, Mutex<SensorHandle>>,
}

impl SensorContainer {
    pub fn new() -> Self {
        SensorContainer {
            sensors: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub async fn sensor_unchecked(
        &self,
        sensor_id: i64,
    ) -> Option<tokio::sync::MutexGuard<'_, SensorHandle>> {
        let sensor_mutex = self.sensors.get(&sensor_id)?;
        Some(sensor_mutex.lock().await)
    }

    pub fn insert_sensor(&mut self, sensor: SensorHandle) {
        self.sensors.insert(sensor.id(), Mutex::new(sensor));
    }

    /// Resolves a wire key to the enabled sensors registered for it.
    pub async fn enabled_ids_for(&self, sensor_type: SensorType) -> Vec<i64> {
        let mut ids = Vec::new();
        for sensor_mtx in self.sensors.values() {
            let sensor = sensor_mtx.lock().await;
            if sensor.sensor_type() == sensor_type && sensor.enabled() {
                ids.push(sensor.id());
            }
        }
        ids.sort_unstable();
        ids
    }
}
