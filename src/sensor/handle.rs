use crate::models::sensor::{SensorDao, SensorType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Derived in/out-of-range state, recomputed per reading and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AlertState {
    pub in_range: bool,
    pub last_value: f64,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy)]
pub struct AlertTransition {
    pub in_range: bool,
    pub value: f64,
    pub at: DateTime<Utc>,
}

/// Per-sensor in-memory state: metadata, bounded recent window, alert state.
pub struct SensorHandle {
    pub(crate) dao: SensorDao,
    window: VecDeque<Reading>,
    capacity: usize,
    alert: Option<AlertState>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl SensorHandle {
    pub fn from(dao: SensorDao, capacity: usize) -> SensorHandle {
        debug!(sensor_id = dao.id(), "Loaded sensor \"{}\"", dao.name());
        SensorHandle {
            dao,
            window: VecDeque::with_capacity(capacity),
            capacity,
            alert: None,
            last_timestamp: None,
        }
    }

    /// Appends a reading to the recent window and re-evaluates the range.
    ///
    /// Returns an edge event when the in/out-of-range state changed, nothing
    /// on the first reading or while the state is steady.
    pub fn push(&mut self, reading: Reading) -> Option<AlertTransition> {
        if let Some(last) = self.last_timestamp {
            // device clocks are not authoritative, accept but flag
            if reading.timestamp < last {
                warn!(
                    sensor_id = self.dao.id(),
                    "Out-of-order reading: {} < {}", reading.timestamp, last
                );
            } else {
                self.last_timestamp = Some(reading.timestamp);
            }
        } else {
            self.last_timestamp = Some(reading.timestamp);
        }

        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(reading);

        let in_range = self.check_range(reading.value);
        let edge = match &self.alert {
            Some(state) if state.in_range != in_range => Some(AlertTransition {
                in_range,
                value: reading.value,
                at: reading.timestamp,
            }),
            _ => None,
        };

        match &mut self.alert {
            Some(state) => {
                if state.in_range != in_range {
                    state.since = reading.timestamp;
                }
                state.in_range = in_range;
                state.last_value = reading.value;
            }
            None => {
                self.alert = Some(AlertState {
                    in_range,
                    last_value: reading.value,
                    since: reading.timestamp,
                });
            }
        }
        edge
    }

    fn check_range(&self, value: f64) -> bool {
        let (min, max) = self.dao.range();
        min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
    }

    /// Most-recent `count` readings, oldest first.
    pub fn recent(&self, count: usize) -> Vec<Reading> {
        let skip = self.window.len().saturating_sub(count);
        self.window.iter().skip(skip).copied().collect()
    }

    pub fn current_value(&self) -> Option<Reading> {
        self.window.back().copied()
    }

    pub fn alert_state(&self) -> Option<AlertState> {
        self.alert.clone()
    }

    pub fn id(&self) -> i64 {
        self.dao.id()
    }

    pub fn sensor_type(&self) -> SensorType {
        self.dao.sensor_type()
    }

    pub fn enabled(&self) -> bool {
        self.dao.enabled()
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.dao.set_enabled(enabled);
    }

    pub fn set_range(&mut self, min_value: Option<f64>, max_value: Option<f64>) {
        self.dao.set_range(min_value, max_value);
    }
}
