use chrono::{DateTime, Utc};

const DEFAULT_WINDOW_COUNT: usize = 100;

#[derive(Debug, serde::Deserialize)]
pub struct WindowQuery {
    count: Option<usize>,
    from: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
}

impl WindowQuery {
    pub fn count(&self) -> usize {
        self.count.unwrap_or(DEFAULT_WINDOW_COUNT)
    }

    /// A window becomes a durable-storage range query once bounds are given.
    pub fn history_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.from, self.until) {
            (Some(from), Some(until)) => Some((from, until)),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        match (self.from, self.until) {
            (Some(from), Some(until)) => from < until,
            (None, None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ProjectQuery {
    project: Option<i64>,
}

impl ProjectQuery {
    pub fn project(&self) -> Option<i64> {
        self.project
    }
}
