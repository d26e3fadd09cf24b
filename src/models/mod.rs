use crate::config::CONFIG;
use crate::error::DBError;
use std::path::Path;

pub async fn establish_db_connection() -> Result<sqlx::SqlitePool, DBError> {
    let database_url = CONFIG.database_url();
    ensure_db_dir(&database_url);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .connect(&database_url)
        .await?;
    sqlx::migrate!().run(&pool).await?;
    Ok(pool)
}

// `mode=rwc` creates the database file, but not its parent directory
fn ensure_db_dir(database_url: &str) {
    if let Some(path) = database_url
        .strip_prefix("sqlite://")
        .map(|rest| rest.split('?').next().unwrap_or(rest))
    {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).ok();
            }
        }
    }
}

pub async fn check_schema(conn: &sqlx::SqlitePool) -> Result<i64, DBError> {
    let record = sqlx::query_as::<_, CountRecord>("SELECT count(*) as count FROM sensors")
        .fetch_one(conn)
        .await?;
    Ok(record.count())
}

#[derive(sqlx::FromRow)]
pub(crate) struct CountRecord {
    pub count: Option<i64>,
}

impl CountRecord {
    pub fn count(self) -> i64 {
        self.count.unwrap_or(0)
    }
}

pub mod project;
pub mod reading;
pub mod sensor;
