use crate::error::DBError;
use chrono::{DateTime, Utc};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ProjectDao {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) created_at: DateTime<Utc>,
}

impl ProjectDao {
    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn name(&self) -> &String {
        &self.name
    }

    pub fn description(&self) -> &String {
        &self.description
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

pub async fn insert(
    conn: &sqlx::SqlitePool,
    name: String,
    description: Option<String>,
) -> Result<ProjectDao, DBError> {
    Ok(sqlx::query_as::<_, ProjectDao>(
        "INSERT INTO projects (name, description, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(name)
    .bind(description.unwrap_or_default())
    .bind(Utc::now())
    .fetch_one(conn)
    .await?)
}

/// READ projects
pub async fn read(conn: &sqlx::SqlitePool) -> Result<Vec<ProjectDao>, DBError> {
    Ok(
        sqlx::query_as::<_, ProjectDao>("SELECT * FROM projects ORDER BY name")
            .fetch_all(conn)
            .await?,
    )
}

pub async fn get(conn: &sqlx::SqlitePool, project_id: i64) -> Result<Option<ProjectDao>, DBError> {
    Ok(
        sqlx::query_as::<_, ProjectDao>("SELECT * FROM projects WHERE id = ?")
            .bind(project_id)
            .fetch_optional(conn)
            .await?,
    )
}

pub async fn add_sensor(
    conn: &sqlx::SqlitePool,
    project_id: i64,
    sensor_id: i64,
) -> Result<(), DBError> {
    sqlx::query("INSERT OR IGNORE INTO project_sensors (project_id, sensor_id) VALUES (?, ?)")
        .bind(project_id)
        .bind(sensor_id)
        .execute(conn)
        .await?;
    Ok(())
}
