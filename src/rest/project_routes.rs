use super::build_response;
use crate::sensor::ConcurrentObserver;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    observer: &Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    create_project(observer.clone())
        .or(project_list(observer.clone()))
        .or(add_project_sensor(observer.clone()))
}

/// POST /api/project
///
/// Create a new project
///
/// One sensor per requested type is registered and added to the project
fn create_project(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::post())
        .and(warp::path!("api" / "project"))
        .and(warp::body::json())
        .and_then(
            |observer: Arc<ConcurrentObserver>, body: dto::ProjectCreateRequestDto| async move {
                let resp = observer
                    .create_project(body.name, body.description, body.sensors)
                    .await
                    .map(dto::ProjectDto::from);
                build_response(resp)
            },
        )
        .boxed()
}

/// GET /api/project
///
/// List all projects
fn project_list(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::get())
        .and(warp::path!("api" / "project"))
        .and_then(|observer: Arc<ConcurrentObserver>| async move {
            let resp = observer.list_projects().await.map(|projects| {
                projects
                    .into_iter()
                    .map(dto::ProjectDto::from)
                    .collect::<Vec<_>>()
            });
            build_response(resp)
        })
        .boxed()
}

/// POST /api/project/:id/sensor
///
/// Add an existing sensor to a project
fn add_project_sensor(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::post())
        .and(warp::path!("api" / "project" / i64 / "sensor"))
        .and(warp::body::json())
        .and_then(
            |observer: Arc<ConcurrentObserver>,
             project_id: i64,
             body: dto::ProjectSensorRequestDto| async move {
                let resp = observer
                    .add_sensor_to_project(project_id, body.sensor_id)
                    .await;
                build_response(resp)
            },
        )
        .boxed()
}

///
/// DTO
///
pub mod dto {
    use crate::models::project::ProjectDao;
    use crate::models::sensor::SensorType;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct ProjectCreateRequestDto {
        pub name: String,
        pub description: Option<String>,
        #[serde(default)]
        pub sensors: Vec<SensorType>,
    }

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct ProjectSensorRequestDto {
        pub sensor_id: i64,
    }

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct ProjectDto {
        pub id: i64,
        pub name: String,
        pub description: String,
        pub created_at: DateTime<Utc>,
    }

    impl From<ProjectDao> for ProjectDto {
        fn from(dao: ProjectDao) -> Self {
            ProjectDto {
                id: dao.id(),
                name: dao.name().clone(),
                description: dao.description().clone(),
                created_at: dao.created_at(),
            }
        }
    }
}
