use super::metric_routes::dto::HealthyDto;
use super::project_routes::dto::{ProjectCreateRequestDto, ProjectDto, ProjectSensorRequestDto};
use super::sensor_routes::dto::{
    SensorDataDto, SensorDto, SensorRangeRequestDto, SensorRegisterRequestDto,
    SensorToggleRequestDto, SensorTypeDto,
};
use crate::models::sensor::SensorType;
use crate::sensor::handle::{AlertState, Reading};

use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::Config;
use warp::{
    http::Uri,
    hyper::{Response, StatusCode},
    path::{FullPath, Tail},
    Filter, Rejection, Reply,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "sprout",
        description = "Serial telemetry ingestion and time-series backend"
    ),
    components(schemas(
        SensorType,
        Reading,
        AlertState,
        SensorRegisterRequestDto,
        SensorToggleRequestDto,
        SensorRangeRequestDto,
        SensorDto,
        SensorDataDto,
        SensorTypeDto,
        ProjectCreateRequestDto,
        ProjectSensorRequestDto,
        ProjectDto,
        HealthyDto,
        super::dto::ErrorResponseDto,
    ))
)]
struct ApiDoc;

pub fn routes() -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let config = Arc::new(Config::from("/api/doc/api.json"));

    warp::path!("api" / "doc" / "api.json")
        .and(warp::get())
        .map(|| warp::reply::json(&ApiDoc::openapi()))
        .or(warp::path("api")
            .and(warp::path("doc"))
            .and(warp::get())
            .and(warp::path::full())
            .and(warp::path::tail())
            .and(warp::any().map(move || config.clone()))
            .and_then(serve_swagger))
}

async fn serve_swagger(
    full_path: FullPath,
    tail: Tail,
    config: Arc<Config<'static>>,
) -> Result<Box<dyn Reply + 'static>, Rejection> {
    if full_path.as_str() == "/api/doc" {
        return Ok(Box::new(warp::redirect::found(Uri::from_static(
            "/api/doc/",
        ))));
    }

    let path = tail.as_str();
    match utoipa_swagger_ui::serve(path, config) {
        Ok(Some(file)) => Ok(Box::new(
            Response::builder()
                .header("Content-Type", file.content_type)
                .body(file.bytes),
        )),
        Ok(None) => Ok(Box::new(StatusCode::NOT_FOUND)),
        Err(error) => Ok(Box::new(
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(error.to_string()),
        )),
    }
}
