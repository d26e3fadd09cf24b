use crate::config::CONFIG;
use crate::error::ObserverError;
use crate::sensor::ConcurrentObserver;
use std::sync::Arc;
use tracing::{error, info, warn};
use warp::http::StatusCode;
use warp::Filter;

mod doc_routes;
mod metric_routes;
mod project_routes;
mod query;
mod sensor_routes;

pub fn routes(
    observer: &Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    sensor_routes::routes(observer)
        .or(project_routes::routes(observer))
        .or(metric_routes::routes(observer))
        .or(doc_routes::routes())
}

pub(crate) fn build_response<T: serde::Serialize>(
    resp: Result<T, ObserverError>,
) -> Result<Box<dyn warp::Reply>, warp::Rejection> {
    match resp {
        Ok(data) => Ok(Box::new(warp::reply::json(&data))),
        Err(ObserverError::User(err)) => {
            warn!("{}", err);
            let body = warp::reply::json(&dto::ErrorResponseDto {
                error: format!("{}", err),
            });
            Ok(Box::new(warp::reply::with_status(
                body,
                StatusCode::BAD_REQUEST,
            )))
        }
        Err(ObserverError::Internal(err)) => {
            error!("{}", err);
            Ok(Box::new(StatusCode::INTERNAL_SERVER_ERROR))
        }
    }
}

pub async fn dispatch_server(observer: Arc<ConcurrentObserver>) {
    let bind_port: u16 = CONFIG
        .server_port()
        .parse()
        .expect("SERVER_PORT must be a port number");

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET", "POST", "PUT", "DELETE"]);
    let routes = routes(&observer).with(cors);

    info!("Starting webserver at: {}", bind_port);
    warp::serve(routes).run(([0, 0, 0, 0], bind_port)).await;
}

pub(crate) mod dto {
    use serde::Serialize;

    #[derive(Debug, Serialize, utoipa::ToSchema)]
    pub struct ErrorResponseDto {
        pub error: String,
    }
}
