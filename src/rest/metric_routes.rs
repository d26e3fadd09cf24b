use super::build_response;
use crate::sensor::ConcurrentObserver;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    observer: &Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    health(observer.clone())
}

fn health(
    observer: Arc<ConcurrentObserver>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::any()
        .map(move || observer.clone())
        .and(warp::path!("api" / "health"))
        .and_then(|observer: Arc<ConcurrentObserver>| async move {
            let ret = dto::HealthyDto {
                healthy: true,
                database_state: observer.check_db().await,
                sensor_count: observer.sensor_count().await,
                streaming: observer.is_streaming(),
            };
            build_response(Ok(ret))
        })
        .boxed()
}

pub mod dto {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
    pub struct HealthyDto {
        pub healthy: bool,
        pub database_state: String,
        pub sensor_count: usize,
        pub streaming: bool,
    }
}
