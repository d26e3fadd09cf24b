mod config;
mod error;
mod logging;
mod models;
mod rest;
mod sensor;
mod serial;

use crate::sensor::ConcurrentObserver;
use tracing::{error, info};

#[tokio::main]
pub async fn main() -> std::io::Result<()> {
    logging::init();

    let db_conn = match models::establish_db_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed connecting database: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let observer = ConcurrentObserver::new(db_conn);
    observer.init().await;
    sensor::observer::register_sigint_handler(&observer);

    let ingest_loop = ConcurrentObserver::dispatch_ingest_loop(observer.clone());
    let server_daemon = rest::dispatch_server(observer.clone());

    tokio::select! {
        _ = ingest_loop => {}
        _ = server_daemon => {}
    }
    info!("Shutdown complete");
    Ok(())
}
