use std::{io, sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{delete, get, post},
};
use log::{error, info};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;

use crate::{
    config::Config,
    routes::{
        add_sighting_handler, bird_handler, birds_handler, health_handler,
        remove_sighting_handler, sightings_handler,
    },
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/birds", get(birds_handler))
        .route("/api/birds/{id}", get(bird_handler))
        .route("/api/sightings", post(add_sighting_handler))
        .route("/api/sightings/{user_id}", get(sightings_handler))
        .route(
            "/api/sightings/{user_id}/{bird_id}",
            delete(remove_sighting_handler),
        )
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: Config) -> io::Result<()> {
    info!("Initializing state...");
    let state = AppState::new(config);

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install terminate handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
