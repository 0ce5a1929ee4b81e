//! Campus push server entry point.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method, header};
use campus_api::AppState;
use campus_common::Config;
use campus_core::{PushService, SessionService, VapidConfig};
use campus_db::repositories::{
    PushSubscriptionRepository, SessionRepository, UserPushPreferenceRepository,
};
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interval between expired session sweeps.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(3600);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// CORS for the configured frontends. Session cookies need credentialed
/// requests, which rule out wildcard origins.
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campus=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting campus push server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = Arc::new(campus_db::init(&config).await?);
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    campus_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let subscription_repo = PushSubscriptionRepository::new(Arc::clone(&db));
    let preference_repo = UserPushPreferenceRepository::new(Arc::clone(&db));
    let session_repo = SessionRepository::new(Arc::clone(&db));

    // Initialize services
    let vapid = config.push.as_ref().map(VapidConfig::from);
    if vapid.is_none() {
        warn!("Push not configured; the public key endpoint will report unavailable");
    }
    let push_service = PushService::new(subscription_repo, preference_repo, vapid);
    let session_service = SessionService::new(session_repo);

    // Sweep expired sessions in the background
    let sweeper = session_service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match sweeper.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Purged expired sessions"),
                Err(e) => warn!(error = %e, "Failed to purge expired sessions"),
            }
        }
    });

    let state = AppState {
        push_service,
        session_service,
    };

    // Build router
    let app = campus_api::app(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
