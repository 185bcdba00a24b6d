use std::sync::Arc;

use file_uploader::{
    adapters::{
        middleware::SessionKeys,
        repositories::{ensure_schema, PgFileRepository, PgFolderRepository},
        router::build_router,
        state::AppState,
    },
    application::repositories::{
        file_repository::FileRepository, folder_repository::FolderRepository,
    },
    domain::config::AppConfig,
    services,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Crypto provider for rustls, needed before aws-sdk-s3 and sqlx open TLS connections
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = AppConfig::from_env().unwrap_or_else(|e| panic!("ERROR: {e}"));

    tracing::info!(
        "Starting file-uploader with {} storage, max upload {} bytes, allowed types {:?}",
        config.storage.provider.as_str(),
        config.upload.max_bytes,
        config.upload.allowed_mime
    );

    let cors = match &config.cors_allowed_origins {
        Some(allowed_origins) => {
            let origins: Vec<_> = allowed_origins
                .iter()
                .map(|s| s.parse().expect("Invalid CORS origin"))
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        // Allow all origins if not specified (only for development)
        None => CorsLayer::permissive(),
    };

    tracing::info!("Connecting to database...");
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.secrets.database_url)
        .await
        .expect("ERROR: Failed to connect to PostgreSQL database. Check DATABASE_URL and network connectivity.");

    ensure_schema(&pool)
        .await
        .expect("ERROR: Failed to create database schema");

    let blob_store =
        services::create_blob_store(&config.storage, &config.secrets, config.upload.max_bytes)
            .expect("Failed to create blob store");

    let app_state = AppState::new(
        config.upload.clone(),
        SessionKeys::new(&config.secrets.session_secret),
        blob_store,
        Arc::new(PgFolderRepository::new(pool.clone())) as Arc<dyn FolderRepository>,
        Arc::new(PgFileRepository::new(pool)) as Arc<dyn FileRepository>,
        config.timeouts,
        config.delete_concurrency,
    );

    let router = build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on 0.0.0.0:{}", config.port);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
