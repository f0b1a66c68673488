use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_intake_api::config::Config;
use lead_intake_api::db::Database;
use lead_intake_api::handlers::{self, AppState};

/// Form submissions are small; 1MB leaves room for raw tracker payloads.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, connects to PostgreSQL (applying
/// the bootstrap schema), builds the router with its middleware stack and
/// serves until Ctrl-C.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_intake_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let db = Database::new(&config.database_url).await?;
    tracing::info!("Database connection pool established");

    let app_state = Arc::new(AppState {
        db: db.pool.clone(),
        config: config.clone(),
    });

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );
    tracing::info!(
        "Rate limiting: {} req/sec per IP, burst of {}",
        config.rate_limit_per_second,
        config.rate_limit_burst
    );

    let api_routes = Router::new()
        .route(
            "/api/leads",
            get(handlers::list_leads).post(handlers::create_lead),
        )
        .route("/api/leads/scored", get(handlers::list_scored_leads))
        .route(
            "/api/leads/:id",
            get(handlers::get_lead)
                .patch(handlers::update_lead)
                .delete(handlers::delete_lead),
        )
        .route("/api/leads/:id/score", get(handlers::get_lead_score))
        .route("/api/lead-metrics", get(handlers::list_lead_metrics))
        .route(
            "/api/lead-metrics/:lead_id",
            get(handlers::get_lead_metrics)
                .post(handlers::create_lead_metrics)
                .patch(handlers::update_lead_metrics)
                .delete(handlers::delete_lead_metrics),
        )
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/api/health", get(handlers::health))
        .merge(api_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Peer addresses feed the per-IP rate limiter when no proxy headers are present
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
