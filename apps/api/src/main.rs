use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use careernav::auth::JwtKeys;
use careernav::config::Config;
use careernav::db::create_pool;
use careernav::invoker::ProcessInvoker;
use careernav::resume::extractor::HttpResumeExtractor;
use careernav::routes::build_router;
use careernav::state::AppState;
use careernav::store::{PgRecommendationStore, ResumeArchive};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerNav API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL and run migrations
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgRecommendationStore::new(db));

    let runner = Arc::new(ProcessInvoker::new(
        config.analysis_interpreter.clone(),
        config.timeline_script.clone(),
        config.plan_script.clone(),
    ));
    info!(
        "Analysis scripts: {} {} / {}",
        config.analysis_interpreter, config.timeline_script, config.plan_script
    );

    let extractor = Arc::new(HttpResumeExtractor::new(config.resume_service_url.clone()));
    info!("Resume service at {}", config.resume_service_url);

    // Initialize S3 / MinIO resume archive when configured
    let archive = match &config.archive {
        Some(archive_config) => {
            info!("Resume archive enabled (bucket: {})", archive_config.s3_bucket);
            Some(ResumeArchive::connect(archive_config).await)
        }
        None => {
            info!("Resume archive disabled");
            None
        }
    };

    let state = AppState {
        runner,
        store,
        extractor,
        archive,
        auth: JwtKeys::new(config.jwt_secret.as_bytes()),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
