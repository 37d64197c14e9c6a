mod admin;
mod ai;
mod auth;
mod config;
mod credits;
mod custom_resume;
mod dashboard;
mod db;
mod elements;
mod errors;
mod llm_client;
mod mailer;
mod models;
mod payments;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::jwt::JwtService;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::AnthropicClient;
use crate::mailer::{LogMailer, Mailer, ResendMailer};
use crate::payments::RazorpayGateway;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::ObjectStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting resume API v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let storage = ObjectStore::from_config(&config).await;
    info!("Object storage initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = AnthropicClient::new(config.anthropic_api_key.clone())
        .context("failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let mailer: Arc<dyn Mailer> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendMailer::new(
            key.clone(),
            config.resend_from_email.clone(),
        )?),
        None => {
            warn!("RESEND_API_KEY not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let payments = RazorpayGateway::new(
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    )?;

    // Build app state
    let state = AppState {
        db,
        redis,
        storage,
        llm: Arc::new(llm),
        mailer,
        payments: Arc::new(payments),
        jwt: JwtService::new(&config),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The web client sends the refresh cookie, so origins must be listed
/// explicitly and credentials allowed.
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}
