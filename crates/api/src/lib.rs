//! Price Estimator API Server
//!
//! Serves the estimate form and a JSON API in front of the price predictor.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    routing::post,
    Json, Router,
};
use data_validator::Validator;
use feature_engine::{FeaturePreparer, FittedScaler, ScalerError};
use inference_engine::{InferenceEngine, InferenceError, ModelCard, PricePredictor};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

pub mod rate_limit;
pub mod routes;
pub mod settings;

use rate_limit::{create_governor_config, RateLimitConfig};
use settings::{AppConfig, LoggingConfig};

/// Errors while starting the server
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Failed to load scaler: {0}")]
    Scaler(#[from] ScalerError),
    #[error("Failed to load model: {0}")]
    Model(#[from] InferenceError),
    #[error("Failed to load page templates: {0}")]
    Template(#[from] minijinja::Error),
    #[error("Failed to install metrics recorder: {0}")]
    Metrics(String),
    #[error("Failed to install log subscriber: {0}")]
    Logging(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("Invalid rate limit: period and burst size must be non-zero")]
    RateLimit,
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state shared across handlers; read-only after startup
pub struct AppState {
    /// Prepare → scale → predict pipeline
    pub predictor: PricePredictor,
    /// Static model metadata
    pub card: ModelCard,
    /// Compiled page templates
    pub templates: Environment<'static>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create new application state
    pub fn new(predictor: PricePredictor, card: ModelCard) -> Result<Self, StartupError> {
        Ok(Self {
            predictor,
            card,
            templates: routes::form::templates()?,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        })
    }

    /// Load the scaler and model named in the config
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let scaler = FittedScaler::load(&config.artifacts.scaler_path)?;
        let model = InferenceEngine::load(&config.artifacts.model_path)?;

        let predictor = PricePredictor::new(
            FeaturePreparer::new(Validator::new(config.validation.clone())),
            Arc::new(scaler),
            Arc::new(model),
        );
        Self::new(predictor, config.model_card.clone())
    }

    /// Attach a Prometheus handle for `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    /// Loaded model backend
    pub model: String,
    /// Loaded scaling method
    pub scaler: String,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::form::show_form).post(routes::form::submit_form))
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/model", get(routes::model::get_model))
        .route("/api/v1/predictions", post(routes::predictions::create_prediction))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model: state.predictor.model_name().to_string(),
        scaler: state.predictor.scaler_name().to_string(),
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), StartupError> {
    let level = config.max_level()?;
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Serve the router on an already bound listener
pub async fn serve(
    listener: TcpListener,
    state: SharedState,
    rate_limit: &RateLimitConfig,
) -> Result<(), StartupError> {
    let mut app = create_router(state);

    if rate_limit.enabled {
        let config = create_governor_config(rate_limit).ok_or(StartupError::RateLimit)?;
        info!(
            "Rate limiting enabled: burst={}, replenish every {}s",
            rate_limit.burst_size, rate_limit.per_second
        );
        app = app.layer(GovernorLayer { config });
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Load artifacts, install metrics and run the server
pub async fn run_server(config: AppConfig) -> Result<(), StartupError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| StartupError::Metrics(e.to_string()))?;
    let state = AppState::from_config(&config)?.with_metrics(handle);

    let listener = TcpListener::bind(&config.server.bind_addr).await?;
    info!("Starting API server on {}", listener.local_addr()?);

    serve(listener, Arc::new(state), &config.rate_limit).await
}
