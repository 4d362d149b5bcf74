//! FinApp HTTP API.
//!
//! Exports the state and router so integration tests can drive the service
//! without binding a socket.

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod routes;
pub mod telemetry;

pub use config::{Config, LogFormat};
pub use error::{AppError, Result};

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use finapp_feeds::{FeedClient, FeedConfig};
use finapp_storage::{AttachmentStore, DbPool};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use auth::AuthManager;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
    pub attachments: AttachmentStore,
    pub feeds: FeedClient,
    pub auth: Arc<AuthManager>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> anyhow::Result<Self> {
        let secret = if config.jwt_secret.trim().is_empty() {
            tracing::warn!("jwt_secret not set; tokens will not survive a restart");
            format!(
                "{}{}",
                uuid::Uuid::new_v4().simple(),
                uuid::Uuid::new_v4().simple()
            )
        } else {
            config.jwt_secret.clone()
        };

        let feeds = FeedClient::new(FeedConfig {
            enabled: config.feeds_enabled,
            timeout: config.feed_timeout(),
            ..FeedConfig::default()
        })?;

        Ok(Self {
            pool,
            attachments: AttachmentStore::new(&config.attachments_dir),
            feeds,
            auth: Arc::new(AuthManager::new(secret.as_bytes(), config.token_ttl())),
            config: Arc::new(config),
        })
    }

    pub fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    if config.allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .merge(routes::accounts::router())
        .merge(routes::categories::router())
        .merge(routes::transactions::router())
        .merge(routes::reconciliation::router())
        .merge(routes::reports::router())
        .merge(routes::payroll::router())
        .merge(routes::taxes::router())
        .merge(routes::calendar::router())
        .merge(routes::parties::router())
        .merge(routes::market::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let max_upload = state.config.max_upload_bytes;
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
