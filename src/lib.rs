pub mod base62;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod expiry;
pub mod handlers;
pub mod models;
pub mod ratelimit;
pub mod service;
pub mod syntax;
pub mod workers;

pub use cache::Cache;
pub use config::Config;
pub use db::Database;
pub use error::AppError;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use ratelimit::RateLimiter;
use service::PasteService;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Shared handles threaded through every request.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub cache: Arc<Cache>,
    pub service: Arc<PasteService>,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, db: Database) -> Self {
        let db = Arc::new(db);
        let cache = Arc::new(Cache::with_default_ttl(config.cache_ttl));
        let service = Arc::new(PasteService::new(
            db.clone(),
            cache.clone(),
            config.base_url.clone(),
        ));
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit_per_minute,
            config.rate_limit_enabled,
        ));

        Self {
            db,
            cache,
            service,
            limiter,
            config: Arc::new(config),
        }
    }
}

// Slack for JSON framing around the 1 MiB content limit.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static("x-syntax-type"),
            HeaderName::from_static("x-created-at"),
            HeaderName::from_static("x-expires-at"),
            HeaderName::from_static("x-ratelimit-limit"),
            HeaderName::from_static("x-ratelimit-remaining"),
            HeaderName::from_static("x-ratelimit-reset"),
        ]);

    let api = Router::new()
        .route(
            "/pastes",
            post(handlers::paste::create_paste).route_layer(middleware::from_fn_with_state(
                state.clone(),
                ratelimit::rate_limit,
            )),
        )
        .route("/pastes/:id", get(handlers::paste::get_paste))
        .route("/pastes/:id", delete(handlers::paste::delete_paste));

    Router::new()
        .nest("/api/v1", api)
        .route("/health", get(handlers::health::health))
        // Short URL route last so it can't shadow the fixed paths.
        .route("/:id", get(handlers::paste::get_raw))
        .layer(
            ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(
                    service::MAX_CONTENT_SIZE + BODY_LIMIT_OVERHEAD,
                ))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
