pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{
    application_service::ApplicationService,
    event_service::{EventHub, TracingListener},
    job_service::JobService,
    mail_service::MailService,
    pipeline_service::PipelineService,
    settings_service::SettingsService,
    user_service::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub events: Arc<EventHub>,
    pub application_service: ApplicationService,
    pub pipeline_service: PipelineService,
    pub job_service: JobService,
    pub user_service: UserService,
    pub settings_service: SettingsService,
    pub mail_service: MailService,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        let mut events = EventHub::new();
        events.register(Arc::new(TracingListener));

        let application_service = ApplicationService::new(pool.clone());
        let pipeline_service = PipelineService::new(pool.clone());
        let job_service = JobService::new(pool.clone());
        let user_service = UserService::new(pool.clone());
        let settings_service = SettingsService::new(pool.clone());
        let mail_service = MailService::new(config.mail_relay_url.clone());

        Self {
            pool,
            config: Arc::new(config),
            events: Arc::new(events),
            application_service,
            pipeline_service,
            job_service,
            user_service,
            settings_service,
            mail_service,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let actions = Router::new()
        .route(
            "/api/hrm/actions/uploadApplicationFile",
            post(routes::dispatch::upload_application_file),
        )
        .route(
            "/api/hrm/actions/:action",
            post(routes::dispatch::dispatch_action),
        )
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(state.config.public_rps),
            middleware::rate_limit::rps_middleware,
        ));

    let bootstrap = Router::new()
        .route("/api/hrm/bootstrap", get(routes::bootstrap::bootstrap))
        .layer(axum::middleware::from_fn_with_state(
            middleware::rate_limit::new_rps_state(state.config.admin_rps),
            middleware::rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(routes::health::health))
        .merge(actions)
        .merge(bootstrap)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::attach_identity,
        ))
        .with_state(state)
        .layer(middleware::cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
}
