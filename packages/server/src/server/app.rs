//! Application state and router assembly.

use axum::routing::{get, post};
use axum::{Extension, Router};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::jobs::JobTracker;
use crate::server::routes::{
    create_job_handler, get_job_handler, health_handler, job_results_handler,
    record_item_handler, update_job_handler,
};

/// Shared application state injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub tracker: JobTracker,
}

/// Build the application router
pub fn build_app(pool: PgPool) -> Router {
    let state = AppState {
        tracker: JobTracker::new(pool.clone()),
        db_pool: pool,
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/jobs", post(create_job_handler))
        .route(
            "/api/v1/jobs/:job_id",
            get(get_job_handler).patch(update_job_handler),
        )
        .route("/api/v1/jobs/:job_id/items", post(record_item_handler))
        .route("/api/v1/jobs/:job_id/results", get(job_results_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(Extension(state)),
        )
}
