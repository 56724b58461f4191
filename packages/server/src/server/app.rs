//! Application setup and server configuration.

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{
    create_medicine_handler, delete_medicine_handler, get_medicine_handler, health_handler,
    intake_log_handler, list_medicines_handler, mark_taken_handler, today_handler,
    update_medicine_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: ServerDeps,
}

/// Build the Axum application router
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/api/patients/:patient_id/medicines",
            get(list_medicines_handler).post(create_medicine_handler),
        )
        .route(
            "/api/patients/:patient_id/medicines/:medicine_id",
            get(get_medicine_handler)
                .put(update_medicine_handler)
                .delete(delete_medicine_handler),
        )
        .route(
            "/api/patients/:patient_id/medicines/:medicine_id/taken",
            post(mark_taken_handler),
        )
        .route("/api/patients/:patient_id/doses/today", get(today_handler))
        .route("/api/patients/:patient_id/intakes", get(intake_log_handler))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
