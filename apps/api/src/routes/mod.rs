pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::schema::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/schema/validate", post(handlers::handle_validate))
        .route(
            "/api/v1/schema/:job_id",
            get(handlers::handle_get_schema).put(handlers::handle_put_schema),
        )
        .route("/api/v1/schema/:job_id/adjust", post(handlers::handle_adjust))
        .route(
            "/api/v1/schema/:job_id/sections",
            post(handlers::handle_sections),
        )
        .route(
            "/api/v1/schema/:job_id/baseline",
            post(handlers::handle_baseline),
        )
        .route(
            "/api/v1/schema/:job_id/requirements",
            get(handlers::handle_requirements),
        )
        .with_state(state)
}
