//! Readiness endpoint

use axum::{Router, extract::State, routing::get};
use axum_helpers::server::{HealthCheckFuture, run_health_checks};
use axum::response::IntoResponse;

use crate::state::AppState;

/// Create a readiness check router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness check - verifies the MongoDB connection
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![(
        "mongodb",
        Box::pin(async {
            if database::mongodb::check_health(&state.mongo_client).await {
                Ok(())
            } else {
                Err("MongoDB ping failed".to_string())
            }
        }),
    )];

    match run_health_checks(checks).await {
        Ok(response) => response.into_response(),
        Err(response) => response.into_response(),
    }
}
