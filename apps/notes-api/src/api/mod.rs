//! API routes module
//!
//! This module defines all HTTP API routes for the notes API.

pub mod health;

use axum::Router;
use domain_notes::{NoteService, handlers};

use crate::state::AppState;

/// Create all API routes
/// Note: These are nested under /api by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    let service = NoteService::new(state.db.clone());

    Router::new()
        .nest("/notes", handlers::router(service))
        .merge(health::router(state.clone()))
}
