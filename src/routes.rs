// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, subjects},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges the sub-routers (subjects, attempts).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool, Config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    let subject_routes = Router::new().route("/", get(subjects::list_subjects));

    let attempt_routes = Router::new()
        .route(
            "/",
            get(attempts::list_attempts)
                .post(attempts::create_attempt)
                .delete(attempts::clear_attempts),
        )
        .route(
            "/{id}",
            get(attempts::get_attempt).delete(attempts::delete_attempt),
        )
        .route(
            "/{id}/questions/{question_id}",
            put(attempts::record_selection),
        )
        .route(
            "/{id}/questions/{question_id}/check",
            post(attempts::check_question),
        )
        .route("/{id}/submit", post(attempts::submit_attempt))
        .route("/{id}/evaluate", post(attempts::evaluate_attempt));

    Router::new()
        .nest("/api/subjects", subject_routes)
        .nest("/api/attempts", attempt_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
