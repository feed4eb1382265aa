// src/handlers/attempts.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    exam,
    models::attempt::{
        AttemptView, ExamConfig, HistoryFilter, RecordSelectionRequest, SubmitAttemptRequest,
    },
    repository::attempts,
};

/// Assembles a new attempt from an exam configuration.
///
/// * Validates the configuration (positive counts and time limit).
/// * Selects questions with the configured strategy and its fallbacks.
/// * Returns the attempt without answer keys.
pub async fn create_attempt(
    State(pool): State<SqlitePool>,
    Json(config): Json<ExamConfig>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = exam::create_attempt(&pool, &config).await?;
    let view = AttemptView::from_attempt(&attempt)?;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Lists past attempts, newest first, optionally filtered by subject.
pub async fn list_attempts(
    State(pool): State<SqlitePool>,
    Query(filter): Query<HistoryFilter>,
) -> Result<impl IntoResponse, AppError> {
    let history = attempts::list_attempts(&pool, &filter).await.map_err(|e| {
        tracing::error!("Failed to list attempts: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(history))
}

/// Retrieves a single attempt. Answer keys stay hidden until it has ended.
pub async fn get_attempt(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts::fetch_attempt(&pool, id)
        .await?
        .ok_or(AppError::NotFound(format!("attempt {} not found", id)))?;

    Ok(Json(AttemptView::from_attempt(&attempt)?))
}

/// Records the user's answer to one question.
pub async fn record_selection(
    State(pool): State<SqlitePool>,
    Path((id, question_id)): Path<(i64, i64)>,
    Json(req): Json<RecordSelectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    exam::record_selection(&pool, id, question_id, &req.selected_option).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Grades one question ahead of submission and returns its explanation.
pub async fn check_question(
    State(pool): State<SqlitePool>,
    Path((id, question_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let review = exam::check_question(&pool, id, question_id).await?;

    Ok(Json(review))
}

/// Submits an attempt (confirmed by the user or timed out) and scores it.
pub async fn submit_attempt(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    req: Option<Json<SubmitAttemptRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let reason = req.map(|Json(r)| r.reason).unwrap_or_default();
    let attempt = exam::submit_attempt(&pool, id, reason).await?;

    Ok(Json(AttemptView::from_attempt(&attempt)?))
}

/// Re-scores an attempt.
pub async fn evaluate_attempt(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = exam::evaluate_attempt(&pool, id).await?;

    Ok(Json(AttemptView::from_attempt(&attempt)?))
}

/// Deletes an attempt from the history.
pub async fn delete_attempt(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !attempts::delete_attempt(&pool, id).await? {
        return Err(AppError::NotFound(format!("attempt {} not found", id)));
    }

    tracing::info!("Deleted attempt {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Clears the whole attempt history.
pub async fn clear_attempts(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let deleted = attempts::clear_attempts(&pool).await?;

    tracing::info!("Cleared {} attempts", deleted);
    Ok(Json(serde_json::json!({ "deleted": deleted })))
}
