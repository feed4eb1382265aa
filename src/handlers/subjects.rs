// src/handlers/subjects.rs

use axum::{Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;

use crate::{error::AppError, repository::questions};

/// Lists subjects with the size of their question pools.
pub async fn list_subjects(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let subjects = questions::list_subjects(&pool).await.map_err(|e| {
        tracing::error!("Failed to list subjects: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(subjects))
}
