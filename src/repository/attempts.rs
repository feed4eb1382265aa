// src/repository/attempts.rs

//! Attempt store: durable Attempt / AttemptQuestion rows.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use super::questions;
use crate::{
    exam::lifecycle::status_of,
    models::{
        attempt::{
            Attempt, AttemptQuestion, AttemptSummary, ExamConfig, HistoryFilter, SelectorType,
        },
        question::Question,
    },
};

const DEFAULT_HISTORY_LIMIT: i64 = 200;
const MAX_HISTORY_LIMIT: i64 = 10_000;

/// Helper struct for fetching attempt rows.
#[derive(FromRow)]
struct AttemptRow {
    id: i64,
    exam_id: Option<i64>,
    subject: String,
    selector_type: String,
    num_questions: i64,
    error_threshold: Option<i64>,
    time_limit: i64,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    score: Option<i64>,
}

#[derive(FromRow)]
struct AttemptQuestionRow {
    attempt_id: i64,
    question_id: i64,
    position: i64,
    selected_option: Option<String>,
    is_correct: Option<bool>,
    score: Option<i64>,
}

#[derive(FromRow)]
struct SummaryRow {
    id: i64,
    exam_id: Option<i64>,
    subject: String,
    selector_type: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    score: Option<i64>,
    total_questions: i64,
    touched: i64,
}

/// Attempt fields needed to decide whether it still accepts answers.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptHeader {
    pub ended_at: Option<DateTime<Utc>>,
}

fn parse_selector(raw: &str) -> Result<SelectorType, sqlx::Error> {
    raw.parse::<SelectorType>()
        .map_err(|e| sqlx::Error::Decode(e.into()))
}

/// Persists a new attempt and one row per question, in the given order, as a
/// single transaction.
pub async fn insert_attempt(
    pool: &SqlitePool,
    config: &ExamConfig,
    started_at: DateTime<Utc>,
    questions: &[Question],
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let attempt_id = sqlx::query(
        r#"
        INSERT INTO attempts
            (exam_id, subject, selector_type, num_questions, error_threshold,
             time_limit, started_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(config.exam_id)
    .bind(&config.subject)
    .bind(config.selector_type.as_str())
    .bind(config.num_questions)
    .bind(config.error_threshold)
    .bind(config.time_limit)
    .bind(started_at)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for (position, question) in questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO attempt_questions (attempt_id, question_id, position) VALUES (?, ?, ?)",
        )
        .bind(attempt_id)
        .bind(question.id)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(attempt_id)
}

/// Loads an attempt with its questions and their options.
pub async fn fetch_attempt(
    pool: &SqlitePool,
    attempt_id: i64,
) -> Result<Option<Attempt>, sqlx::Error> {
    let Some(row) = sqlx::query_as::<_, AttemptRow>(
        r#"
        SELECT id, exam_id, subject, selector_type, num_questions, error_threshold,
               time_limit, started_at, ended_at, score
        FROM attempts
        WHERE id = ?
        "#,
    )
    .bind(attempt_id)
    .fetch_optional(pool)
    .await?
    else {
        return Ok(None);
    };

    let aq_rows = sqlx::query_as::<_, AttemptQuestionRow>(
        r#"
        SELECT attempt_id, question_id, position, selected_option, is_correct, score
        FROM attempt_questions
        WHERE attempt_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(attempt_id)
    .fetch_all(pool)
    .await?;

    let ids: Vec<i64> = aq_rows.iter().map(|r| r.question_id).collect();
    let mut by_id: HashMap<i64, Question> = questions::questions_by_ids(pool, &ids)
        .await?
        .into_iter()
        .map(|q| (q.id, q))
        .collect();

    let questions = aq_rows
        .into_iter()
        .filter_map(|r| {
            by_id.remove(&r.question_id).map(|question| AttemptQuestion {
                attempt_id: r.attempt_id,
                question_id: r.question_id,
                position: r.position,
                selected_option: r.selected_option,
                is_correct: r.is_correct,
                score: r.score,
                question,
            })
        })
        .collect();

    Ok(Some(Attempt {
        id: row.id,
        exam_id: row.exam_id,
        subject: row.subject,
        selector_type: parse_selector(&row.selector_type)?,
        num_questions: row.num_questions,
        error_threshold: row.error_threshold,
        time_limit: row.time_limit,
        started_at: row.started_at,
        ended_at: row.ended_at,
        score: row.score,
        questions,
    }))
}

pub async fn fetch_header(
    pool: &SqlitePool,
    attempt_id: i64,
) -> Result<Option<AttemptHeader>, sqlx::Error> {
    sqlx::query_as::<_, AttemptHeader>("SELECT ended_at FROM attempts WHERE id = ?")
        .bind(attempt_id)
        .fetch_optional(pool)
        .await
}

/// Number of options of a question, if the question belongs to the attempt.
pub async fn option_count(
    pool: &SqlitePool,
    attempt_id: i64,
    question_id: i64,
) -> Result<Option<usize>, sqlx::Error> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(o.id)
        FROM attempt_questions aq
        LEFT JOIN answer_options o ON o.question_id = aq.question_id
        WHERE aq.attempt_id = ? AND aq.question_id = ?
        GROUP BY aq.id
        "#,
    )
    .bind(attempt_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await?;

    Ok(count.map(|c| c.max(0) as usize))
}

/// Overwrites the stored answer of one attempt question.
pub async fn update_selection(
    pool: &SqlitePool,
    attempt_id: i64,
    question_id: i64,
    selected_option: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE attempt_questions SET selected_option = ? WHERE attempt_id = ? AND question_id = ?",
    )
    .bind(selected_option)
    .bind(attempt_id)
    .bind(question_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Stamps the completion time unless one is already set.
///
/// Returns `true` if this call set it.
pub async fn mark_ended(
    pool: &SqlitePool,
    attempt_id: i64,
    ended_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE attempts SET ended_at = ? WHERE id = ? AND ended_at IS NULL")
        .bind(ended_at)
        .bind(attempt_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Writes per-question grades, the total score and the completion time in one
/// transaction.
pub async fn save_grades(pool: &SqlitePool, attempt: &Attempt) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for aq in &attempt.questions {
        sqlx::query(
            r#"
            UPDATE attempt_questions
            SET is_correct = ?, score = ?
            WHERE attempt_id = ? AND question_id = ?
            "#,
        )
        .bind(aq.is_correct)
        .bind(aq.score)
        .bind(attempt.id)
        .bind(aq.question_id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE attempts SET score = ?, ended_at = ? WHERE id = ?")
        .bind(attempt.score)
        .bind(attempt.ended_at)
        .bind(attempt.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await
}

/// Records the correctness of a single question checked before submission.
pub async fn save_question_grade(
    pool: &SqlitePool,
    attempt_id: i64,
    question_id: i64,
    is_correct: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE attempt_questions SET is_correct = ? WHERE attempt_id = ? AND question_id = ?",
    )
    .bind(is_correct)
    .bind(attempt_id)
    .bind(question_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Attempt history, newest first.
pub async fn list_attempts(
    pool: &SqlitePool,
    filter: &HistoryFilter,
) -> Result<Vec<AttemptSummary>, sqlx::Error> {
    let limit = filter
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows = sqlx::query_as::<_, SummaryRow>(
        r#"
        SELECT
            a.id, a.exam_id, a.subject, a.selector_type, a.started_at, a.ended_at, a.score,
            COUNT(aq.id) AS total_questions,
            COALESCE(SUM(CASE WHEN aq.selected_option IS NOT NULL THEN 1 ELSE 0 END), 0) AS touched
        FROM attempts a
        LEFT JOIN attempt_questions aq ON aq.attempt_id = a.id
        WHERE (?1 IS NULL OR a.subject = ?1 COLLATE unicode_nocase)
        GROUP BY a.id
        ORDER BY a.started_at DESC, a.id DESC
        LIMIT ?2
        "#,
    )
    .bind(filter.subject.as_deref())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|r| {
            Ok(AttemptSummary {
                id: r.id,
                exam_id: r.exam_id,
                subject: r.subject,
                selector_type: parse_selector(&r.selector_type)?,
                status: status_of(r.ended_at.is_some(), r.score.is_some(), r.touched > 0),
                started_at: r.started_at,
                ended_at: r.ended_at,
                score: r.score,
                total_questions: r.total_questions,
            })
        })
        .collect()
}

/// Deletes one attempt and its rows. Returns `false` if it did not exist.
pub async fn delete_attempt(pool: &SqlitePool, attempt_id: i64) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attempt_questions WHERE attempt_id = ?")
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM attempts WHERE id = ?")
        .bind(attempt_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the whole attempt history. Returns the number of attempts removed.
pub async fn clear_attempts(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM attempt_questions")
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM attempts").execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}
