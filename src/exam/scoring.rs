// src/exam/scoring.rs

//! Scoring engine.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{ExamError, letters::selection_set};
use crate::{
    models::{attempt::Attempt, question::QuestionKind},
    repository::attempts,
};

/// Grades one answer against a question kind.
///
/// Single-answer questions need exactly the correct letter. Multi-answer
/// questions need exactly the correct set, with no credit for subsets or
/// supersets. An unanswered question is always wrong.
pub fn grade(kind: &QuestionKind, selected: Option<&str>) -> bool {
    let selected = match selected {
        Some(s) if !s.is_empty() => s,
        _ => return false,
    };

    match kind {
        QuestionKind::SingleAnswer { correct } => {
            let mut chars = selected.chars();
            chars.next() == Some(*correct) && chars.next().is_none()
        }
        QuestionKind::MultiAnswer { correct } => selection_set(selected) == *correct,
    }
}

/// Recomputes every question's correctness and the total score in place.
///
/// Stamps `ended_at` with `now` only if it is still unset. Returns the total.
pub fn score_attempt(attempt: &mut Attempt, now: DateTime<Utc>) -> Result<i64, ExamError> {
    let mut total = 0;

    for aq in &mut attempt.questions {
        let kind = aq.question.kind()?;
        let is_correct = grade(&kind, aq.selected_option.as_deref());
        let score = if is_correct { 1 } else { 0 };

        aq.is_correct = Some(is_correct);
        aq.score = Some(score);
        total += score;
    }

    attempt.score = Some(total);
    if attempt.ended_at.is_none() {
        attempt.ended_at = Some(now);
    }

    Ok(total)
}

/// Scores a stored attempt and persists the result.
///
/// Re-scoring an ended attempt recomputes correctness and score but keeps the
/// original completion time.
pub async fn evaluate_attempt(pool: &SqlitePool, attempt_id: i64) -> Result<Attempt, ExamError> {
    let mut attempt = attempts::fetch_attempt(pool, attempt_id)
        .await?
        .ok_or(ExamError::AttemptNotFound(attempt_id))?;

    let total = score_attempt(&mut attempt, Utc::now())?;
    attempts::save_grades(pool, &attempt).await?;

    tracing::info!(
        "Evaluated attempt {}: {}/{}",
        attempt_id,
        total,
        attempt.questions.len()
    );

    Ok(attempt)
}
