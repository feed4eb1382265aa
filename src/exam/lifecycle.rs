// src/exam/lifecycle.rs

//! Attempt lifecycle: Created -> InProgress -> Submitted -> Scored.
//!
//! Submission always triggers scoring in the same call, so Submitted is only
//! observable if scoring failed after the completion time was stamped.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use super::{
    ExamError,
    letters::{self, normalize_selection},
    scoring::{evaluate_attempt, grade},
};
use crate::{
    models::attempt::{Attempt, AttemptQuestion, QuestionReview, SubmitReason},
    repository::attempts,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Assembled, no answer recorded yet.
    Created,
    /// At least one answer has been written.
    InProgress,
    /// Completion time stamped, not scored yet.
    Submitted,
    /// Scored at least once.
    Scored,
}

impl AttemptStatus {
    /// Whether the attempt still accepts answers.
    pub fn is_open(&self) -> bool {
        matches!(self, AttemptStatus::Created | AttemptStatus::InProgress)
    }
}

impl Attempt {
    pub fn status(&self) -> AttemptStatus {
        status_of(
            self.ended_at.is_some(),
            self.score.is_some(),
            self.questions.iter().any(|aq| aq.selected_option.is_some()),
        )
    }
}

pub(crate) fn status_of(ended: bool, scored: bool, touched: bool) -> AttemptStatus {
    match (ended, scored, touched) {
        (true, true, _) => AttemptStatus::Scored,
        (true, false, _) => AttemptStatus::Submitted,
        (false, _, true) => AttemptStatus::InProgress,
        (false, _, false) => AttemptStatus::Created,
    }
}

/// Persists one answer as an immediate, independent write.
///
/// Repeated calls overwrite the previous answer. The selection is normalized to
/// sorted uppercase letters of the question's options; an empty string records
/// "unanswered". Refused once the attempt has been submitted.
pub async fn record_selection(
    pool: &SqlitePool,
    attempt_id: i64,
    question_id: i64,
    selected_option: &str,
) -> Result<(), ExamError> {
    let header = attempts::fetch_header(pool, attempt_id)
        .await?
        .ok_or(ExamError::AttemptNotFound(attempt_id))?;

    if header.ended_at.is_some() {
        return Err(ExamError::AttemptClosed(attempt_id));
    }

    let option_count = attempts::option_count(pool, attempt_id, question_id)
        .await?
        .ok_or(ExamError::QuestionNotInAttempt {
            attempt_id,
            question_id,
        })?;

    letters::labels_for(question_id, option_count)?;
    let normalized = normalize_selection(selected_option, option_count)?;

    attempts::update_selection(pool, attempt_id, question_id, &normalized).await?;

    tracing::debug!(
        "Attempt {} question {}: recorded '{}'",
        attempt_id,
        question_id,
        normalized
    );

    Ok(())
}

/// Submits an attempt and scores it immediately.
///
/// The completion time is stamped only on the first submission, so a late
/// timeout after a confirmed submission changes nothing but the re-score.
pub async fn submit_attempt(
    pool: &SqlitePool,
    attempt_id: i64,
    reason: SubmitReason,
) -> Result<Attempt, ExamError> {
    if attempts::mark_ended(pool, attempt_id, Utc::now()).await? {
        tracing::info!("Attempt {} submitted ({:?})", attempt_id, reason);
    }

    evaluate_attempt(pool, attempt_id).await
}

/// Grades one question on demand and records its correctness.
///
/// The attempt's total score and completion time are left alone.
pub async fn check_question(
    pool: &SqlitePool,
    attempt_id: i64,
    question_id: i64,
) -> Result<QuestionReview, ExamError> {
    let attempt = attempts::fetch_attempt(pool, attempt_id)
        .await?
        .ok_or(ExamError::AttemptNotFound(attempt_id))?;

    let aq = attempt
        .question(question_id)
        .ok_or(ExamError::QuestionNotInAttempt {
            attempt_id,
            question_id,
        })?;

    let review = review_question(aq)?;
    attempts::save_question_grade(pool, attempt_id, question_id, review.is_correct).await?;

    Ok(review)
}

/// Builds the review of one answered question.
pub fn review_question(aq: &AttemptQuestion) -> Result<QuestionReview, ExamError> {
    let letters = aq.question.option_letters()?;
    let kind = aq.question.kind()?;
    let selected = aq.selected_option.clone().unwrap_or_default();

    Ok(QuestionReview {
        question_id: aq.question_id,
        is_correct: grade(&kind, Some(&selected)),
        selected_option: selected,
        correct_letters: kind.correct_letters().into_iter().collect(),
        explanation: aq.question.explanation.clone(),
        option_explanations: letters
            .into_iter()
            .zip(&aq.question.options)
            .filter_map(|(letter, option)| {
                option
                    .explanation
                    .as_ref()
                    .filter(|e| !e.trim().is_empty())
                    .map(|e| (letter, e.clone()))
            })
            .collect(),
    })
}
