// src/exam/error.rs

//! Error taxonomy for attempt assembly, scoring and the attempt lifecycle.

use thiserror::Error;

/// Errors raised by the exam core.
///
/// Selection shortfalls never show up here: strategies recover locally through
/// their fallbacks and only total exhaustion crosses this boundary.
#[derive(Debug, Error)]
pub enum ExamError {
    /// Every selection path (primary and fallback) produced zero questions.
    #[error("no questions available for subject {0}")]
    NoQuestionsAvailable(String),

    #[error("attempt {0} not found")]
    AttemptNotFound(i64),

    #[error("question {question_id} is not part of attempt {attempt_id}")]
    QuestionNotInAttempt { attempt_id: i64, question_id: i64 },

    #[error("invalid exam configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// The question has more options than there are letters to label them.
    #[error("question {question_id} has {count} options, more than can be labelled")]
    TooManyOptions { question_id: i64, count: usize },

    /// The attempt has been submitted and no longer accepts answers.
    #[error("attempt {0} has already been submitted")]
    AttemptClosed(i64),

    #[error("the exam session is paused")]
    SessionPaused,

    /// Repository failures propagate unchanged.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ExamError {
    /// Returns `true` for errors caused by a missing attempt or question.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ExamError::NoQuestionsAvailable(_)
                | ExamError::AttemptNotFound(_)
                | ExamError::QuestionNotInAttempt { .. }
        )
    }
}
