// src/exam/session.rs

//! Interactive session over one attempt.
//!
//! A session is the single writer of its attempt's answers. It keeps the
//! current question's selection in memory and persists it whenever the user
//! navigates, checks the question or finishes. Each of those writes commits on
//! its own, so a crash only loses the selection on screen.

use sqlx::SqlitePool;

use super::{
    ExamError,
    letters::normalize_selection,
    lifecycle::{check_question, record_selection, submit_attempt},
    timer::{AttemptTimer, TimerTick},
};
use crate::{
    models::attempt::{Attempt, AttemptQuestion, QuestionReview, SubmitReason},
    repository::attempts,
};

/// Result of a navigation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Now showing the question at this index.
    Moved(usize),
    /// `next` on the last question: the caller must confirm submission.
    ConfirmSubmit,
}

/// Result of a one-second tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionTick {
    Running(u32),
    Paused,
    /// The attempt is submitted and scored.
    Finished,
}

pub struct ExamSession {
    pool: SqlitePool,
    attempt: Attempt,
    index: usize,
    draft: String,
    timer: AttemptTimer,
}

impl ExamSession {
    /// Starts answering a freshly assembled (or still open) attempt.
    pub fn start(pool: SqlitePool, attempt: Attempt) -> Result<Self, ExamError> {
        if attempt.ended_at.is_some() {
            return Err(ExamError::AttemptClosed(attempt.id));
        }
        if attempt.questions.is_empty() {
            return Err(ExamError::NoQuestionsAvailable(attempt.subject.clone()));
        }

        let timer = AttemptTimer::from_secs(attempt.time_budget_secs());
        let mut session = Self {
            pool,
            attempt,
            index: 0,
            draft: String::new(),
            timer,
        };
        session.load_draft();
        Ok(session)
    }

    /// Reopens a stored attempt. The remaining time is not persisted, so the
    /// countdown restarts from the full budget.
    pub async fn resume(pool: SqlitePool, attempt_id: i64) -> Result<Self, ExamError> {
        let attempt = attempts::fetch_attempt(&pool, attempt_id)
            .await?
            .ok_or(ExamError::AttemptNotFound(attempt_id))?;
        Self::start(pool, attempt)
    }

    pub fn attempt(&self) -> &Attempt {
        &self.attempt
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.attempt.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempt.questions.is_empty()
    }

    pub fn current(&self) -> &AttemptQuestion {
        &self.attempt.questions[self.index]
    }

    /// Selection shown for the current question, not yet persisted.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn timer(&self) -> &AttemptTimer {
        &self.timer
    }

    pub fn is_finished(&self) -> bool {
        self.attempt.ended_at.is_some()
    }

    /// Replaces the current question's selection.
    pub fn select(&mut self, letters: &str) -> Result<(), ExamError> {
        self.ensure_interactive()?;
        let option_count = self.current().question.options.len();
        self.draft = normalize_selection(letters, option_count)?;
        Ok(())
    }

    pub async fn next(&mut self) -> Result<Step, ExamError> {
        self.ensure_interactive()?;
        self.save_current().await?;

        if self.index + 1 < self.len() {
            self.index += 1;
            self.load_draft();
            Ok(Step::Moved(self.index))
        } else {
            Ok(Step::ConfirmSubmit)
        }
    }

    pub async fn previous(&mut self) -> Result<Step, ExamError> {
        self.ensure_interactive()?;
        if self.index == 0 {
            return Ok(Step::Moved(0));
        }

        self.save_current().await?;
        self.index -= 1;
        self.load_draft();
        Ok(Step::Moved(self.index))
    }

    /// Persists and grades the current question, revealing its explanation.
    pub async fn check_current(&mut self) -> Result<QuestionReview, ExamError> {
        self.ensure_interactive()?;
        self.save_current().await?;

        let question_id = self.current().question_id;
        let review = check_question(&self.pool, self.attempt.id, question_id).await?;
        self.attempt.questions[self.index].is_correct = Some(review.is_correct);
        Ok(review)
    }

    pub fn pause(&mut self) {
        self.timer.pause();
    }

    /// Resumes the countdown; refused once time has run out.
    pub fn resume_timer(&mut self) -> bool {
        !self.is_finished() && self.timer.resume()
    }

    /// Advances the countdown by one second, submitting on expiry.
    pub async fn tick(&mut self) -> Result<SessionTick, ExamError> {
        if self.is_finished() {
            return Ok(SessionTick::Finished);
        }

        match self.timer.tick() {
            TimerTick::Running(remaining) => Ok(SessionTick::Running(remaining)),
            TimerTick::Paused => Ok(SessionTick::Paused),
            TimerTick::Expired => {
                tracing::info!("Attempt {} ran out of time", self.attempt.id);
                self.finish(SubmitReason::TimedOut).await?;
                Ok(SessionTick::Finished)
            }
        }
    }

    /// Saves the current answer, submits and scores the attempt.
    ///
    /// Finishing twice is a no-op returning the already scored attempt.
    pub async fn finish(&mut self, reason: SubmitReason) -> Result<&Attempt, ExamError> {
        if self.is_finished() {
            return Ok(&self.attempt);
        }

        self.timer.pause();
        self.save_current().await?;
        self.attempt = submit_attempt(&self.pool, self.attempt.id, reason).await?;
        Ok(&self.attempt)
    }

    fn ensure_interactive(&self) -> Result<(), ExamError> {
        if self.is_finished() {
            return Err(ExamError::AttemptClosed(self.attempt.id));
        }
        if self.timer.is_paused() {
            return Err(ExamError::SessionPaused);
        }
        Ok(())
    }

    async fn save_current(&mut self) -> Result<(), ExamError> {
        let question_id = self.current().question_id;
        record_selection(&self.pool, self.attempt.id, question_id, &self.draft).await?;
        self.attempt.questions[self.index].selected_option = Some(self.draft.clone());
        Ok(())
    }

    fn load_draft(&mut self) {
        self.draft = self.current().selected_option.clone().unwrap_or_default();
    }
}
