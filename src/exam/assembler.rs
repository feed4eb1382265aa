// src/exam/assembler.rs

//! Attempt assembly: scope resolution, selection, fallback, shuffle, persistence.

use std::collections::HashSet;

use chrono::Utc;
use rand::{RngCore, seq::SliceRandom};
use sqlx::SqlitePool;

use super::{
    ExamError,
    selection::{CandidatePool, random_sample},
};
use crate::{
    models::{
        attempt::{Attempt, ExamConfig},
        question::Question,
    },
    repository::{
        attempts,
        questions::{self, SubjectRef},
    },
};

/// Assembles and persists a new attempt for `config`.
///
/// Fails with `NoQuestionsAvailable` when neither the configured selector nor
/// the subject-wide fallback finds a single question. Repository errors
/// propagate unchanged.
pub async fn create_attempt(pool: &SqlitePool, config: &ExamConfig) -> Result<Attempt, ExamError> {
    config.check()?;

    let candidate_pool = load_candidate_pool(pool, config).await?;

    let questions = {
        let mut rng = rand::thread_rng();
        assemble(config, &candidate_pool, &mut rng)?
    };

    let attempt_id = attempts::insert_attempt(pool, config, Utc::now(), &questions).await?;

    tracing::info!(
        "Created attempt {} for subject '{}' with {} questions ({} selector)",
        attempt_id,
        config.subject,
        questions.len(),
        config.selector_type
    );

    attempts::fetch_attempt(pool, attempt_id)
        .await?
        .ok_or(ExamError::AttemptNotFound(attempt_id))
}

/// Fetches the scoped candidates and the subject-wide pool for `config`.
pub async fn load_candidate_pool(
    pool: &SqlitePool,
    config: &ExamConfig,
) -> Result<CandidatePool, sqlx::Error> {
    let candidates = match config.exam_id {
        Some(exam_id) => questions::candidates_in_exam(pool, exam_id).await?,
        None => questions::candidates_in_subject(pool, &config.subject).await?,
    };

    let subject_questions = match (config.exam_id, config.subject_id) {
        (_, Some(subject_id)) => {
            questions::questions_in_subject(pool, SubjectRef::Id(subject_id)).await?
        }
        // Ad-hoc candidates already are the whole subject.
        (None, None) => candidates.iter().map(|c| c.question.clone()).collect(),
        (Some(_), None) => {
            questions::questions_in_subject(pool, SubjectRef::Name(&config.subject)).await?
        }
    };

    Ok(CandidatePool {
        candidates,
        subject_questions,
    })
}

/// Chooses the final, shuffled question list for an attempt.
///
/// 1. Runs the configured strategy with the config's requested count.
/// 2. If that finds nothing, samples the subject pool up to `num_questions`.
/// 3. Collapses repeated ids and permutes the result so presentation order
///    says nothing about why a question was chosen.
pub fn assemble(
    config: &ExamConfig,
    pool: &CandidatePool,
    rng: &mut dyn RngCore,
) -> Result<Vec<Question>, ExamError> {
    let strategy = config.selector_type.strategy();
    let requested = config.requested_count();

    let mut selected = strategy.select(pool, requested, rng);
    tracing::debug!(
        "{} selector picked {} of {} requested questions",
        strategy.name(),
        selected.len(),
        requested
    );

    if selected.is_empty() {
        tracing::warn!(
            "Selector found no questions for '{}', sampling the whole subject",
            config.subject
        );
        selected = random_sample(
            &pool.subject_questions,
            config.num_questions.max(0) as usize,
            rng,
        );
    }

    if selected.is_empty() {
        tracing::warn!("No questions available for subject '{}'", config.subject);
        return Err(ExamError::NoQuestionsAvailable(config.subject.clone()));
    }

    let mut seen = HashSet::new();
    selected.retain(|q| seen.insert(q.id));
    selected.shuffle(rng);

    Ok(selected)
}
