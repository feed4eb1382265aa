// src/exam/selection.rs

//! Question selection strategies.
//!
//! Strategies are pure over a [`CandidatePool`] fetched up front by the
//! assembler: they never touch the database, and they never fail. A strategy
//! returns at most `requested` distinct questions, possibly fewer, and leaves
//! insufficiency to the assembler.

use std::collections::HashSet;

use rand::{RngCore, seq::SliceRandom};

use crate::models::{attempt::SelectorType, question::Question};

/// A question in scope together with its answer history.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub question: Question,
    /// Number of times the question appeared in any past attempt.
    pub attempts: i64,
    /// Number of past appearances graded incorrect.
    pub errors: i64,
}

/// Everything a strategy may choose from.
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    /// Questions in the resolved scope (exam grouping or subject).
    pub candidates: Vec<Candidate>,
    /// Every question in the subject, used when the scoped pool comes up short.
    pub subject_questions: Vec<Question>,
}

/// A policy choosing which questions populate an attempt.
pub trait SelectionStrategy: Send + Sync {
    /// Human-readable strategy name, used in logs.
    fn name(&self) -> &'static str;

    /// Returns up to `requested` distinct questions, in strategy order.
    fn select(&self, pool: &CandidatePool, requested: usize, rng: &mut dyn RngCore)
    -> Vec<Question>;
}

impl SelectorType {
    /// The strategy implementing this selector.
    pub fn strategy(&self) -> &'static dyn SelectionStrategy {
        match self {
            SelectorType::Random => &RandomSelector,
            SelectorType::ErrorWeighted => &ErrorWeightedSelector,
        }
    }
}

/// Least-attempted questions first, ties broken randomly.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl SelectionStrategy for RandomSelector {
    fn name(&self) -> &'static str {
        "random"
    }

    fn select(
        &self,
        pool: &CandidatePool,
        requested: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Question> {
        let mut ranked: Vec<&Candidate> = pool.candidates.iter().collect();
        // Shuffle first so the stable sort leaves equal counts in random order.
        ranked.shuffle(rng);
        ranked.sort_by_key(|c| c.attempts);

        let picked = take_distinct(ranked.into_iter().map(|c| &c.question), requested);
        if picked.len() >= requested {
            return picked;
        }

        let fallback = random_sample(&pool.subject_questions, requested, rng);
        if fallback.len() > picked.len() {
            tracing::debug!(
                "Scoped pool yielded {} of {} questions, using {} from the subject pool",
                picked.len(),
                requested,
                fallback.len()
            );
            fallback
        } else {
            picked
        }
    }
}

/// Most-failed questions first, least-attempted among equals.
///
/// Without any recorded error the weighting carries no information, so the
/// selection is delegated to [`RandomSelector`] and its result returned as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorWeightedSelector;

impl SelectionStrategy for ErrorWeightedSelector {
    fn name(&self) -> &'static str {
        "error_weighted"
    }

    fn select(
        &self,
        pool: &CandidatePool,
        requested: usize,
        rng: &mut dyn RngCore,
    ) -> Vec<Question> {
        let mut ranked: Vec<&Candidate> = pool.candidates.iter().collect();
        ranked.shuffle(rng);
        ranked.sort_by(|a, b| {
            b.errors
                .cmp(&a.errors)
                .then_with(|| a.attempts.cmp(&b.attempts))
        });

        let mut seen = HashSet::new();
        let top: Vec<&Candidate> = ranked
            .into_iter()
            .filter(|c| seen.insert(c.question.id))
            .take(requested)
            .collect();

        if top.iter().all(|c| c.errors == 0) {
            tracing::debug!("No error history in scope, delegating to random selection");
            return RandomSelector.select(pool, requested, rng);
        }

        top.into_iter().map(|c| c.question.clone()).collect()
    }
}

/// First `limit` questions of `questions`, skipping repeated ids.
pub(crate) fn take_distinct<'a>(
    questions: impl IntoIterator<Item = &'a Question>,
    limit: usize,
) -> Vec<Question> {
    let mut seen = HashSet::new();
    questions
        .into_iter()
        .filter(|q| seen.insert(q.id))
        .take(limit)
        .cloned()
        .collect()
}

/// Up to `limit` distinct questions in random order.
pub(crate) fn random_sample(
    questions: &[Question],
    limit: usize,
    rng: &mut dyn RngCore,
) -> Vec<Question> {
    let mut shuffled: Vec<&Question> = questions.iter().collect();
    shuffled.shuffle(rng);
    take_distinct(shuffled, limit)
}
