// src/models/attempt.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    exam::{AttemptStatus, ExamError},
    models::question::{PublicQuestion, Question},
};

/// Policy used to choose which questions populate an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorType {
    /// Least-attempted questions first, random tie-break.
    Random,
    /// Most-failed questions first, falling back to `Random` without error history.
    ErrorWeighted,
}

impl SelectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectorType::Random => "random",
            SelectorType::ErrorWeighted => "error_weighted",
        }
    }
}

impl fmt::Display for SelectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(SelectorType::Random),
            "error_weighted" => Ok(SelectorType::ErrorWeighted),
            other => Err(format!("unknown selector type '{}'", other)),
        }
    }
}

/// Request to assemble a new attempt. Transient, never persisted as such.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExamConfig {
    /// Concrete exam grouping. `None` means ad-hoc mode scoped by subject name.
    #[serde(default)]
    pub exam_id: Option<i64>,

    /// Subject name, matched case-insensitively.
    #[validate(length(min = 1, max = 200))]
    pub subject: String,

    /// When present, identifies the subject for subject-wide fallbacks.
    #[serde(default)]
    pub subject_id: Option<i64>,

    pub selector_type: SelectorType,

    #[validate(range(min = 1))]
    pub num_questions: i64,

    /// Question count requested by the error-weighted selector.
    #[validate(range(min = 1))]
    #[serde(default)]
    pub error_threshold: Option<i64>,

    /// Time budget in minutes, at most one day.
    #[validate(range(min = 1, max = 1440))]
    pub time_limit: i64,
}

impl ExamConfig {
    /// Ad-hoc random exam over a subject.
    pub fn random(subject: impl Into<String>, num_questions: i64, time_limit: i64) -> Self {
        Self {
            exam_id: None,
            subject: subject.into(),
            subject_id: None,
            selector_type: SelectorType::Random,
            num_questions,
            error_threshold: None,
            time_limit,
        }
    }

    /// Number of questions the configured selector should ask for.
    ///
    /// Random sizes from `num_questions`, error-weighted from `error_threshold`
    /// (or `num_questions` when no threshold was given).
    pub fn requested_count(&self) -> usize {
        let count = match self.selector_type {
            SelectorType::Random => self.num_questions,
            SelectorType::ErrorWeighted => self.error_threshold.unwrap_or(self.num_questions),
        };
        count.max(0) as usize
    }

    /// Validates the request, mapping failures onto `ExamError::InvalidConfig`.
    pub fn check(&self) -> Result<(), ExamError> {
        self.validate()
            .map_err(|e| ExamError::InvalidConfig(e.to_string()))
    }
}

/// One question inside an attempt, with the user's answer and its grading.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptQuestion {
    pub attempt_id: i64,
    pub question_id: i64,

    /// Presentation order within the attempt.
    pub position: i64,

    /// Selected letters, e.g. "A" or "AC". `None` until first touched,
    /// empty string when touched but unanswered.
    pub selected_option: Option<String>,

    pub is_correct: Option<bool>,
    pub score: Option<i64>,

    pub question: Question,
}

/// One instance of a user taking an assembled set of questions.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    pub id: i64,
    pub exam_id: Option<i64>,
    pub subject: String,
    pub selector_type: SelectorType,
    pub num_questions: i64,
    pub error_threshold: Option<i64>,
    /// Minutes.
    pub time_limit: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub score: Option<i64>,
    pub questions: Vec<AttemptQuestion>,
}

impl Attempt {
    pub fn question(&self, question_id: i64) -> Option<&AttemptQuestion> {
        self.questions.iter().find(|aq| aq.question_id == question_id)
    }

    /// Time budget in seconds. Saturates instead of wrapping on stored values
    /// too large for the countdown.
    pub fn time_budget_secs(&self) -> u32 {
        u32::try_from(self.time_limit.max(0))
            .unwrap_or(u32::MAX)
            .saturating_mul(60)
    }
}

/// History row for an attempt.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptSummary {
    pub id: i64,
    pub exam_id: Option<i64>,
    pub subject: String,
    pub selector_type: SelectorType,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub score: Option<i64>,
    pub total_questions: i64,
    pub status: AttemptStatus,
}

/// Query parameters for the attempt history.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryFilter {
    pub subject: Option<String>,
    pub limit: Option<i64>,
}

/// DTO for recording an answer.
#[derive(Debug, Deserialize)]
pub struct RecordSelectionRequest {
    /// Letters chosen by the user; empty string clears the answer.
    #[serde(default)]
    pub selected_option: String,
}

/// Why an attempt was submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitReason {
    /// The user confirmed after the last question.
    #[default]
    Confirmed,
    /// The time budget ran out.
    TimedOut,
}

/// DTO for submitting an attempt.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    pub reason: SubmitReason,
}

/// Result of checking a single question before the attempt is submitted.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionReview {
    pub question_id: i64,
    pub selected_option: String,
    pub correct_letters: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
    /// Per-option explanations keyed by letter, in storage order.
    pub option_explanations: Vec<(char, String)>,
}

/// Attempt question as sent to clients.
#[derive(Debug, Serialize)]
pub struct AttemptQuestionView {
    pub question_id: i64,
    pub position: i64,
    pub selected_option: Option<String>,
    pub is_correct: Option<bool>,
    pub score: Option<i64>,
    pub question: PublicQuestion,
    /// Only revealed once the attempt has ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_letters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// DTO for returning an attempt without leaking answers of an open attempt.
#[derive(Debug, Serialize)]
pub struct AttemptView {
    pub id: i64,
    pub exam_id: Option<i64>,
    pub subject: String,
    pub selector_type: SelectorType,
    pub num_questions: i64,
    pub time_limit: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub score: Option<i64>,
    pub status: AttemptStatus,
    pub questions: Vec<AttemptQuestionView>,
}

impl AttemptView {
    pub fn from_attempt(attempt: &Attempt) -> Result<Self, ExamError> {
        let reveal = attempt.ended_at.is_some();

        let questions = attempt
            .questions
            .iter()
            .map(|aq| {
                let correct_letters = if reveal {
                    Some(aq.question.kind()?.correct_letters().into_iter().collect())
                } else {
                    None
                };

                Ok(AttemptQuestionView {
                    question_id: aq.question_id,
                    position: aq.position,
                    selected_option: aq.selected_option.clone(),
                    is_correct: aq.is_correct,
                    score: aq.score,
                    question: PublicQuestion::from_question(&aq.question)?,
                    correct_letters,
                    explanation: if reveal {
                        aq.question.explanation.clone()
                    } else {
                        None
                    },
                })
            })
            .collect::<Result<Vec<_>, ExamError>>()?;

        Ok(Self {
            id: attempt.id,
            exam_id: attempt.exam_id,
            subject: attempt.subject.clone(),
            selector_type: attempt.selector_type,
            num_questions: attempt.num_questions,
            time_limit: attempt.time_limit,
            started_at: attempt.started_at,
            ended_at: attempt.ended_at,
            score: attempt.score,
            status: attempt.status(),
            questions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_count_is_explicit_per_selector() {
        let mut config = ExamConfig::random("Demo", 10, 30);
        assert_eq!(config.requested_count(), 10);

        config.selector_type = SelectorType::ErrorWeighted;
        assert_eq!(config.requested_count(), 10);

        config.error_threshold = Some(4);
        assert_eq!(config.requested_count(), 4);
    }

    #[test]
    fn test_config_validation() {
        assert!(ExamConfig::random("Demo", 3, 10).check().is_ok());
        assert!(matches!(
            ExamConfig::random("Demo", 0, 10).check(),
            Err(ExamError::InvalidConfig(_))
        ));
        assert!(ExamConfig::random("Demo", 3, 0).check().is_err());
        assert!(ExamConfig::random("", 3, 10).check().is_err());
    }

    #[test]
    fn test_time_limit_is_capped_at_one_day() {
        assert!(ExamConfig::random("Demo", 1, 1440).check().is_ok());
        assert!(matches!(
            ExamConfig::random("Demo", 1, 1441).check(),
            Err(ExamError::InvalidConfig(_))
        ));
        assert!(ExamConfig::random("Demo", 1, (1 << 32) + 1).check().is_err());
    }

    fn attempt_with_time_limit(time_limit: i64) -> Attempt {
        Attempt {
            id: 1,
            exam_id: None,
            subject: "Demo".to_string(),
            selector_type: SelectorType::Random,
            num_questions: 1,
            error_threshold: None,
            time_limit,
            started_at: Utc::now(),
            ended_at: None,
            score: None,
            questions: Vec::new(),
        }
    }

    #[test]
    fn test_time_budget_saturates_instead_of_truncating() {
        assert_eq!(attempt_with_time_limit(10).time_budget_secs(), 600);
        assert_eq!(attempt_with_time_limit(-5).time_budget_secs(), 0);
        assert_eq!(attempt_with_time_limit((1 << 32) + 1).time_budget_secs(), u32::MAX);
    }

    #[test]
    fn test_selector_type_round_trips_through_storage_names() {
        for selector in [SelectorType::Random, SelectorType::ErrorWeighted] {
            assert_eq!(selector.as_str().parse::<SelectorType>().unwrap(), selector);
        }
        assert!("ALEATORIO".parse::<SelectorType>().is_err());
    }

    #[test]
    fn test_exam_config_deserializes_with_defaults() {
        let config: ExamConfig = serde_json::from_value(serde_json::json!({
            "subject": "Demo",
            "selector_type": "error_weighted",
            "num_questions": 5,
            "time_limit": 10
        }))
        .unwrap();
        assert_eq!(config.exam_id, None);
        assert_eq!(config.selector_type, SelectorType::ErrorWeighted);
        assert_eq!(config.requested_count(), 5);
    }
}
