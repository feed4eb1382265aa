// src/models/question.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::exam::{ExamError, letters};

/// Represents the 'subjects' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Subject {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// Subject listing row with the size of its question pool.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SubjectSummary {
    pub id: i64,
    pub name: String,
    pub question_count: i64,
}

/// Represents the 'answer_options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub question_id: i64,

    /// Storage position. Decides the option's letter, see `exam::letters`.
    pub position: i64,

    pub text: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub subject_id: i64,

    /// The text shown to the user.
    pub prompt: String,

    /// Explanation of the correct answer, revealed after checking.
    pub explanation: Option<String>,

    /// Difficulty on a 0-5 scale.
    pub difficulty: i64,

    pub reference: Option<String>,
    pub section: Option<String>,

    /// Options in storage order. Loaded separately from `answer_options`.
    #[sqlx(skip)]
    #[serde(default)]
    pub options: Vec<AnswerOption>,
}

/// Whether a question expects one letter or an exact set of letters.
///
/// Derived from the options, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionKind {
    SingleAnswer { correct: char },
    MultiAnswer { correct: BTreeSet<char> },
}

impl QuestionKind {
    /// The letters that make up a correct answer.
    pub fn correct_letters(&self) -> BTreeSet<char> {
        match self {
            QuestionKind::SingleAnswer { correct } => BTreeSet::from([*correct]),
            QuestionKind::MultiAnswer { correct } => correct.clone(),
        }
    }
}

impl Question {
    /// Letters of the options in storage order.
    pub fn option_letters(&self) -> Result<Vec<char>, ExamError> {
        letters::labels_for(self.id, self.options.len())
    }

    /// Derives the question kind from which options are marked correct.
    ///
    /// Exactly one correct option makes a single-answer question; anything else
    /// (including none) is a multi-answer question scored by exact set match.
    pub fn kind(&self) -> Result<QuestionKind, ExamError> {
        let labels = self.option_letters()?;
        let correct: BTreeSet<char> = labels
            .into_iter()
            .zip(&self.options)
            .filter(|(_, option)| option.is_correct)
            .map(|(letter, _)| letter)
            .collect();

        let single = if correct.len() == 1 {
            correct.first().copied()
        } else {
            None
        };

        match single {
            Some(letter) => Ok(QuestionKind::SingleAnswer { correct: letter }),
            None => Ok(QuestionKind::MultiAnswer { correct }),
        }
    }
}

/// Option payload without its answer key, for questions still being answered.
#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub letter: char,
    pub text: String,
}

/// DTO for sending a question to a client that must not see the answers.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub prompt: String,
    pub difficulty: i64,
    pub section: Option<String>,
    /// Number of letters the answer consists of, so the client can cap selections.
    pub expected_selections: usize,
    pub options: Vec<PublicOption>,
}

impl PublicQuestion {
    pub fn from_question(question: &Question) -> Result<Self, ExamError> {
        let letters = question.option_letters()?;
        let expected_selections = question.kind()?.correct_letters().len();

        Ok(Self {
            id: question.id,
            prompt: question.prompt.clone(),
            difficulty: question.difficulty,
            section: question.section.clone(),
            expected_selections,
            options: letters
                .into_iter()
                .zip(&question.options)
                .map(|(letter, option)| PublicOption {
                    letter,
                    text: option.text.clone(),
                })
                .collect(),
        })
    }
}

/// DTO for one option of a new question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl NewOption {
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
            explanation: None,
        }
    }
}

/// DTO for creating a new question in a subject.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewQuestion {
    pub subject_id: i64,
    #[validate(length(min = 1, max = 5000))]
    pub prompt: String,
    #[validate(length(max = 5000))]
    pub explanation: Option<String>,
    #[validate(range(min = 0, max = 5))]
    #[serde(default)]
    pub difficulty: i64,
    pub reference: Option<String>,
    pub section: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: Vec<NewOption>,
}

fn validate_options(options: &[NewOption]) -> Result<(), validator::ValidationError> {
    if options.is_empty() {
        return Err(validator::ValidationError::new("options_cannot_be_empty"));
    }
    if options.len() > letters::MAX_OPTIONS {
        return Err(validator::ValidationError::new("too_many_options"));
    }
    for opt in options {
        if opt.text.is_empty() || opt.text.len() > 1000 {
            return Err(validator::ValidationError::new("invalid_option_text"));
        }
    }
    if !options.iter().any(|o| o.is_correct) {
        return Err(validator::ValidationError::new("no_correct_option"));
    }
    Ok(())
}
