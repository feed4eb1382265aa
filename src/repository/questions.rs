// src/repository/questions.rs

//! Question repository: read queries over the bank plus the writes used to
//! seed it.

use std::collections::HashMap;

use sqlx::{FromRow, QueryBuilder, Sqlite, SqlitePool};

use crate::{
    exam::Candidate,
    models::question::{AnswerOption, NewQuestion, Question, Subject, SubjectSummary},
};

/// SQLite caps bound parameters per statement; stay well below it.
const MAX_BINDS: usize = 500;

/// Subject lookup by id or by case-insensitive name.
#[derive(Debug, Clone, Copy)]
pub enum SubjectRef<'a> {
    Id(i64),
    Name(&'a str),
}

/// Question row joined with its answer history.
#[derive(FromRow)]
struct CandidateRow {
    #[sqlx(flatten)]
    question: Question,
    attempts: i64,
    errors: i64,
}

/// Per-question aggregate over every recorded attempt question.
const HISTORY_JOIN: &str = r#"
    LEFT JOIN (
        SELECT
            question_id,
            COUNT(*) AS attempts,
            SUM(CASE WHEN is_correct = 0 THEN 1 ELSE 0 END) AS errors
        FROM attempt_questions
        GROUP BY question_id
    ) h ON h.question_id = q.id
"#;

/// All questions in a subject, with options, in id order.
pub async fn questions_in_subject(
    pool: &SqlitePool,
    subject: SubjectRef<'_>,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut questions = match subject {
        SubjectRef::Id(id) => {
            sqlx::query_as::<_, Question>(
                r#"
                SELECT q.id, q.subject_id, q.prompt, q.explanation, q.difficulty,
                       q.reference, q.section
                FROM questions q
                WHERE q.subject_id = ?
                ORDER BY q.id
                "#,
            )
            .bind(id)
            .fetch_all(pool)
            .await?
        }
        SubjectRef::Name(name) => {
            sqlx::query_as::<_, Question>(
                r#"
                SELECT q.id, q.subject_id, q.prompt, q.explanation, q.difficulty,
                       q.reference, q.section
                FROM questions q
                JOIN subjects s ON s.id = q.subject_id
                WHERE s.name = ? COLLATE unicode_nocase
                ORDER BY q.id
                "#,
            )
            .bind(name)
            .fetch_all(pool)
            .await?
        }
    };

    attach_options(pool, &mut questions).await?;
    Ok(questions)
}

/// Questions of a subject (matched by name) with attempt and error counts.
pub async fn candidates_in_subject(
    pool: &SqlitePool,
    subject: &str,
) -> Result<Vec<Candidate>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT q.id, q.subject_id, q.prompt, q.explanation, q.difficulty, q.reference, q.section,
               COALESCE(h.attempts, 0) AS attempts,
               COALESCE(h.errors, 0) AS errors
        FROM questions q
        JOIN subjects s ON s.id = q.subject_id
        {}
        WHERE s.name = ? COLLATE unicode_nocase
        ORDER BY q.id
        "#,
        HISTORY_JOIN
    );

    let rows = sqlx::query_as::<_, CandidateRow>(&sql)
        .bind(subject)
        .fetch_all(pool)
        .await?;

    into_candidates(pool, rows).await
}

/// Questions grouped under an exam with attempt and error counts.
pub async fn candidates_in_exam(
    pool: &SqlitePool,
    exam_id: i64,
) -> Result<Vec<Candidate>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT q.id, q.subject_id, q.prompt, q.explanation, q.difficulty, q.reference, q.section,
               COALESCE(h.attempts, 0) AS attempts,
               COALESCE(h.errors, 0) AS errors
        FROM exam_questions eq
        JOIN questions q ON q.id = eq.question_id
        {}
        WHERE eq.exam_id = ?
        ORDER BY eq.position, q.id
        "#,
        HISTORY_JOIN
    );

    let rows = sqlx::query_as::<_, CandidateRow>(&sql)
        .bind(exam_id)
        .fetch_all(pool)
        .await?;

    into_candidates(pool, rows).await
}

/// Loads questions by id, with options. Missing ids are skipped.
pub async fn questions_by_ids(
    pool: &SqlitePool,
    ids: &[i64],
) -> Result<Vec<Question>, sqlx::Error> {
    let mut questions = Vec::with_capacity(ids.len());

    for chunk in ids.chunks(MAX_BINDS) {
        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, subject_id, prompt, explanation, difficulty, reference, section \
             FROM questions WHERE id IN (",
        );
        let mut separated = query_builder.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows: Vec<Question> = query_builder.build_query_as().fetch_all(pool).await?;
        questions.extend(rows);
    }

    attach_options(pool, &mut questions).await?;
    Ok(questions)
}

async fn into_candidates(
    pool: &SqlitePool,
    rows: Vec<CandidateRow>,
) -> Result<Vec<Candidate>, sqlx::Error> {
    let mut questions: Vec<Question> = Vec::with_capacity(rows.len());
    let mut history = Vec::with_capacity(rows.len());
    for row in rows {
        history.push((row.attempts, row.errors));
        questions.push(row.question);
    }

    attach_options(pool, &mut questions).await?;

    Ok(questions
        .into_iter()
        .zip(history)
        .map(|(question, (attempts, errors))| Candidate {
            question,
            attempts,
            errors,
        })
        .collect())
}

/// Fills `options` of every question, in storage order.
async fn attach_options(pool: &SqlitePool, questions: &mut [Question]) -> Result<(), sqlx::Error> {
    if questions.is_empty() {
        return Ok(());
    }

    let ids: Vec<i64> = questions.iter().map(|q| q.id).collect();
    let mut by_question: HashMap<i64, Vec<AnswerOption>> = HashMap::new();

    for chunk in ids.chunks(MAX_BINDS) {
        let mut query_builder = QueryBuilder::<Sqlite>::new(
            "SELECT id, question_id, position, text, is_correct, explanation \
             FROM answer_options WHERE question_id IN (",
        );
        let mut separated = query_builder.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY question_id, position, id");

        let options: Vec<AnswerOption> = query_builder.build_query_as().fetch_all(pool).await?;
        for option in options {
            by_question.entry(option.question_id).or_default().push(option);
        }
    }

    for question in questions.iter_mut() {
        question.options = by_question.remove(&question.id).unwrap_or_default();
    }

    Ok(())
}

/// Lists subjects with the number of questions in each.
pub async fn list_subjects(pool: &SqlitePool) -> Result<Vec<SubjectSummary>, sqlx::Error> {
    sqlx::query_as::<_, SubjectSummary>(
        r#"
        SELECT s.id, s.name, COUNT(q.id) AS question_count
        FROM subjects s
        LEFT JOIN questions q ON q.subject_id = s.id
        GROUP BY s.id, s.name
        ORDER BY s.name
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn create_subject(
    pool: &SqlitePool,
    name: &str,
    description: Option<&str>,
) -> Result<Subject, sqlx::Error> {
    let id = sqlx::query("INSERT INTO subjects (name, description) VALUES (?, ?)")
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?
        .last_insert_rowid();

    Ok(Subject {
        id,
        name: name.to_string(),
        description: description.map(str::to_string),
    })
}

/// Inserts a question and its options atomically.
///
/// Options keep the order given, which fixes their letters.
pub async fn create_question(
    pool: &SqlitePool,
    new: &NewQuestion,
) -> Result<Question, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let question_id = sqlx::query(
        r#"
        INSERT INTO questions (subject_id, prompt, explanation, difficulty, reference, section)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.subject_id)
    .bind(&new.prompt)
    .bind(&new.explanation)
    .bind(new.difficulty)
    .bind(&new.reference)
    .bind(&new.section)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    let mut options = Vec::with_capacity(new.options.len());
    for (position, option) in new.options.iter().enumerate() {
        let option_id = sqlx::query(
            r#"
            INSERT INTO answer_options (question_id, position, text, is_correct, explanation)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(question_id)
        .bind(position as i64)
        .bind(&option.text)
        .bind(option.is_correct)
        .bind(&option.explanation)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        options.push(AnswerOption {
            id: option_id,
            question_id,
            position: position as i64,
            text: option.text.clone(),
            is_correct: option.is_correct,
            explanation: option.explanation.clone(),
        });
    }

    tx.commit().await?;

    Ok(Question {
        id: question_id,
        subject_id: new.subject_id,
        prompt: new.prompt.clone(),
        explanation: new.explanation.clone(),
        difficulty: new.difficulty,
        reference: new.reference.clone(),
        section: new.section.clone(),
        options,
    })
}

/// Creates an exam grouping over `question_ids`, in the given order.
pub async fn create_exam(
    pool: &SqlitePool,
    title: &str,
    question_ids: &[i64],
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let exam_id = sqlx::query("INSERT INTO exams (title) VALUES (?)")
        .bind(title)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    for (position, question_id) in question_ids.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO exam_questions (exam_id, question_id, position)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(exam_id)
        .bind(question_id)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(exam_id)
}
