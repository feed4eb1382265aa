// tests/common/mod.rs

#![allow(dead_code)]

use examgen::{
    db,
    models::question::{NewOption, NewQuestion, Question, Subject},
    repository::questions,
};
use sqlx::SqlitePool;

/// Fresh, migrated in-memory question bank.
pub async fn setup_pool() -> SqlitePool {
    let pool = db::connect("sqlite::memory:", 1)
        .await
        .expect("Failed to open in-memory database");
    db::migrate(&pool).await.expect("Failed to migrate database");
    pool
}

pub async fn seed_subject(pool: &SqlitePool, name: &str) -> Subject {
    questions::create_subject(pool, name, None)
        .await
        .expect("Failed to create subject")
}

/// Inserts a question whose options are correct where `correct` is true.
pub async fn seed_question(
    pool: &SqlitePool,
    subject_id: i64,
    prompt: &str,
    correct: &[bool],
) -> Question {
    let new = NewQuestion {
        subject_id,
        prompt: prompt.to_string(),
        explanation: Some(format!("Why: {}", prompt)),
        difficulty: 1,
        reference: None,
        section: None,
        options: correct
            .iter()
            .enumerate()
            .map(|(i, is_correct)| NewOption::new(format!("Option {}", i + 1), *is_correct))
            .collect(),
    };

    questions::create_question(pool, &new)
        .await
        .expect("Failed to create question")
}

/// Subject with `count` single-answer questions whose correct option is `A`.
pub async fn seed_single_answer_subject(
    pool: &SqlitePool,
    name: &str,
    count: usize,
) -> (Subject, Vec<Question>) {
    let subject = seed_subject(pool, name).await;
    let mut seeded = Vec::with_capacity(count);
    for i in 0..count {
        let prompt = format!("{} question {}", name, i + 1);
        let q = seed_question(pool, subject.id, &prompt, &[true, false, false, false]).await;
        seeded.push(q);
    }
    (subject, seeded)
}
