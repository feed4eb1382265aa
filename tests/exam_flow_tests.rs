// tests/exam_flow_tests.rs

mod common;

use std::collections::HashSet;

use common::{seed_question, seed_single_answer_subject, seed_subject, setup_pool};
use examgen::{
    exam::{
        self, AttemptStatus, ExamError, ExamSession,
        session::{SessionTick, Step},
    },
    models::attempt::{ExamConfig, HistoryFilter, SelectorType, SubmitReason},
    repository::{attempts, questions},
};

#[tokio::test]
async fn demo_attempt_scores_answered_questions() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 5).await;

    let config = ExamConfig::random("Demo", 5, 10);
    let attempt = exam::create_attempt(&pool, &config).await.unwrap();

    assert_eq!(attempt.questions.len(), 5);
    assert_eq!(attempt.status(), AttemptStatus::Created);
    assert!(attempt.ended_at.is_none());

    for aq in attempt.questions.iter().take(3) {
        exam::record_selection(&pool, attempt.id, aq.question_id, "A")
            .await
            .unwrap();
    }

    let in_progress = attempts::fetch_attempt(&pool, attempt.id).await.unwrap().unwrap();
    assert_eq!(in_progress.status(), AttemptStatus::InProgress);

    let scored = exam::submit_attempt(&pool, attempt.id, SubmitReason::Confirmed)
        .await
        .unwrap();

    assert_eq!(scored.score, Some(3));
    assert!(scored.ended_at.is_some());
    assert_eq!(scored.status(), AttemptStatus::Scored);

    let unanswered: Vec<_> = scored
        .questions
        .iter()
        .filter(|aq| aq.selected_option.is_none())
        .collect();
    assert_eq!(unanswered.len(), 2);
    assert!(unanswered.iter().all(|aq| aq.is_correct == Some(false)));
}

#[tokio::test]
async fn three_of_five_all_correct_scores_three() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 5).await;

    let attempt = exam::create_attempt(&pool, &ExamConfig::random("Demo", 3, 10))
        .await
        .unwrap();
    let ids: HashSet<i64> = attempt.questions.iter().map(|aq| aq.question_id).collect();
    assert_eq!(ids.len(), 3);

    for aq in &attempt.questions {
        exam::record_selection(&pool, attempt.id, aq.question_id, "A")
            .await
            .unwrap();
    }

    let scored = exam::evaluate_attempt(&pool, attempt.id).await.unwrap();
    assert_eq!(scored.score, Some(3));
}

#[tokio::test]
async fn evaluate_is_idempotent_and_keeps_completion_time() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 3).await;

    let attempt = exam::create_attempt(&pool, &ExamConfig::random("Demo", 3, 10))
        .await
        .unwrap();
    let first_id = attempt.questions[0].question_id;
    exam::record_selection(&pool, attempt.id, first_id, "a")
        .await
        .unwrap();

    let first = exam::evaluate_attempt(&pool, attempt.id).await.unwrap();
    let second = exam::evaluate_attempt(&pool, attempt.id).await.unwrap();

    assert_eq!(first.score, Some(1));
    assert!(first.ended_at.is_some());
    assert_eq!(second.score, first.score);

    let again = exam::submit_attempt(&pool, attempt.id, SubmitReason::TimedOut)
        .await
        .unwrap();
    assert_eq!(again.score, Some(1));
    assert_eq!(again.ended_at, second.ended_at);
}

#[tokio::test]
async fn multi_answer_question_needs_exact_set() {
    let pool = setup_pool().await;
    let subject = seed_subject(&pool, "Multi").await;
    let question = seed_question(&pool, subject.id, "Pick two", &[true, false, true]).await;

    let attempt = exam::create_attempt(&pool, &ExamConfig::random("Multi", 1, 5))
        .await
        .unwrap();

    exam::record_selection(&pool, attempt.id, question.id, "A")
        .await
        .unwrap();
    let review = exam::check_question(&pool, attempt.id, question.id)
        .await
        .unwrap();
    assert!(!review.is_correct);
    assert_eq!(review.correct_letters, "AC");

    exam::record_selection(&pool, attempt.id, question.id, "c, a")
        .await
        .unwrap();
    let review = exam::check_question(&pool, attempt.id, question.id)
        .await
        .unwrap();
    assert!(review.is_correct);
    assert_eq!(review.selected_option, "AC");
    assert_eq!(review.explanation.as_deref(), Some("Why: Pick two"));

    // Checking a question leaves the attempt open.
    let stored = attempts::fetch_attempt(&pool, attempt.id).await.unwrap().unwrap();
    assert!(stored.ended_at.is_none());
    assert!(stored.score.is_none());
}

#[tokio::test]
async fn record_selection_rejects_bad_input() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 2).await;
    let elsewhere = seed_subject(&pool, "Elsewhere").await;
    let outsider = seed_question(&pool, elsewhere.id, "Not asked", &[true, false]).await;

    let attempt = exam::create_attempt(&pool, &ExamConfig::random("Demo", 1, 5))
        .await
        .unwrap();
    let question_id = attempt.questions[0].question_id;

    let err = exam::record_selection(&pool, attempt.id, question_id, "E")
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::InvalidSelection(_)));

    let err = exam::record_selection(&pool, attempt.id, outsider.id, "A")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExamError::QuestionNotInAttempt { question_id, .. } if question_id == outsider.id
    ));

    let err = exam::record_selection(&pool, 9999, question_id, "A")
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::AttemptNotFound(9999)));

    exam::submit_attempt(&pool, attempt.id, SubmitReason::Confirmed)
        .await
        .unwrap();
    let err = exam::record_selection(&pool, attempt.id, question_id, "A")
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::AttemptClosed(id) if id == attempt.id));
}

#[tokio::test]
async fn unknown_subject_has_no_questions() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 2).await;

    let err = exam::create_attempt(&pool, &ExamConfig::random("Nope", 3, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::NoQuestionsAvailable(ref s) if s == "Nope"));
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 2).await;

    let err = exam::create_attempt(&pool, &ExamConfig::random("Demo", 0, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, ExamError::InvalidConfig(_)));
}

#[tokio::test]
async fn subject_name_matches_case_insensitively() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 2).await;

    let attempt = exam::create_attempt(&pool, &ExamConfig::random("dEMO", 2, 10))
        .await
        .unwrap();
    assert_eq!(attempt.questions.len(), 2);
}

#[tokio::test]
async fn accented_subject_name_matches_case_insensitively() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Álgebra", 2).await;

    for name in ["álgebra", "ÁLGEBRA", "Álgebra"] {
        let attempt = exam::create_attempt(&pool, &ExamConfig::random(name, 2, 10))
            .await
            .unwrap();
        assert_eq!(attempt.questions.len(), 2);
    }

    let filter = HistoryFilter {
        subject: Some("ÁLGEBRA".to_string()),
        limit: None,
    };
    let history = attempts::list_attempts(&pool, &filter).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn error_weighted_without_history_still_selects() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 6).await;

    let mut config = ExamConfig::random("Demo", 3, 10);
    config.selector_type = SelectorType::ErrorWeighted;
    config.error_threshold = Some(3);

    let attempt = exam::create_attempt(&pool, &config).await.unwrap();
    assert_eq!(attempt.questions.len(), 3);
    assert_eq!(attempt.selector_type, SelectorType::ErrorWeighted);
}

#[tokio::test]
async fn error_weighted_prefers_previously_failed_questions() {
    let pool = setup_pool().await;
    let (_, seeded) = seed_single_answer_subject(&pool, "Demo", 6).await;
    let failed: HashSet<i64> = seeded.iter().take(2).map(|q| q.id).collect();

    let first = exam::create_attempt(&pool, &ExamConfig::random("Demo", 6, 10))
        .await
        .unwrap();
    for aq in &first.questions {
        let answer = if failed.contains(&aq.question_id) { "B" } else { "A" };
        exam::record_selection(&pool, first.id, aq.question_id, answer)
            .await
            .unwrap();
    }
    let first = exam::submit_attempt(&pool, first.id, SubmitReason::Confirmed)
        .await
        .unwrap();
    assert_eq!(first.score, Some(4));

    let mut config = ExamConfig::random("Demo", 2, 10);
    config.selector_type = SelectorType::ErrorWeighted;
    config.error_threshold = Some(2);

    let second = exam::create_attempt(&pool, &config).await.unwrap();
    let picked: HashSet<i64> = second.questions.iter().map(|aq| aq.question_id).collect();
    assert_eq!(picked, failed);
}

#[tokio::test]
async fn exam_grouping_scopes_candidates() {
    let pool = setup_pool().await;
    let (subject, seeded) = seed_single_answer_subject(&pool, "Demo", 5).await;
    let grouped: Vec<i64> = seeded.iter().skip(2).take(2).map(|q| q.id).collect();
    let exam_id = questions::create_exam(&pool, "Mock exam", &grouped)
        .await
        .unwrap();

    let mut config = ExamConfig::random("Demo", 2, 10);
    config.exam_id = Some(exam_id);
    config.subject_id = Some(subject.id);

    let attempt = exam::create_attempt(&pool, &config).await.unwrap();
    let picked: HashSet<i64> = attempt.questions.iter().map(|aq| aq.question_id).collect();
    assert_eq!(picked, grouped.into_iter().collect());
    assert_eq!(attempt.exam_id, Some(exam_id));
}

#[tokio::test]
async fn empty_exam_grouping_falls_back_to_subject() {
    let pool = setup_pool().await;
    let (subject, _) = seed_single_answer_subject(&pool, "Demo", 4).await;
    let exam_id = questions::create_exam(&pool, "Empty exam", &[]).await.unwrap();

    let mut config = ExamConfig::random("Demo", 3, 10);
    config.exam_id = Some(exam_id);
    config.subject_id = Some(subject.id);

    let attempt = exam::create_attempt(&pool, &config).await.unwrap();
    assert_eq!(attempt.questions.len(), 3);
}

#[tokio::test]
async fn history_lists_filters_and_deletes() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 3).await;
    seed_single_answer_subject(&pool, "Other", 3).await;

    let demo = exam::create_attempt(&pool, &ExamConfig::random("Demo", 2, 10))
        .await
        .unwrap();
    let other = exam::create_attempt(&pool, &ExamConfig::random("Other", 2, 10))
        .await
        .unwrap();

    let all = attempts::list_attempts(&pool, &HistoryFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    assert!(all.iter().all(|s| s.total_questions == 2));

    let filter = HistoryFilter {
        subject: Some("demo".to_string()),
        limit: None,
    };
    let only_demo = attempts::list_attempts(&pool, &filter).await.unwrap();
    assert_eq!(only_demo.len(), 1);
    assert_eq!(only_demo[0].id, demo.id);
    assert_eq!(only_demo[0].status, AttemptStatus::Created);

    assert!(attempts::delete_attempt(&pool, other.id).await.unwrap());
    assert!(!attempts::delete_attempt(&pool, other.id).await.unwrap());
    assert!(attempts::fetch_attempt(&pool, other.id).await.unwrap().is_none());

    assert_eq!(attempts::clear_attempts(&pool).await.unwrap(), 1);
    let none = attempts::list_attempts(&pool, &HistoryFilter::default())
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn session_navigates_and_persists_answers() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 3).await;
    let attempt = exam::create_attempt(&pool, &ExamConfig::random("Demo", 3, 10))
        .await
        .unwrap();

    let mut session = ExamSession::start(pool.clone(), attempt).unwrap();
    assert_eq!(session.len(), 3);
    assert_eq!(session.index(), 0);

    session.select("a").unwrap();
    assert_eq!(session.draft(), "A");
    assert_eq!(session.next().await.unwrap(), Step::Moved(1));
    assert_eq!(session.draft(), "");

    assert_eq!(session.previous().await.unwrap(), Step::Moved(0));
    assert_eq!(session.draft(), "A");

    let review = session.check_current().await.unwrap();
    assert!(review.is_correct);

    session.pause();
    assert!(matches!(session.select("B"), Err(ExamError::SessionPaused)));
    assert_eq!(session.tick().await.unwrap(), SessionTick::Paused);
    assert!(session.resume_timer());

    assert_eq!(session.next().await.unwrap(), Step::Moved(1));
    assert_eq!(session.next().await.unwrap(), Step::Moved(2));
    assert_eq!(session.next().await.unwrap(), Step::ConfirmSubmit);

    let attempt_id = session.attempt().id;
    let finished = session.finish(SubmitReason::Confirmed).await.unwrap();
    assert_eq!(finished.score, Some(1));
    assert!(session.is_finished());
    assert!(matches!(
        session.select("A"),
        Err(ExamError::AttemptClosed(id)) if id == attempt_id
    ));

    let err = ExamSession::resume(pool.clone(), attempt_id).await.err();
    assert!(matches!(err, Some(ExamError::AttemptClosed(_))));
}

#[tokio::test]
async fn session_submits_when_time_runs_out() {
    let pool = setup_pool().await;
    seed_single_answer_subject(&pool, "Demo", 2).await;
    let attempt = exam::create_attempt(&pool, &ExamConfig::random("Demo", 2, 1))
        .await
        .unwrap();
    let attempt_id = attempt.id;

    let mut session = ExamSession::resume(pool.clone(), attempt_id).await.unwrap();
    session.select("A").unwrap();

    let mut last = SessionTick::Running(60);
    for _ in 0..60 {
        last = session.tick().await.unwrap();
    }

    assert_eq!(last, SessionTick::Finished);
    assert!(session.is_finished());
    assert!(!session.resume_timer());
    assert_eq!(session.attempt().score, Some(1));

    let stored = attempts::fetch_attempt(&pool, attempt_id).await.unwrap().unwrap();
    assert!(stored.ended_at.is_some());
    assert_eq!(stored.status(), AttemptStatus::Scored);
}
