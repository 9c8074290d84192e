//! Quiz authoring.

#![allow(clippy::unwrap_used)]

mod common;

use common::{Fixture, answer, basics_input, question};
use quizzes_common::AppError;
use quizzes_core::UpdateQuizInput;

#[tokio::test]
async fn test_quiz_reads_back_in_authored_order() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let acme = fx.company(&alice, "Acme").await;

    let created = fx.basics_quiz(&alice, &acme).await;
    let read = fx.quizzes.get_quiz(&alice.id, &created.id).await.unwrap();

    assert_eq!(read, created);
    let texts: Vec<&str> = read.questions.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, vec!["Q1", "Q2"]);

    for (q, expected) in read.questions.iter().zip([["a1", "a2"], ["b1", "b2"]]) {
        let answers: Vec<&str> = q.answers.iter().map(|a| a.text.as_str()).collect();
        assert_eq!(answers, expected);
        assert_eq!(q.answers[0].is_correct, Some(true));
        assert_eq!(q.answers[1].is_correct, Some(false));
    }
}

#[tokio::test]
async fn test_plain_members_do_not_see_correct_answers() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let stranger = fx.user("stranger").await;
    let acme = fx.company(&alice, "Acme").await;
    fx.join(&alice, &acme, &bob).await;
    let quiz = fx.basics_quiz(&alice, &acme).await;

    let read = fx.quizzes.get_quiz(&bob.id, &quiz.id).await.unwrap();
    assert!(read
        .questions
        .iter()
        .flat_map(|q| &q.answers)
        .all(|a| a.is_correct.is_none()));

    let err = fx.quizzes.get_quiz(&stranger.id, &quiz.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let listed = fx
        .quizzes
        .list_company_quizzes(&bob.id, &acme.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
}

#[tokio::test]
async fn test_create_quiz_rules() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;
    fx.join(&alice, &acme, &bob).await;

    let err = fx
        .quizzes
        .create_quiz(&bob.id, basics_input(&acme.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let mut input = basics_input(&acme.id);
    input.questions.truncate(1);
    let err = fx.quizzes.create_quiz(&alice.id, input).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientQuestions));

    let mut input = basics_input(&acme.id);
    input.questions[1].answers.truncate(1);
    let err = fx.quizzes.create_quiz(&alice.id, input).await.unwrap_err();
    assert!(matches!(err, AppError::InsufficientAnswers(_)));

    let mut input = basics_input(&acme.id);
    input.questions[0].answers[0].is_correct = false;
    let err = fx.quizzes.create_quiz(&alice.id, input).await.unwrap_err();
    assert!(matches!(err, AppError::NoCorrectAnswer(_)));

    let mut input = basics_input(&acme.id);
    input.frequency = -1;
    let err = fx.quizzes.create_quiz(&alice.id, input).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(fx
        .quizzes
        .list_company_quizzes(&alice.id, &acme.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_administrator_can_author() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;
    fx.join(&alice, &acme, &bob).await;
    fx.companies
        .promote_admin(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap();

    let quiz = fx.basics_quiz(&bob, &acme).await;
    fx.quizzes.delete_quiz(&bob.id, &quiz.id).await.unwrap();

    assert!(matches!(
        fx.quizzes.get_quiz(&alice.id, &quiz.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_remove_question_keeps_minimum() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let acme = fx.company(&alice, "Acme").await;
    let quiz = fx.basics_quiz(&alice, &acme).await;

    let err = fx
        .quizzes
        .remove_question(&alice.id, &quiz.id, &quiz.questions[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::MinimumQuestions));

    let read = fx.quizzes.get_quiz(&alice.id, &quiz.id).await.unwrap();
    assert_eq!(read.questions.len(), 2);
}

#[tokio::test]
async fn test_concurrent_removals_keep_minimum() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let acme = fx.company(&alice, "Acme").await;
    let quiz = fx.basics_quiz(&alice, &acme).await;
    fx.quizzes
        .add_question(
            &alice.id,
            &quiz.id,
            question("Q3", vec![answer("c1", false), answer("c2", true)]),
        )
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        fx.quizzes
            .remove_question(&alice.id, &quiz.id, &quiz.questions[0].id),
        fx.quizzes
            .remove_question(&alice.id, &quiz.id, &quiz.questions[1].id),
    );

    assert_eq!(
        [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count(),
        1
    );
    assert!(matches!(
        first.err().or(second.err()),
        Some(AppError::MinimumQuestions)
    ));

    let read = fx.quizzes.get_quiz(&alice.id, &quiz.id).await.unwrap();
    assert_eq!(read.questions.len(), 2);
}

#[tokio::test]
async fn test_add_and_remove_question() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let acme = fx.company(&alice, "Acme").await;
    let quiz = fx.basics_quiz(&alice, &acme).await;
    let other = fx.basics_quiz(&alice, &acme).await;

    let err = fx
        .quizzes
        .add_question(&alice.id, &quiz.id, question("Q3", vec![answer("c1", true)]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientAnswers(_)));

    let added = fx
        .quizzes
        .add_question(
            &alice.id,
            &quiz.id,
            question("Q3", vec![answer("c1", false), answer("c2", true)]),
        )
        .await
        .unwrap();
    assert_eq!(added.position, 2);

    let err = fx
        .quizzes
        .remove_question(&alice.id, &quiz.id, "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = fx
        .quizzes
        .remove_question(&alice.id, &quiz.id, &other.questions[0].id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotPartOfQuiz(_)));

    fx.quizzes
        .remove_question(&alice.id, &quiz.id, &quiz.questions[0].id)
        .await
        .unwrap();

    let read = fx.quizzes.get_quiz(&alice.id, &quiz.id).await.unwrap();
    let texts: Vec<&str> = read.questions.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, vec!["Q2", "Q3"]);
}

#[tokio::test]
async fn test_update_quiz_replaces_questions() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let acme = fx.company(&alice, "Acme").await;
    let quiz = fx.basics_quiz(&alice, &acme).await;

    let err = fx
        .quizzes
        .update_quiz(
            &alice.id,
            UpdateQuizInput {
                quiz_id: quiz.id.clone(),
                title: None,
                description: None,
                frequency: None,
                questions: Some(vec![question(
                    "Lonely",
                    vec![answer("x", true), answer("y", false)],
                )]),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InsufficientQuestions));

    let updated = fx
        .quizzes
        .update_quiz(
            &alice.id,
            UpdateQuizInput {
                quiz_id: quiz.id.clone(),
                title: Some("Advanced".to_string()),
                description: Some(None),
                frequency: Some(7),
                questions: Some(vec![
                    question("N1", vec![answer("x", true), answer("y", false)]),
                    question("N2", vec![answer("z", false), answer("w", true)]),
                    question("N3", vec![answer("u", true), answer("v", true)]),
                ]),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Advanced");
    assert_eq!(updated.description, None);
    assert_eq!(updated.frequency, 7);
    assert_eq!(updated.questions.len(), 3);
    assert!(updated.updated_at.is_some());
    assert!(updated
        .questions
        .iter()
        .all(|q| quiz.questions.iter().all(|old| old.id != q.id)));
}
