//! Database integration tests.
//!
//! Run against an in-memory `SQLite` database migrated with the real
//! migrations, so constraints and indexes behave as in production.

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use quizzes_common::AppError;
use quizzes_db::entities::company_invitation::InvitationStatus;
use quizzes_db::entities::company_member::CompanyRole;
use quizzes_db::entities::user_request::RequestStatus;
use quizzes_db::entities::{
    answer, company, company_invitation, company_member, question, quiz, quiz_result, user,
    user_request,
};
use quizzes_db::repositories::{
    CompanyInvitationRepository, CompanyRepository, QuizRepository, QuizResultRepository,
    UserRepository, UserRequestRepository,
};
use quizzes_db::test_utils::TestDatabase;
use sea_orm::Set;

async fn seed_user(db: &TestDatabase, id: &str) {
    UserRepository::new(db.shared())
        .create(user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(format!("{id}-name")),
            email: Set(None),
            created_at: Set(Utc::now().into()),
        })
        .await
        .unwrap();
}

async fn seed_company(db: &TestDatabase, id: &str, owner: &str) {
    let repo = CompanyRepository::new(db.shared());
    repo.create(
        db.connection(),
        company::ActiveModel {
            id: Set(id.to_string()),
            owner_id: Set(owner.to_string()),
            name: Set("Acme".to_string()),
            description: Set(None),
            visible: Set(true),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        },
    )
    .await
    .unwrap();
}

fn invitation(id: &str, recipient: &str) -> company_invitation::ActiveModel {
    let now = Utc::now();
    company_invitation::ActiveModel {
        id: Set(id.to_string()),
        company_id: Set("acme".to_string()),
        sender_id: Set("alice".to_string()),
        recipient_id: Set(recipient.to_string()),
        status: Set(InvitationStatus::Pending),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
}

#[tokio::test]
async fn test_pending_invitation_is_unique_per_company_and_recipient() {
    let db = TestDatabase::in_memory().await.unwrap();
    seed_user(&db, "alice").await;
    seed_user(&db, "bob").await;
    seed_company(&db, "acme", "alice").await;

    let repo = CompanyInvitationRepository::new(db.shared());
    repo.create(invitation("inv1", "bob")).await.unwrap();

    let duplicate = repo.create(invitation("inv2", "bob")).await;
    assert!(matches!(duplicate, Err(AppError::DuplicatePending(_))));

    // Once resolved, a new pending invitation may be sent.
    let updated = repo
        .resolve(
            db.connection(),
            "inv1",
            InvitationStatus::Declined,
            Utc::now().into(),
        )
        .await
        .unwrap();
    assert_eq!(updated, 1);
    repo.create(invitation("inv3", "bob")).await.unwrap();
}

#[tokio::test]
async fn test_resolve_only_touches_pending_rows() {
    let db = TestDatabase::in_memory().await.unwrap();
    seed_user(&db, "alice").await;
    seed_user(&db, "bob").await;
    seed_company(&db, "acme", "alice").await;

    let repo = UserRequestRepository::new(db.shared());
    let now = Utc::now();
    repo.create(user_request::ActiveModel {
        id: Set("req1".to_string()),
        company_id: Set("acme".to_string()),
        sender_id: Set("bob".to_string()),
        status: Set(RequestStatus::Pending),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    })
    .await
    .unwrap();

    let first = repo
        .resolve(db.connection(), "req1", RequestStatus::Approved, now.into())
        .await
        .unwrap();
    let second = repo
        .resolve(db.connection(), "req1", RequestStatus::Rejected, now.into())
        .await
        .unwrap();

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(
        repo.get_by_id("req1").await.unwrap().status,
        RequestStatus::Approved
    );
}

#[tokio::test]
async fn test_duplicate_membership_is_already_member() {
    let db = TestDatabase::in_memory().await.unwrap();
    seed_user(&db, "alice").await;
    seed_company(&db, "acme", "alice").await;

    let repo = CompanyRepository::new(db.shared());
    let member = |id: &str| company_member::ActiveModel {
        id: Set(id.to_string()),
        company_id: Set("acme".to_string()),
        user_id: Set("alice".to_string()),
        role: Set(CompanyRole::Owner),
        joined_at: Set(Utc::now().into()),
    };

    repo.add_member(db.connection(), member("m1")).await.unwrap();
    let again = repo.add_member(db.connection(), member("m2")).await;

    assert!(matches!(again, Err(AppError::AlreadyMember(id)) if id == "alice"));
}

#[tokio::test]
async fn test_quiz_delete_removes_graph_and_results() {
    let db = TestDatabase::in_memory().await.unwrap();
    seed_user(&db, "alice").await;
    seed_company(&db, "acme", "alice").await;

    let quizzes = QuizRepository::new(db.shared());
    let results = QuizResultRepository::new(db.shared());
    let conn = db.connection();

    quizzes
        .create(
            conn,
            quiz::ActiveModel {
                id: Set("quiz1".to_string()),
                company_id: Set("acme".to_string()),
                title: Set("Basics".to_string()),
                description: Set(None),
                frequency: Set(7),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            },
        )
        .await
        .unwrap();

    for position in 0..2 {
        let question_id = format!("q{position}");
        quizzes
            .insert_question(
                conn,
                question::ActiveModel {
                    id: Set(question_id.clone()),
                    quiz_id: Set("quiz1".to_string()),
                    position: Set(position),
                    text: Set("?".to_string()),
                },
            )
            .await
            .unwrap();
        quizzes
            .insert_answers(
                conn,
                (0..2)
                    .map(|i| answer::ActiveModel {
                        id: Set(format!("{question_id}-a{i}")),
                        question_id: Set(question_id.clone()),
                        position: Set(i),
                        text: Set("!".to_string()),
                        is_correct: Set(i == 0),
                    })
                    .collect(),
            )
            .await
            .unwrap();
    }

    results
        .create(quiz_result::ActiveModel {
            id: Set("r1".to_string()),
            quiz_id: Set("quiz1".to_string()),
            user_id: Set(Some("alice".to_string())),
            correct_questions: Set(1),
            total_questions: Set(2),
            timestamp: Set(Utc::now().into()),
        })
        .await
        .unwrap();

    assert_eq!(quizzes.count_questions(conn, "quiz1").await.unwrap(), 2);

    quizzes.delete(conn, "quiz1").await.unwrap();

    assert!(quizzes.find_by_id("quiz1").await.unwrap().is_none());
    assert_eq!(quizzes.count_questions(conn, "quiz1").await.unwrap(), 0);
    assert!(results.find_by_quiz("quiz1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_detach_user_keeps_results() {
    let db = TestDatabase::in_memory().await.unwrap();
    seed_user(&db, "alice").await;
    seed_company(&db, "acme", "alice").await;

    let quizzes = QuizRepository::new(db.shared());
    quizzes
        .create(
            db.connection(),
            quiz::ActiveModel {
                id: Set("quiz1".to_string()),
                company_id: Set("acme".to_string()),
                title: Set("Basics".to_string()),
                description: Set(None),
                frequency: Set(1),
                created_at: Set(Utc::now().into()),
                updated_at: Set(None),
            },
        )
        .await
        .unwrap();

    let results = QuizResultRepository::new(db.shared());
    for (i, days_ago) in [3_i64, 1].into_iter().enumerate() {
        results
            .create(quiz_result::ActiveModel {
                id: Set(format!("r{i}")),
                quiz_id: Set("quiz1".to_string()),
                user_id: Set(Some("alice".to_string())),
                correct_questions: Set(1),
                total_questions: Set(2),
                timestamp: Set((Utc::now() - Duration::days(days_ago)).into()),
            })
            .await
            .unwrap();
    }

    let latest = results.find_latest("quiz1", "alice").await.unwrap().unwrap();
    assert_eq!(latest.id, "r1");

    let detached = results.detach_user(db.connection(), "alice").await.unwrap();
    assert_eq!(detached, 2);

    let remaining = results.find_by_quiz("quiz1").await.unwrap();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.iter().all(|r| r.user_id.is_none()));
}
