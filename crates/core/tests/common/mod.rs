//! Shared fixture for service tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quizzes_common::{AppResult, CacheError, EphemeralCache};
use quizzes_core::{
    AnalyticsService, AnswerInput, CompanyService, CreateCompanyInput, CreateQuizInput,
    CreateUserInput, EventPublisher, GradingService, InvitationService, NotificationService,
    QuestionInput, QuizDetail, QuizService, ReminderService, RequestService, StreamEvent,
    UserService,
};
use quizzes_db::entities::{company, user};
use quizzes_db::repositories::{
    CompanyInvitationRepository, CompanyRepository, NotificationRepository, QuizRepository,
    QuizResultRepository, UserRepository, UserRequestRepository,
};
use quizzes_db::test_utils::TestDatabase;

/// Publisher that keeps every event it receives.
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<(String, StreamEvent)>>,
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, user_id: &str, event: &StreamEvent) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((user_id.to_string(), event.clone()));
        Ok(())
    }
}

impl RecordingPublisher {
    /// Wait for spawned deliveries until `count` events arrived.
    pub async fn wait_for(&self, count: usize) -> Vec<(String, StreamEvent)> {
        for _ in 0..100 {
            if self.events.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.events.lock().unwrap().clone()
    }
}

/// Cache that keeps entries in memory and can be told to fail.
#[derive(Default)]
pub struct MemoryCache {
    pub entries: Mutex<Vec<(String, serde_json::Value, Duration)>>,
    pub failing: bool,
}

#[async_trait]
impl EphemeralCache for MemoryCache {
    async fn set(
        &self,
        key: &str,
        value: &serde_json::Value,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        if self.failing {
            return Err(CacheError::Redis("connection refused".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .push((key.to_string(), value.clone(), ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, CacheError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _, _)| k == key)
            .map(|(_, v, _)| v.clone()))
    }
}

pub const RESULT_TTL: Duration = Duration::from_secs(172_800);

/// Every service wired to one in-memory database.
pub struct Fixture {
    pub db: TestDatabase,
    pub publisher: Arc<RecordingPublisher>,
    pub cache: Arc<MemoryCache>,
    pub users: UserService,
    pub companies: CompanyService,
    pub invitations: InvitationService,
    pub requests: RequestService,
    pub quizzes: QuizService,
    pub grading: GradingService,
    pub analytics: AnalyticsService,
    pub notifications: NotificationService,
    pub reminders: ReminderService,
    pub results: QuizResultRepository,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_cache(MemoryCache::default()).await
    }

    pub async fn with_cache(cache: MemoryCache) -> Self {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = db.shared();
        let publisher = Arc::new(RecordingPublisher::default());
        let cache = Arc::new(cache);

        let user_repo = UserRepository::new(conn.clone());
        let company_repo = CompanyRepository::new(conn.clone());
        let invitation_repo = CompanyInvitationRepository::new(conn.clone());
        let request_repo = UserRequestRepository::new(conn.clone());
        let quiz_repo = QuizRepository::new(conn.clone());
        let result_repo = QuizResultRepository::new(conn.clone());
        let notification_repo = NotificationRepository::new(conn);

        let mut companies = CompanyService::new(
            company_repo.clone(),
            invitation_repo.clone(),
            request_repo.clone(),
            quiz_repo.clone(),
        );
        companies.set_event_publisher(publisher.clone());

        let mut invitations = InvitationService::new(
            invitation_repo.clone(),
            company_repo.clone(),
            user_repo.clone(),
            companies.clone(),
        );
        invitations.set_event_publisher(publisher.clone());

        let mut requests =
            RequestService::new(request_repo.clone(), company_repo.clone(), companies.clone());
        requests.set_event_publisher(publisher.clone());

        let quizzes = QuizService::new(quiz_repo.clone(), company_repo.clone());

        let mut grading = GradingService::new(
            quiz_repo.clone(),
            result_repo.clone(),
            company_repo.clone(),
            RESULT_TTL,
        );
        grading.set_cache(cache.clone());
        grading.set_event_publisher(publisher.clone());

        let analytics =
            AnalyticsService::new(result_repo.clone(), quiz_repo.clone(), company_repo.clone());

        let mut notifications = NotificationService::new(notification_repo.clone());
        notifications.set_event_publisher(publisher.clone());

        let reminders = ReminderService::new(
            company_repo.clone(),
            quiz_repo,
            result_repo.clone(),
            notifications.clone(),
        );

        let users = UserService::new(
            user_repo,
            company_repo,
            invitation_repo,
            request_repo,
            notification_repo,
            result_repo.clone(),
            companies.clone(),
        );

        Self {
            db,
            publisher,
            cache,
            users,
            companies,
            invitations,
            requests,
            quizzes,
            grading,
            analytics,
            notifications,
            reminders,
            results: result_repo,
        }
    }

    pub async fn user(&self, username: &str) -> user::Model {
        self.users
            .create_user(CreateUserInput {
                username: username.to_string(),
                email: None,
            })
            .await
            .unwrap()
    }

    pub async fn company(&self, owner: &user::Model, name: &str) -> company::Model {
        self.companies
            .create_company(
                &owner.id,
                CreateCompanyInput {
                    name: name.to_string(),
                    description: None,
                    visible: true,
                },
            )
            .await
            .unwrap()
    }

    /// Make `user` a member through an approved join request.
    pub async fn join(&self, owner: &user::Model, company: &company::Model, user: &user::Model) {
        let request = self
            .requests
            .create_request(&user.id, &company.id)
            .await
            .unwrap();
        self.requests
            .approve_request(&owner.id, &request.id)
            .await
            .unwrap();
    }

    /// The two-question quiz: Q1 {a1 correct, a2}, Q2 {b1 correct, b2}.
    pub async fn basics_quiz(&self, actor: &user::Model, company: &company::Model) -> QuizDetail {
        self.quizzes
            .create_quiz(&actor.id, basics_input(&company.id))
            .await
            .unwrap()
    }
}

pub fn answer(text: &str, is_correct: bool) -> AnswerInput {
    AnswerInput {
        text: text.to_string(),
        is_correct,
    }
}

pub fn question(text: &str, answers: Vec<AnswerInput>) -> QuestionInput {
    QuestionInput {
        text: text.to_string(),
        answers,
    }
}

pub fn basics_input(company_id: &str) -> CreateQuizInput {
    CreateQuizInput {
        company_id: company_id.to_string(),
        title: "Basics".to_string(),
        description: Some("Warm-up".to_string()),
        frequency: 1,
        questions: vec![
            question("Q1", vec![answer("a1", true), answer("a2", false)]),
            question("Q2", vec![answer("b1", true), answer("b2", false)]),
        ],
    }
}
