//! Service wiring.

#![allow(missing_docs)]

use std::sync::Arc;
use std::time::Duration;

use quizzes_common::EphemeralCacheService;
use quizzes_common::config::CacheConfig;
use quizzes_core::{
    AnalyticsService, CompanyService, EventPublisherService, GradingService, InvitationService,
    NotificationService, QuizService, ReminderService, RequestService, UserService,
};
use quizzes_db::repositories::{
    CompanyInvitationRepository, CompanyRepository, NotificationRepository, QuizRepository,
    QuizResultRepository, UserRepository, UserRequestRepository,
};
use sea_orm::DatabaseConnection;

/// Every domain service, sharing one pool, publisher and cache.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub companies: CompanyService,
    pub invitations: InvitationService,
    pub requests: RequestService,
    pub quizzes: QuizService,
    pub grading: GradingService,
    pub analytics: AnalyticsService,
    pub notifications: NotificationService,
    pub reminders: ReminderService,
}

impl Services {
    /// Build the services.
    ///
    /// Graded submissions are copied into `cache` for `cache_config.result_ttl_secs`.
    #[must_use]
    pub fn build(
        db: Arc<DatabaseConnection>,
        cache_config: &CacheConfig,
        publisher: EventPublisherService,
        cache: EphemeralCacheService,
    ) -> Self {
        let user_repo = UserRepository::new(db.clone());
        let company_repo = CompanyRepository::new(db.clone());
        let invitation_repo = CompanyInvitationRepository::new(db.clone());
        let request_repo = UserRequestRepository::new(db.clone());
        let quiz_repo = QuizRepository::new(db.clone());
        let result_repo = QuizResultRepository::new(db.clone());
        let notification_repo = NotificationRepository::new(db);

        // Cloned into the approval services below, so the publisher goes in first.
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
            Duration::from_secs(cache_config.result_ttl_secs),
        );
        grading.set_cache(cache);
        grading.set_event_publisher(publisher.clone());

        let analytics =
            AnalyticsService::new(result_repo.clone(), quiz_repo.clone(), company_repo.clone());

        let mut notifications = NotificationService::new(notification_repo.clone());
        notifications.set_event_publisher(publisher);

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
            result_repo,
            companies.clone(),
        );

        Self {
            users,
            companies,
            invitations,
            requests,
            quizzes,
            grading,
            analytics,
            notifications,
            reminders,
        }
    }
}
