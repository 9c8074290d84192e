//! Notification service.

use chrono::Utc;
use quizzes_common::{AppError, AppResult, IdGenerator};
use quizzes_db::entities::notification::{self, NotificationStatus, NotificationType};
use quizzes_db::entities::quiz;
use quizzes_db::repositories::NotificationRepository;
use sea_orm::Set;

use super::event_publisher::{EventDispatcher, EventPublisherService, StreamEvent};

/// Service for stored user notifications.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    events: EventDispatcher,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            events: EventDispatcher::disabled(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher for real-time events.
    pub fn set_event_publisher(&mut self, publisher: EventPublisherService) {
        self.events = EventDispatcher::new(publisher);
    }

    /// Store a plain text notification for a user and push it.
    pub async fn create(&self, user_id: &str, text: &str) -> AppResult<notification::Model> {
        self.insert(user_id, NotificationType::App, None, text.to_string())
            .await
    }

    /// Store a reminder to retake `quiz`.
    pub async fn create_reminder(
        &self,
        user_id: &str,
        quiz: &quiz::Model,
    ) -> AppResult<notification::Model> {
        self.insert(
            user_id,
            NotificationType::QuizReminder,
            Some(quiz.id.clone()),
            format!("Pass the quiz again: {}", quiz.title),
        )
        .await
    }

    /// Unread notifications of a user, newest first.
    pub async fn list_pending(&self, user_id: &str) -> AppResult<Vec<notification::Model>> {
        self.notification_repo
            .find_by_user(user_id, Some(NotificationStatus::Pending))
            .await
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_as_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> AppResult<notification::Model> {
        // someone else's notification is reported as missing
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("Notification not found: {notification_id}"))
            })?;

        if notification.status == NotificationStatus::Read {
            return Ok(notification);
        }

        self.notification_repo.mark_as_read(notification).await
    }

    async fn insert(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        quiz_id: Option<String>,
        text: String,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            notification_type: Set(notification_type),
            quiz_id: Set(quiz_id),
            text: Set(text),
            status: Set(NotificationStatus::Pending),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let notification = self.notification_repo.create(model).await?;

        self.events.dispatch(
            user_id,
            StreamEvent::Notification {
                id: notification.id.clone(),
                notification_type: match notification.notification_type {
                    NotificationType::QuizReminder => "quizReminder",
                    NotificationType::App => "app",
                }
                .to_string(),
                text: notification.text.clone(),
            },
        );

        Ok(notification)
    }
}
