//! Notification repository.

use std::sync::Arc;

use chrono::Utc;
use quizzes_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::notification::NotificationStatus;
use crate::entities::{Notification, notification};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a new notification.
    pub async fn create(
        &self,
        model: notification::ActiveModel,
    ) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// A user's notifications, newest first.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        status: Option<NotificationStatus>,
    ) -> AppResult<Vec<notification::Model>> {
        let mut query = Notification::find().filter(notification::Column::UserId.eq(user_id));

        if let Some(status) = status {
            query = query.filter(notification::Column::Status.eq(status));
        }

        query
            .order_by(notification::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a notification as read.
    pub async fn mark_as_read(
        &self,
        model: notification::Model,
    ) -> AppResult<notification::Model> {
        let mut active: notification::ActiveModel = model.into();
        active.status = Set(NotificationStatus::Read);
        active.updated_at = Set(Some(Utc::now().into()));

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every notification of a user.
    pub async fn delete_by_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<()> {
        Notification::delete_many()
            .filter(notification::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
