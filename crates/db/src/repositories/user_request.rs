//! User join-request repository.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use quizzes_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder,
};

use super::map_insert_err;
use crate::entities::user_request::RequestStatus;
use crate::entities::{UserRequest, user_request};

/// Repository for requests to join a company.
#[derive(Clone)]
pub struct UserRequestRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRequestRepository {
    /// Create a new request repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a request by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user_request::Model>> {
        UserRequest::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a request by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user_request::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Request not found: {id}")))
    }

    /// Find the pending request for a (sender, company) pair.
    pub async fn find_pending(
        &self,
        company_id: &str,
        sender_id: &str,
    ) -> AppResult<Option<user_request::Model>> {
        UserRequest::find()
            .filter(user_request::Column::CompanyId.eq(company_id))
            .filter(user_request::Column::SenderId.eq(sender_id))
            .filter(user_request::Column::Status.eq(RequestStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Requests a user has sent, newest first.
    pub async fn find_by_sender(&self, sender_id: &str) -> AppResult<Vec<user_request::Model>> {
        UserRequest::find()
            .filter(user_request::Column::SenderId.eq(sender_id))
            .order_by(user_request::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Requests made to a company, newest first.
    pub async fn find_by_company(&self, company_id: &str) -> AppResult<Vec<user_request::Model>> {
        UserRequest::find()
            .filter(user_request::Column::CompanyId.eq(company_id))
            .order_by(user_request::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a request. A second pending row for the same pair is rejected
    /// by the partial unique index.
    pub async fn create(&self, model: user_request::ActiveModel) -> AppResult<user_request::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_insert_err(e, || AppError::DuplicatePending("request".to_string())))
    }

    /// Move a pending request to `status`. Returns the number of rows
    /// updated; 0 means the request was no longer pending.
    pub async fn resolve<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        status: RequestStatus,
        now: DateTime<FixedOffset>,
    ) -> AppResult<u64> {
        let result = UserRequest::update_many()
            .col_expr(user_request::Column::Status, Expr::value(status))
            .col_expr(user_request::Column::UpdatedAt, Expr::value(now))
            .filter(user_request::Column::Id.eq(id))
            .filter(user_request::Column::Status.eq(RequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Move whatever request `sender_id` has pending at `company_id` to
    /// `status`. Returns the number of rows updated.
    pub async fn settle_pending<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
        sender_id: &str,
        status: RequestStatus,
        now: DateTime<FixedOffset>,
    ) -> AppResult<u64> {
        let result = UserRequest::update_many()
            .col_expr(user_request::Column::Status, Expr::value(status))
            .col_expr(user_request::Column::UpdatedAt, Expr::value(now))
            .filter(user_request::Column::CompanyId.eq(company_id))
            .filter(user_request::Column::SenderId.eq(sender_id))
            .filter(user_request::Column::Status.eq(RequestStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every request made to a company.
    pub async fn delete_by_company<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
    ) -> AppResult<()> {
        UserRequest::delete_many()
            .filter(user_request::Column::CompanyId.eq(company_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete every request a user sent.
    pub async fn delete_by_sender<C: ConnectionTrait>(
        &self,
        conn: &C,
        sender_id: &str,
    ) -> AppResult<()> {
        UserRequest::delete_many()
            .filter(user_request::Column::SenderId.eq(sender_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
