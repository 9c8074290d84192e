//! Company invitation repository.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use quizzes_common::{AppError, AppResult};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder,
};

use super::map_insert_err;
use crate::entities::company_invitation::InvitationStatus;
use crate::entities::{CompanyInvitation, company_invitation};

/// Repository for company invitations.
#[derive(Clone)]
pub struct CompanyInvitationRepository {
    db: Arc<DatabaseConnection>,
}

impl CompanyInvitationRepository {
    /// Create a new invitation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an invitation by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<company_invitation::Model>> {
        CompanyInvitation::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an invitation by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<company_invitation::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Invitation not found: {id}")))
    }

    /// Find the pending invitation for a (company, recipient) pair.
    pub async fn find_pending(
        &self,
        company_id: &str,
        recipient_id: &str,
    ) -> AppResult<Option<company_invitation::Model>> {
        CompanyInvitation::find()
            .filter(company_invitation::Column::CompanyId.eq(company_id))
            .filter(company_invitation::Column::RecipientId.eq(recipient_id))
            .filter(company_invitation::Column::Status.eq(InvitationStatus::Pending))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Invitations addressed to a user, newest first.
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
    ) -> AppResult<Vec<company_invitation::Model>> {
        CompanyInvitation::find()
            .filter(company_invitation::Column::RecipientId.eq(recipient_id))
            .order_by(company_invitation::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Invitations sent by a company, newest first.
    pub async fn find_by_company(
        &self,
        company_id: &str,
    ) -> AppResult<Vec<company_invitation::Model>> {
        CompanyInvitation::find()
            .filter(company_invitation::Column::CompanyId.eq(company_id))
            .order_by(company_invitation::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create an invitation. A second pending row for the same pair is
    /// rejected by the partial unique index.
    pub async fn create(
        &self,
        model: company_invitation::ActiveModel,
    ) -> AppResult<company_invitation::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            map_insert_err(e, || AppError::DuplicatePending("invitation".to_string()))
        })
    }

    /// Move a pending invitation to `status`.
    ///
    /// Only rows still pending are touched; returns the number of rows
    /// updated, so 0 means another transition won.
    pub async fn resolve<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
        status: InvitationStatus,
        now: DateTime<FixedOffset>,
    ) -> AppResult<u64> {
        let result = CompanyInvitation::update_many()
            .col_expr(company_invitation::Column::Status, Expr::value(status))
            .col_expr(company_invitation::Column::UpdatedAt, Expr::value(now))
            .filter(company_invitation::Column::Id.eq(id))
            .filter(company_invitation::Column::Status.eq(InvitationStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Move whatever invitation is pending for `(company_id, recipient_id)`
    /// to `status`. Returns the number of rows updated.
    pub async fn settle_pending<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
        recipient_id: &str,
        status: InvitationStatus,
        now: DateTime<FixedOffset>,
    ) -> AppResult<u64> {
        let result = CompanyInvitation::update_many()
            .col_expr(company_invitation::Column::Status, Expr::value(status))
            .col_expr(company_invitation::Column::UpdatedAt, Expr::value(now))
            .filter(company_invitation::Column::CompanyId.eq(company_id))
            .filter(company_invitation::Column::RecipientId.eq(recipient_id))
            .filter(company_invitation::Column::Status.eq(InvitationStatus::Pending))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every invitation of a company.
    pub async fn delete_by_company<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
    ) -> AppResult<()> {
        CompanyInvitation::delete_many()
            .filter(company_invitation::Column::CompanyId.eq(company_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Delete every invitation a user sent or received.
    pub async fn delete_by_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<()> {
        CompanyInvitation::delete_many()
            .filter(
                Condition::any()
                    .add(company_invitation::Column::SenderId.eq(user_id))
                    .add(company_invitation::Column::RecipientId.eq(user_id)),
            )
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_invitation(id: &str, status: InvitationStatus) -> company_invitation::Model {
        let now = Utc::now().into();
        company_invitation::Model {
            id: id.to_string(),
            company_id: "c1".to_string(),
            sender_id: "owner".to_string(),
            recipient_id: "bob".to_string(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_find_pending_returns_invitation() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_invitation(
                    "inv1",
                    InvitationStatus::Pending,
                )]])
                .into_connection(),
        );

        let repo = CompanyInvitationRepository::new(db);
        let found = repo.find_pending("c1", "bob").await.unwrap().unwrap();

        assert_eq!(found.id, "inv1");
        assert_eq!(found.status, InvitationStatus::Pending);
    }

    #[tokio::test]
    async fn test_resolve_reports_lost_race() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = CompanyInvitationRepository::new(db.clone());
        let updated = repo
            .resolve(
                db.as_ref(),
                "inv1",
                InvitationStatus::Accepted,
                Utc::now().into(),
            )
            .await
            .unwrap();

        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<company_invitation::Model>::new()])
                .into_connection(),
        );

        let repo = CompanyInvitationRepository::new(db);
        assert!(matches!(
            repo.get_by_id("nope").await,
            Err(AppError::NotFound(_))
        ));
    }
}
