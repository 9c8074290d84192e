//! Company repository.

use std::sync::Arc;

use quizzes_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder, Set,
};

use super::map_insert_err;
use crate::entities::company_member::CompanyRole;
use crate::entities::{Company, CompanyMember, company, company_member};

/// Repository for companies and their membership rows.
#[derive(Clone)]
pub struct CompanyRepository {
    db: Arc<DatabaseConnection>,
}

impl CompanyRepository {
    /// Create a new company repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get reference to the database connection.
    #[must_use]
    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    // ==================== Company Operations ====================

    /// Find company by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<company::Model>> {
        Company::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get company by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<company::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Company not found: {id}")))
    }

    /// Find companies shown in public listings.
    pub async fn find_visible(&self) -> AppResult<Vec<company::Model>> {
        Company::find()
            .filter(company::Column::Visible.eq(true))
            .order_by(company::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find companies a user is a member of (owned ones included).
    pub async fn find_joined_by_user(&self, user_id: &str) -> AppResult<Vec<company::Model>> {
        let company_ids = self.find_company_ids_for_user(user_id).await?;

        if company_ids.is_empty() {
            return Ok(vec![]);
        }

        Company::find()
            .filter(company::Column::Id.is_in(company_ids))
            .order_by(company::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find companies owned by a user.
    pub async fn find_owned_by_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<Vec<company::Model>> {
        Company::find()
            .filter(company::Column::OwnerId.eq(user_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new company.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: company::ActiveModel,
    ) -> AppResult<company::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a company.
    pub async fn update(&self, model: company::ActiveModel) -> AppResult<company::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a company row. Dependent rows must already be gone.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        Company::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // ==================== Member Operations ====================

    /// Find a user's membership row in a company.
    pub async fn find_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<Option<company_member::Model>> {
        CompanyMember::find()
            .filter(company_member::Column::CompanyId.eq(company_id))
            .filter(company_member::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user is a member of a company.
    pub async fn is_member(&self, company_id: &str, user_id: &str) -> AppResult<bool> {
        Ok(self
            .find_member(self.db.as_ref(), company_id, user_id)
            .await?
            .is_some())
    }

    /// All membership rows of a company, in join order.
    pub async fn find_members(&self, company_id: &str) -> AppResult<Vec<company_member::Model>> {
        CompanyMember::find()
            .filter(company_member::Column::CompanyId.eq(company_id))
            .order_by(company_member::Column::JoinedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Membership rows holding the administrator role.
    pub async fn find_administrators(
        &self,
        company_id: &str,
    ) -> AppResult<Vec<company_member::Model>> {
        CompanyMember::find()
            .filter(company_member::Column::CompanyId.eq(company_id))
            .filter(company_member::Column::Role.eq(CompanyRole::Administrator))
            .order_by(company_member::Column::JoinedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// IDs of the companies a user belongs to.
    pub async fn find_company_ids_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        let memberships = CompanyMember::find()
            .filter(company_member::Column::UserId.eq(user_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(memberships.into_iter().map(|m| m.company_id).collect())
    }

    /// Every membership row, for sweeps over all (user, company) pairs.
    pub async fn find_all_members(&self) -> AppResult<Vec<company_member::Model>> {
        CompanyMember::find()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a membership row.
    ///
    /// The `(company_id, user_id)` unique index turns a concurrent double
    /// join into [`AppError::AlreadyMember`].
    pub async fn add_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: company_member::ActiveModel,
    ) -> AppResult<company_member::Model> {
        let user_id = model.user_id.clone().take().unwrap_or_default();

        model
            .insert(conn)
            .await
            .map_err(|e| map_insert_err(e, || AppError::AlreadyMember(user_id)))
    }

    /// Change the role of a membership row.
    pub async fn set_role(
        &self,
        member: company_member::Model,
        role: CompanyRole,
    ) -> AppResult<company_member::Model> {
        let mut active: company_member::ActiveModel = member.into();
        active.role = Set(role);

        active
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a user's membership row. Returns the number of rows removed.
    pub async fn remove_member(&self, company_id: &str, user_id: &str) -> AppResult<u64> {
        let result = CompanyMember::delete_many()
            .filter(company_member::Column::CompanyId.eq(company_id))
            .filter(company_member::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Remove every membership row of a company.
    pub async fn delete_members_of_company<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
    ) -> AppResult<()> {
        CompanyMember::delete_many()
            .filter(company_member::Column::CompanyId.eq(company_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Remove every membership row of a user.
    pub async fn delete_memberships_of_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<()> {
        CompanyMember::delete_many()
            .filter(company_member::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
