//! User service.

use chrono::Utc;
use quizzes_common::{AppError, AppResult, IdGenerator};
use quizzes_db::entities::user;
use quizzes_db::repositories::{
    CompanyInvitationRepository, CompanyRepository, NotificationRepository,
    QuizResultRepository, UserRepository, UserRequestRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use super::company::CompanyService;
use super::{begin, commit};

/// Input for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: Option<String>,
}

/// User service for account lifecycle.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    company_repo: CompanyRepository,
    invitation_repo: CompanyInvitationRepository,
    request_repo: UserRequestRepository,
    notification_repo: NotificationRepository,
    result_repo: QuizResultRepository,
    companies: CompanyService,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        user_repo: UserRepository,
        company_repo: CompanyRepository,
        invitation_repo: CompanyInvitationRepository,
        request_repo: UserRequestRepository,
        notification_repo: NotificationRepository,
        result_repo: QuizResultRepository,
        companies: CompanyService,
    ) -> Self {
        Self {
            user_repo,
            company_repo,
            invitation_repo,
            request_repo,
            notification_repo,
            result_repo,
            companies,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user.
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            email: Set(input.email),
            created_at: Set(Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;

        info!(user_id = %user.id, username = %user.username, "User created");
        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Delete a user account.
    ///
    /// Companies the user owns are deleted with everything in them. Their
    /// results in other companies stay, detached from the account.
    pub async fn delete_user(&self, user_id: &str) -> AppResult<()> {
        self.user_repo.get_by_id(user_id).await?;

        let txn = begin(self.user_repo.db()).await?;

        for company in self.company_repo.find_owned_by_user(&txn, user_id).await? {
            self.companies.purge(&txn, &company.id).await?;
        }

        self.company_repo
            .delete_memberships_of_user(&txn, user_id)
            .await?;
        self.invitation_repo.delete_by_user(&txn, user_id).await?;
        self.request_repo.delete_by_sender(&txn, user_id).await?;
        self.notification_repo.delete_by_user(&txn, user_id).await?;
        let detached = self.result_repo.detach_user(&txn, user_id).await?;
        self.user_repo.delete(&txn, user_id).await?;

        commit(txn).await?;

        info!(user_id = %user_id, detached_results = detached, "User deleted");
        Ok(())
    }
}
