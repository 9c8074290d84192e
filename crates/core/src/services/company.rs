//! Company service.

use chrono::Utc;
use quizzes_common::{AppError, AppResult, IdGenerator};
use quizzes_db::entities::company_invitation::InvitationStatus;
use quizzes_db::entities::company_member::CompanyRole;
use quizzes_db::entities::user_request::RequestStatus;
use quizzes_db::entities::{company, company_member};
use quizzes_db::repositories::{
    CompanyInvitationRepository, CompanyRepository, QuizRepository, UserRequestRepository,
};
use sea_orm::{ConnectionTrait, Set};
use serde::Deserialize;
use tracing::{debug, info};
use validator::Validate;

use super::{access, begin, commit};
use super::event_publisher::{EventDispatcher, EventPublisherService, StreamEvent};

/// Input for creating a company.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompanyInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(max = 4096))]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

const fn default_true() -> bool {
    true
}

/// Input for updating a company.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompanyInput {
    pub company_id: String,
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    #[validate(length(max = 4096))]
    pub description: Option<Option<String>>,
    pub visible: Option<bool>,
}

/// Service for companies and their membership.
#[derive(Clone)]
pub struct CompanyService {
    company_repo: CompanyRepository,
    invitation_repo: CompanyInvitationRepository,
    request_repo: UserRequestRepository,
    quiz_repo: QuizRepository,
    events: EventDispatcher,
    id_gen: IdGenerator,
}

impl CompanyService {
    /// Create a new company service.
    #[must_use]
    pub const fn new(
        company_repo: CompanyRepository,
        invitation_repo: CompanyInvitationRepository,
        request_repo: UserRequestRepository,
        quiz_repo: QuizRepository,
    ) -> Self {
        Self {
            company_repo,
            invitation_repo,
            request_repo,
            quiz_repo,
            events: EventDispatcher::disabled(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher for real-time events.
    pub fn set_event_publisher(&mut self, publisher: EventPublisherService) {
        self.events = EventDispatcher::new(publisher);
    }

    // ==================== Company Operations ====================

    /// Create a company owned by `owner_id`, who also becomes its first member.
    pub async fn create_company(
        &self,
        owner_id: &str,
        input: CreateCompanyInput,
    ) -> AppResult<company::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let company_id = self.id_gen.generate();
        let now = Utc::now();

        let model = company::ActiveModel {
            id: Set(company_id.clone()),
            owner_id: Set(owner_id.to_string()),
            name: Set(input.name),
            description: Set(input.description),
            visible: Set(input.visible),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        let owner = company_member::ActiveModel {
            id: Set(self.id_gen.generate()),
            company_id: Set(company_id.clone()),
            user_id: Set(owner_id.to_string()),
            role: Set(CompanyRole::Owner),
            joined_at: Set(now.into()),
        };

        let txn = begin(self.company_repo.db()).await?;
        let company = self.company_repo.create(&txn, model).await?;
        self.company_repo.add_member(&txn, owner).await?;
        commit(txn).await?;

        info!(company_id = %company_id, owner_id = %owner_id, "Company created");
        Ok(company)
    }

    /// Update a company. Owner only.
    pub async fn update_company(
        &self,
        actor_id: &str,
        input: UpdateCompanyInput,
    ) -> AppResult<company::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let company = self.company_repo.get_by_id(&input.company_id).await?;
        access::require_owner(&company, actor_id)?;

        let mut active: company::ActiveModel = company.into();

        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(visible) = input.visible {
            active.visible = Set(visible);
        }

        active.updated_at = Set(Some(Utc::now().into()));

        self.company_repo.update(active).await
    }

    /// Delete a company and everything that belongs to it. Owner only.
    pub async fn delete_company(&self, actor_id: &str, company_id: &str) -> AppResult<()> {
        let company = self.company_repo.get_by_id(company_id).await?;
        access::require_owner(&company, actor_id)?;

        let txn = begin(self.company_repo.db()).await?;
        self.purge(&txn, company_id).await?;
        commit(txn).await?;

        info!(company_id = %company_id, "Company deleted");
        Ok(())
    }

    /// Remove a company with its quizzes, results, invitations, requests
    /// and membership rows.
    pub(crate) async fn purge<C: ConnectionTrait>(&self, conn: &C, company_id: &str) -> AppResult<()> {
        for quiz in self.quiz_repo.find_by_company(conn, company_id).await? {
            self.quiz_repo.delete(conn, &quiz.id).await?;
        }

        self.invitation_repo.delete_by_company(conn, company_id).await?;
        self.request_repo.delete_by_company(conn, company_id).await?;
        self.company_repo
            .delete_members_of_company(conn, company_id)
            .await?;
        self.company_repo.delete(conn, company_id).await
    }

    /// Get a company by ID.
    pub async fn get_company(&self, company_id: &str) -> AppResult<company::Model> {
        self.company_repo.get_by_id(company_id).await
    }

    /// Companies shown in public listings.
    pub async fn list_visible(&self) -> AppResult<Vec<company::Model>> {
        self.company_repo.find_visible().await
    }

    /// Companies a user belongs to, hidden ones included.
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<company::Model>> {
        self.company_repo.find_joined_by_user(user_id).await
    }

    // ==================== Member Operations ====================

    /// Membership rows of a company, the owner's included.
    pub async fn list_members(&self, company_id: &str) -> AppResult<Vec<company_member::Model>> {
        self.company_repo.get_by_id(company_id).await?;
        self.company_repo.find_members(company_id).await
    }

    /// Members holding the administrator role. Never contains the owner.
    pub async fn list_administrators(
        &self,
        company_id: &str,
    ) -> AppResult<Vec<company_member::Model>> {
        self.company_repo.get_by_id(company_id).await?;
        self.company_repo.find_administrators(company_id).await
    }

    /// Add `user_id` to the company as a plain member.
    ///
    /// Runs on `conn` so that accepting an invitation or approving a request
    /// inserts the membership in the same transaction as the status change.
    /// A pending row left on the other path for the same pair is settled as
    /// accepted or approved, since the user is now in.
    pub async fn add_member<C: ConnectionTrait>(
        &self,
        conn: &C,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<company_member::Model> {
        if self
            .company_repo
            .find_member(conn, company_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyMember(user_id.to_string()));
        }

        let model = company_member::ActiveModel {
            id: Set(self.id_gen.generate()),
            company_id: Set(company_id.to_string()),
            user_id: Set(user_id.to_string()),
            role: Set(CompanyRole::Member),
            joined_at: Set(Utc::now().into()),
        };

        let member = self.company_repo.add_member(conn, model).await?;

        let now = Utc::now().into();
        let invitations = self
            .invitation_repo
            .settle_pending(conn, company_id, user_id, InvitationStatus::Accepted, now)
            .await?;
        let requests = self
            .request_repo
            .settle_pending(conn, company_id, user_id, RequestStatus::Approved, now)
            .await?;
        if invitations + requests > 0 {
            debug!(company_id, user_id, invitations, requests, "Settled pending rows on join");
        }

        Ok(member)
    }

    /// Remove a member from the company. Owner only.
    pub async fn remove_member(
        &self,
        actor_id: &str,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<()> {
        let company = self.company_repo.get_by_id(company_id).await?;
        access::require_owner(&company, actor_id)?;

        if company.owner_id == user_id {
            return Err(AppError::OwnerProtected("be removed".to_string()));
        }

        // the membership row carries the role, so this also drops admin rights
        let removed = self.company_repo.remove_member(company_id, user_id).await?;
        if removed == 0 {
            return Err(AppError::NotAMember(user_id.to_string()));
        }

        info!(company_id = %company_id, user_id = %user_id, "Member removed");

        self.events.dispatch(
            user_id,
            StreamEvent::MemberRemoved {
                company_id: company_id.to_string(),
            },
        );

        Ok(())
    }

    /// Grant the administrator role to a member. Owner only.
    pub async fn promote_admin(
        &self,
        actor_id: &str,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<company_member::Model> {
        let company = self.company_repo.get_by_id(company_id).await?;
        access::require_owner(&company, actor_id)?;

        if company.owner_id == user_id {
            return Err(AppError::OwnerCannotBeAdmin);
        }

        let member = self
            .company_repo
            .find_member(self.company_repo.db(), company_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotAMember(user_id.to_string()))?;

        if member.role == CompanyRole::Administrator {
            return Err(AppError::Validation(format!(
                "User {user_id} is already an administrator"
            )));
        }

        let member = self
            .company_repo
            .set_role(member, CompanyRole::Administrator)
            .await?;

        info!(company_id = %company_id, user_id = %user_id, "Administrator added");
        Ok(member)
    }

    /// Take the administrator role away from a member. Owner only.
    pub async fn demote_admin(
        &self,
        actor_id: &str,
        company_id: &str,
        user_id: &str,
    ) -> AppResult<company_member::Model> {
        let company = self.company_repo.get_by_id(company_id).await?;
        access::require_owner(&company, actor_id)?;

        let member = self
            .company_repo
            .find_member(self.company_repo.db(), company_id, user_id)
            .await?
            .filter(|m| m.role == CompanyRole::Administrator)
            .ok_or_else(|| AppError::NotAnAdministrator(user_id.to_string()))?;

        let member = self.company_repo.set_role(member, CompanyRole::Member).await?;

        info!(company_id = %company_id, user_id = %user_id, "Administrator removed");
        Ok(member)
    }

    /// Leave a company.
    pub async fn leave_company(&self, user_id: &str, company_id: &str) -> AppResult<()> {
        let company = self.company_repo.get_by_id(company_id).await?;

        if company.owner_id == user_id {
            return Err(AppError::OwnerProtected("leave the company".to_string()));
        }

        let removed = self.company_repo.remove_member(company_id, user_id).await?;
        if removed == 0 {
            return Err(AppError::NotAMember(user_id.to_string()));
        }

        info!(company_id = %company_id, user_id = %user_id, "Member left");
        Ok(())
    }
}
