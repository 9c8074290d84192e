//! Invitation service.
//!
//! Company owners and administrators invite users; the recipient accepts
//! or declines, or the company revokes the offer while it is pending.

use chrono::Utc;
use quizzes_common::{AppError, AppResult, IdGenerator};
use quizzes_db::entities::company_invitation::{self, InvitationStatus};
use quizzes_db::repositories::{CompanyInvitationRepository, CompanyRepository, UserRepository};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;

use super::approval::{self, Approvable};
use super::company::CompanyService;
use super::event_publisher::{EventDispatcher, EventPublisherService, StreamEvent};
use super::{access, begin, commit};

/// The recipient's answer to an invitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationResponse {
    Accept,
    Decline,
}

impl InvitationResponse {
    const fn status(self) -> InvitationStatus {
        match self {
            Self::Accept => InvitationStatus::Accepted,
            Self::Decline => InvitationStatus::Declined,
        }
    }
}

/// Service for company invitations.
#[derive(Clone)]
pub struct InvitationService {
    invitation_repo: CompanyInvitationRepository,
    company_repo: CompanyRepository,
    user_repo: UserRepository,
    companies: CompanyService,
    events: EventDispatcher,
    id_gen: IdGenerator,
}

impl InvitationService {
    /// Create a new invitation service.
    #[must_use]
    pub const fn new(
        invitation_repo: CompanyInvitationRepository,
        company_repo: CompanyRepository,
        user_repo: UserRepository,
        companies: CompanyService,
    ) -> Self {
        Self {
            invitation_repo,
            company_repo,
            user_repo,
            companies,
            events: EventDispatcher::disabled(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher for real-time events.
    pub fn set_event_publisher(&mut self, publisher: EventPublisherService) {
        self.events = EventDispatcher::new(publisher);
    }

    /// Invite `recipient_id` to join the company.
    pub async fn create_invitation(
        &self,
        sender_id: &str,
        company_id: &str,
        recipient_id: &str,
    ) -> AppResult<company_invitation::Model> {
        self.company_repo.get_by_id(company_id).await?;
        access::require_manager(&self.company_repo, company_id, sender_id).await?;
        self.user_repo.get_by_id(recipient_id).await?;

        if self.company_repo.is_member(company_id, recipient_id).await? {
            return Err(AppError::AlreadyMember(recipient_id.to_string()));
        }

        if self
            .invitation_repo
            .find_pending(company_id, recipient_id)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicatePending("invitation".to_string()));
        }

        let now = Utc::now();
        let model = company_invitation::ActiveModel {
            id: Set(self.id_gen.generate()),
            company_id: Set(company_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            recipient_id: Set(recipient_id.to_string()),
            status: Set(InvitationStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        // a concurrent duplicate is caught by the pending unique index
        let invitation = self.invitation_repo.create(model).await?;

        info!(
            invitation_id = %invitation.id,
            company_id = %company_id,
            recipient_id = %recipient_id,
            "Invitation sent"
        );

        self.events.dispatch(
            recipient_id,
            StreamEvent::InvitationReceived {
                invitation_id: invitation.id.clone(),
                company_id: company_id.to_string(),
            },
        );

        Ok(invitation)
    }

    /// Accept or decline an invitation. Recipient only.
    ///
    /// Accepting adds the recipient to the company in the same transaction;
    /// if that fails the invitation stays pending.
    pub async fn respond_to_invitation(
        &self,
        user_id: &str,
        invitation_id: &str,
        response: InvitationResponse,
    ) -> AppResult<company_invitation::Model> {
        let invitation = self.invitation_repo.get_by_id(invitation_id).await?;

        if invitation.recipient_id != user_id {
            return Err(AppError::Forbidden(
                "Only the recipient can respond to this invitation".to_string(),
            ));
        }

        let to = approval::check(&invitation, response.status())?;
        let now = Utc::now().into();

        let txn = begin(self.company_repo.db()).await?;
        let rows = self
            .invitation_repo
            .resolve(&txn, invitation_id, to, now)
            .await?;
        approval::ensure_applied(&invitation, to, rows)?;

        if response == InvitationResponse::Accept {
            self.companies
                .add_member(&txn, invitation.company_id(), invitation.joining_user_id())
                .await?;
        }
        commit(txn).await?;

        info!(invitation_id = %invitation_id, status = to.as_str(), "Invitation answered");

        let invitation = company_invitation::Model {
            status: to,
            updated_at: now,
            ..invitation
        };
        self.notify_resolved(&invitation, &invitation.sender_id);

        Ok(invitation)
    }

    /// Withdraw a pending invitation. Company owner or administrator only.
    pub async fn revoke_invitation(
        &self,
        actor_id: &str,
        invitation_id: &str,
    ) -> AppResult<company_invitation::Model> {
        let invitation = self.invitation_repo.get_by_id(invitation_id).await?;
        access::require_manager(&self.company_repo, &invitation.company_id, actor_id).await?;

        let to = approval::check(&invitation, InvitationStatus::Revoked)?;
        let now = Utc::now().into();

        let rows = self
            .invitation_repo
            .resolve(self.company_repo.db(), invitation_id, to, now)
            .await?;
        approval::ensure_applied(&invitation, to, rows)?;

        info!(invitation_id = %invitation_id, "Invitation revoked");

        let invitation = company_invitation::Model {
            status: to,
            updated_at: now,
            ..invitation
        };
        self.notify_resolved(&invitation, &invitation.recipient_id);

        Ok(invitation)
    }

    /// Invitations sent by a company. Owner or administrator only.
    pub async fn list_company_invitations(
        &self,
        actor_id: &str,
        company_id: &str,
    ) -> AppResult<Vec<company_invitation::Model>> {
        self.company_repo.get_by_id(company_id).await?;
        access::require_manager(&self.company_repo, company_id, actor_id).await?;

        self.invitation_repo.find_by_company(company_id).await
    }

    /// Invitations a user has received.
    pub async fn list_received_invitations(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<company_invitation::Model>> {
        self.invitation_repo.find_by_recipient(user_id).await
    }

    fn notify_resolved(&self, invitation: &company_invitation::Model, user_id: &str) {
        self.events.dispatch(
            user_id,
            StreamEvent::InvitationResolved {
                invitation_id: invitation.id.clone(),
                company_id: invitation.company_id.clone(),
                status: invitation.status.as_str().to_string(),
            },
        );
    }
}
