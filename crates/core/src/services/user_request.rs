//! Join request service.

use chrono::Utc;
use quizzes_common::{AppError, AppResult, IdGenerator};
use quizzes_db::entities::user_request::{self, RequestStatus};
use quizzes_db::repositories::{CompanyRepository, UserRequestRepository};
use sea_orm::Set;
use tracing::info;

use super::approval::{self, Approvable};
use super::company::CompanyService;
use super::event_publisher::{EventDispatcher, EventPublisherService, StreamEvent};
use super::{access, begin, commit};

/// Service for user-initiated requests to join a company.
#[derive(Clone)]
pub struct RequestService {
    request_repo: UserRequestRepository,
    company_repo: CompanyRepository,
    companies: CompanyService,
    events: EventDispatcher,
    id_gen: IdGenerator,
}

impl RequestService {
    /// Create a new request service.
    #[must_use]
    pub const fn new(
        request_repo: UserRequestRepository,
        company_repo: CompanyRepository,
        companies: CompanyService,
    ) -> Self {
        Self {
            request_repo,
            company_repo,
            companies,
            events: EventDispatcher::disabled(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Set the event publisher for real-time events.
    pub fn set_event_publisher(&mut self, publisher: EventPublisherService) {
        self.events = EventDispatcher::new(publisher);
    }

    /// Ask to join a company.
    pub async fn create_request(
        &self,
        sender_id: &str,
        company_id: &str,
    ) -> AppResult<user_request::Model> {
        let company = self.company_repo.get_by_id(company_id).await?;

        if self.company_repo.is_member(company_id, sender_id).await? {
            return Err(AppError::AlreadyMember(sender_id.to_string()));
        }

        if self
            .request_repo
            .find_pending(company_id, sender_id)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicatePending("request".to_string()));
        }

        let now = Utc::now();
        let model = user_request::ActiveModel {
            id: Set(self.id_gen.generate()),
            company_id: Set(company_id.to_string()),
            sender_id: Set(sender_id.to_string()),
            status: Set(RequestStatus::Pending),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let request = self.request_repo.create(model).await?;

        info!(request_id = %request.id, company_id = %company_id, sender_id = %sender_id, "Join request sent");

        self.events.dispatch(
            company.owner_id,
            StreamEvent::RequestReceived {
                request_id: request.id.clone(),
                company_id: company_id.to_string(),
                sender_id: sender_id.to_string(),
            },
        );

        Ok(request)
    }

    /// Withdraw a pending request. Sender only.
    pub async fn cancel_request(
        &self,
        user_id: &str,
        request_id: &str,
    ) -> AppResult<user_request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;

        if request.sender_id != user_id {
            return Err(AppError::Forbidden(
                "Only the sender can cancel this request".to_string(),
            ));
        }

        self.resolve(request, RequestStatus::Cancelled).await
    }

    /// Approve a request, making the sender a member.
    pub async fn approve_request(
        &self,
        actor_id: &str,
        request_id: &str,
    ) -> AppResult<user_request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;
        access::require_manager(&self.company_repo, &request.company_id, actor_id).await?;

        self.resolve(request, RequestStatus::Approved).await
    }

    /// Turn a request down.
    pub async fn reject_request(
        &self,
        actor_id: &str,
        request_id: &str,
    ) -> AppResult<user_request::Model> {
        let request = self.request_repo.get_by_id(request_id).await?;
        access::require_manager(&self.company_repo, &request.company_id, actor_id).await?;

        self.resolve(request, RequestStatus::Rejected).await
    }

    /// Requests sent to a company. Owner or administrator only.
    pub async fn list_company_requests(
        &self,
        actor_id: &str,
        company_id: &str,
    ) -> AppResult<Vec<user_request::Model>> {
        self.company_repo.get_by_id(company_id).await?;
        access::require_manager(&self.company_repo, company_id, actor_id).await?;

        self.request_repo.find_by_company(company_id).await
    }

    /// Requests a user has sent.
    pub async fn list_sent_requests(&self, user_id: &str) -> AppResult<Vec<user_request::Model>> {
        self.request_repo.find_by_sender(user_id).await
    }

    async fn resolve(
        &self,
        request: user_request::Model,
        to: RequestStatus,
    ) -> AppResult<user_request::Model> {
        let to = approval::check(&request, to)?;
        let now = Utc::now().into();

        let txn = begin(self.company_repo.db()).await?;
        let rows = self.request_repo.resolve(&txn, request.id(), to, now).await?;
        approval::ensure_applied(&request, to, rows)?;

        if to == RequestStatus::Approved {
            self.companies
                .add_member(&txn, request.company_id(), request.joining_user_id())
                .await?;
        }
        commit(txn).await?;

        info!(request_id = %request.id, status = to.as_str(), "Join request resolved");

        let request = user_request::Model {
            status: to,
            updated_at: now,
            ..request
        };

        if to != RequestStatus::Cancelled {
            self.events.dispatch(
                request.sender_id.clone(),
                StreamEvent::RequestResolved {
                    request_id: request.id.clone(),
                    company_id: request.company_id.clone(),
                    status: to.as_str().to_string(),
                },
            );
        }

        Ok(request)
    }
}
