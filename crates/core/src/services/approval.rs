//! Shared lifecycle of invitations and join requests.
//!
//! Both start pending and end in exactly one terminal state. Terminal
//! states are absorbing: every transition out of pending is final and
//! nothing moves back to pending.

use quizzes_common::{AppError, AppResult};
use quizzes_db::entities::company_invitation::{self, InvitationStatus};
use quizzes_db::entities::user_request::{self, RequestStatus};
use std::fmt::Debug;

/// A closed status enum with a single non-terminal state.
pub trait ApprovalStatus: Copy + Eq + Debug + Send + Sync + 'static {
    /// The initial, non-terminal state.
    const PENDING: Self;

    /// Stored name of the status.
    fn name(&self) -> &'static str;

    /// Whether no further transition is possible.
    fn is_terminal(&self) -> bool {
        *self != Self::PENDING
    }
}

impl ApprovalStatus for InvitationStatus {
    const PENDING: Self = Self::Pending;

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

impl ApprovalStatus for RequestStatus {
    const PENDING: Self = Self::Pending;

    fn name(&self) -> &'static str {
        self.as_str()
    }
}

/// Something that asks for a user to join a company and waits for an answer.
pub trait Approvable {
    /// Status enum of the entity.
    type Status: ApprovalStatus;

    /// Human-readable entity name used in errors.
    const KIND: &'static str;

    fn id(&self) -> &str;

    fn company_id(&self) -> &str;

    /// The user who becomes a member if this is accepted or approved.
    fn joining_user_id(&self) -> &str;

    fn status(&self) -> Self::Status;
}

impl Approvable for company_invitation::Model {
    type Status = InvitationStatus;
    const KIND: &'static str = "invitation";

    fn id(&self) -> &str {
        &self.id
    }

    fn company_id(&self) -> &str {
        &self.company_id
    }

    fn joining_user_id(&self) -> &str {
        &self.recipient_id
    }

    fn status(&self) -> InvitationStatus {
        self.status
    }
}

impl Approvable for user_request::Model {
    type Status = RequestStatus;
    const KIND: &'static str = "request";

    fn id(&self) -> &str {
        &self.id
    }

    fn company_id(&self) -> &str {
        &self.company_id
    }

    fn joining_user_id(&self) -> &str {
        &self.sender_id
    }

    fn status(&self) -> RequestStatus {
        self.status
    }
}

/// Validate a status change.
pub fn transition<S: ApprovalStatus>(from: S, to: S) -> AppResult<S> {
    if from.is_terminal() || !to.is_terminal() {
        return Err(AppError::InvalidStateTransition {
            from: from.name().to_string(),
            to: to.name().to_string(),
        });
    }

    Ok(to)
}

/// Validate moving `item` to `to`.
pub fn check<A: Approvable>(item: &A, to: A::Status) -> AppResult<A::Status> {
    transition(item.status(), to)
}

/// Turn the row count of a conditional status update into a result.
///
/// Zero rows means a concurrent transition got there first.
pub fn ensure_applied<A: Approvable>(item: &A, to: A::Status, rows: u64) -> AppResult<()> {
    if rows == 0 {
        tracing::debug!(kind = A::KIND, id = item.id(), "Lost transition race");
        return Err(AppError::InvalidStateTransition {
            from: format!("{} (already resolved)", item.status().name()),
            to: to.name().to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_moves_to_any_terminal_state() {
        for to in [
            InvitationStatus::Accepted,
            InvitationStatus::Declined,
            InvitationStatus::Revoked,
        ] {
            assert_eq!(transition(InvitationStatus::Pending, to).ok(), Some(to));
        }
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        for from in [
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Cancelled,
        ] {
            for to in [
                RequestStatus::Pending,
                RequestStatus::Approved,
                RequestStatus::Rejected,
                RequestStatus::Cancelled,
            ] {
                assert!(matches!(
                    transition(from, to),
                    Err(AppError::InvalidStateTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn test_pending_to_pending_is_rejected() {
        let err = transition(InvitationStatus::Pending, InvitationStatus::Pending);
        assert!(matches!(err, Err(AppError::InvalidStateTransition { .. })));
    }

    #[test]
    fn test_request_exposes_sender_as_joining_user() {
        let now = chrono::Utc::now().into();
        let request = user_request::Model {
            id: "r1".to_string(),
            company_id: "acme".to_string(),
            sender_id: "bob".to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        assert_eq!(request.joining_user_id(), "bob");
        assert!(ensure_applied(&request, RequestStatus::Approved, 0).is_err());
        assert!(ensure_applied(&request, RequestStatus::Approved, 1).is_ok());
    }
}
