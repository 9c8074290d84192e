//! Invitation and join request lifecycles.

#![allow(clippy::unwrap_used)]

mod common;

use common::Fixture;
use quizzes_common::AppError;
use quizzes_core::{Approvable, InvitationResponse, StreamEvent};
use quizzes_db::entities::company_invitation::InvitationStatus;
use quizzes_db::entities::user_request::RequestStatus;

#[tokio::test]
async fn test_request_approved_once() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;

    let request = fx.requests.create_request(&bob.id, &acme.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    let approved = fx
        .requests
        .approve_request(&alice.id, &request.id)
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(approved.updated_at >= approved.created_at);

    let members = fx.companies.list_members(&acme.id).await.unwrap();
    assert!(members.iter().any(|m| m.user_id == bob.id));

    let err = fx
        .requests
        .approve_request(&alice.id, &request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    let sent = fx.requests.list_sent_requests(&bob.id).await.unwrap();
    assert_eq!(sent[0].status, RequestStatus::Approved);
}

#[tokio::test]
async fn test_request_rules() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;
    let globex = fx.company(&alice, "Globex").await;

    let err = fx
        .requests
        .create_request(&alice.id, &acme.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyMember(_)));

    let err = fx
        .requests
        .create_request(&bob.id, "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    fx.requests.create_request(&bob.id, &acme.id).await.unwrap();
    let err = fx
        .requests
        .create_request(&bob.id, &acme.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicatePending(_)));

    // pending entries are unique per company only
    fx.requests.create_request(&bob.id, &globex.id).await.unwrap();
}

#[tokio::test]
async fn test_request_cancel_and_reject() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let carol = fx.user("carol").await;
    let acme = fx.company(&alice, "Acme").await;

    let request = fx.requests.create_request(&bob.id, &acme.id).await.unwrap();

    let err = fx
        .requests
        .cancel_request(&carol.id, &request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = fx
        .requests
        .reject_request(&carol.id, &request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let cancelled = fx
        .requests
        .cancel_request(&bob.id, &request.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);

    let err = fx
        .requests
        .reject_request(&alice.id, &request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    // a resolved request does not block a new one
    let again = fx.requests.create_request(&bob.id, &acme.id).await.unwrap();
    let rejected = fx
        .requests
        .reject_request(&alice.id, &again.id)
        .await
        .unwrap();
    assert_eq!(rejected.status, RequestStatus::Rejected);
    assert!(!fx
        .companies
        .list_members(&acme.id)
        .await
        .unwrap()
        .iter()
        .any(|m| m.user_id == bob.id));
}

#[tokio::test]
async fn test_invitation_accepted() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;

    let invitation = fx
        .invitations
        .create_invitation(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap();
    assert_eq!(invitation.joining_user_id(), bob.id);

    let accepted = fx
        .invitations
        .respond_to_invitation(&bob.id, &invitation.id, InvitationResponse::Accept)
        .await
        .unwrap();
    assert_eq!(accepted.status, InvitationStatus::Accepted);
    assert_eq!(fx.companies.list_for_user(&bob.id).await.unwrap().len(), 1);

    let err = fx
        .invitations
        .respond_to_invitation(&bob.id, &invitation.id, InvitationResponse::Decline)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    let events = fx.publisher.wait_for(2).await;
    assert!(events.iter().any(|(user, event)| user == &bob.id
        && matches!(event, StreamEvent::InvitationReceived { .. })));
    assert!(events.iter().any(|(user, event)| user == &alice.id
        && matches!(event, StreamEvent::InvitationResolved { status, .. } if status == "accepted")));
}

#[tokio::test]
async fn test_invitation_rules() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let carol = fx.user("carol").await;
    let acme = fx.company(&alice, "Acme").await;
    fx.join(&alice, &acme, &bob).await;

    // plain members cannot invite
    let err = fx
        .invitations
        .create_invitation(&bob.id, &acme.id, &carol.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = fx
        .invitations
        .create_invitation(&alice.id, &acme.id, "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = fx
        .invitations
        .create_invitation(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyMember(_)));

    // administrators can invite
    fx.companies
        .promote_admin(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap();
    let invitation = fx
        .invitations
        .create_invitation(&bob.id, &acme.id, &carol.id)
        .await
        .unwrap();

    let err = fx
        .invitations
        .create_invitation(&alice.id, &acme.id, &carol.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::DuplicatePending(_)));

    let err = fx
        .invitations
        .respond_to_invitation(&bob.id, &invitation.id, InvitationResponse::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let listed = fx
        .invitations
        .list_company_invitations(&alice.id, &acme.id)
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let err = fx
        .invitations
        .list_company_invitations(&carol.id, &acme.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_invitation_revoked_then_reissued() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;

    let invitation = fx
        .invitations
        .create_invitation(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap();

    let revoked = fx
        .invitations
        .revoke_invitation(&alice.id, &invitation.id)
        .await
        .unwrap();
    assert_eq!(revoked.status, InvitationStatus::Revoked);

    let err = fx
        .invitations
        .respond_to_invitation(&bob.id, &invitation.id, InvitationResponse::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));

    fx.invitations
        .create_invitation(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap();

    let received = fx.invitations.list_received_invitations(&bob.id).await.unwrap();
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_accepting_invitation_settles_pending_request() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;

    let request = fx.requests.create_request(&bob.id, &acme.id).await.unwrap();
    let invitation = fx
        .invitations
        .create_invitation(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap();

    fx.invitations
        .respond_to_invitation(&bob.id, &invitation.id, InvitationResponse::Accept)
        .await
        .unwrap();

    let sent = fx.requests.list_sent_requests(&bob.id).await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].status, RequestStatus::Approved);

    let err = fx
        .requests
        .approve_request(&alice.id, &request.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn test_approving_request_settles_pending_invitation() {
    let fx = Fixture::new().await;
    let alice = fx.user("alice").await;
    let bob = fx.user("bob").await;
    let acme = fx.company(&alice, "Acme").await;

    let invitation = fx
        .invitations
        .create_invitation(&alice.id, &acme.id, &bob.id)
        .await
        .unwrap();
    let request = fx.requests.create_request(&bob.id, &acme.id).await.unwrap();

    fx.requests
        .approve_request(&alice.id, &request.id)
        .await
        .unwrap();

    let received = fx.invitations.list_received_invitations(&bob.id).await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].id, invitation.id);
    assert_eq!(received[0].status, InvitationStatus::Accepted);

    let err = fx
        .invitations
        .respond_to_invitation(&bob.id, &invitation.id, InvitationResponse::Decline)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}
