//! Event publisher service.
//!
//! Provides an abstraction for publishing real-time events.
//! The actual implementation is provided by the queue crate (Redis Pub/Sub).

use async_trait::async_trait;
use quizzes_common::AppResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Event types for real-time updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "camelCase")]
pub enum StreamEvent {
    /// A company invited the user.
    #[serde(rename_all = "camelCase")]
    InvitationReceived {
        invitation_id: String,
        company_id: String,
    },
    /// An invitation the user sent or received left the pending state.
    #[serde(rename_all = "camelCase")]
    InvitationResolved {
        invitation_id: String,
        company_id: String,
        status: String,
    },
    /// Someone asked to join a company the user owns.
    #[serde(rename_all = "camelCase")]
    RequestReceived {
        request_id: String,
        company_id: String,
        sender_id: String,
    },
    /// A request the user sent left the pending state.
    #[serde(rename_all = "camelCase")]
    RequestResolved {
        request_id: String,
        company_id: String,
        status: String,
    },
    /// The user was removed from a company.
    #[serde(rename_all = "camelCase")]
    MemberRemoved { company_id: String },
    /// A submission of the user was graded.
    #[serde(rename_all = "camelCase")]
    QuizCompleted {
        result_id: String,
        quiz_id: String,
        company_id: String,
        correct_questions: i32,
        total_questions: i32,
    },
    /// A new notification was stored for the user.
    #[serde(rename_all = "camelCase")]
    Notification {
        id: String,
        notification_type: String,
        text: String,
    },
}

/// Trait for publishing real-time events.
///
/// This allows the core services to publish events
/// without directly depending on the queue/pubsub implementation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Deliver `event` to the channel of `user_id`.
    async fn publish(&self, user_id: &str, event: &StreamEvent) -> AppResult<()>;
}

/// A no-op implementation of `EventPublisher` for when real-time events are disabled.
#[derive(Clone, Default)]
pub struct NoOpEventPublisher;

#[async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _user_id: &str, _event: &StreamEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Wrapper for boxed `EventPublisher` trait object.
pub type EventPublisherService = Arc<dyn EventPublisher>;

/// Fire-and-forget front end for an [`EventPublisher`].
///
/// Delivery runs on a spawned task; a failed or slow publisher never holds
/// up or fails the operation that produced the event.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    publisher: Option<EventPublisherService>,
}

impl EventDispatcher {
    /// Dispatcher that drops every event.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { publisher: None }
    }

    /// Dispatcher delivering through `publisher`.
    #[must_use]
    pub fn new(publisher: EventPublisherService) -> Self {
        Self {
            publisher: Some(publisher),
        }
    }

    /// Queue `event` for `user_id`.
    pub fn dispatch(&self, user_id: impl Into<String>, event: StreamEvent) {
        let Some(publisher) = self.publisher.clone() else {
            return;
        };
        let user_id = user_id.into();

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(user_id = %user_id, "No runtime available, dropping event");
            return;
        };

        handle.spawn(async move {
            if let Err(e) = publisher.publish(&user_id, &event).await {
                warn!(error = %e, user_id = %user_id, "Failed to publish event");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = StreamEvent::MemberRemoved {
            company_id: "acme".to_string(),
        };

        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["type"], "memberRemoved");
        assert_eq!(json["body"]["companyId"], "acme");
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_is_silent() {
        EventDispatcher::disabled().dispatch(
            "u1",
            StreamEvent::MemberRemoved {
                company_id: "acme".to_string(),
            },
        );
    }
}
