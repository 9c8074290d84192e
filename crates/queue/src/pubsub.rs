//! Redis Pub/Sub for cross-instance event distribution.
//!
//! Every event is published twice: on the recipient's own channel and on
//! the global notifications channel, where delivery gateways pick it up.

#![allow(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use fred::clients::Client;
use fred::error::{Error as RedisError, ErrorKind as RedisErrorKind};
use fred::interfaces::PubsubInterface;
use quizzes_common::{AppError, AppResult};
use quizzes_core::services::{EventPublisher, StreamEvent};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pub/Sub channel names.
pub mod channels {
    /// Channel carrying every event.
    #[must_use]
    pub fn notifications(prefix: &str) -> String {
        format!("{prefix}:notifications")
    }

    /// Channel carrying one user's events.
    #[must_use]
    pub fn user(prefix: &str, user_id: &str) -> String {
        format!("{prefix}:user:{user_id}")
    }
}

/// Envelope sent over Redis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PubSubEvent {
    pub user_id: String,
    pub event: StreamEvent,
}

/// Publishes stream events over Redis Pub/Sub.
#[derive(Clone)]
pub struct RedisPubSub {
    publisher: Arc<Client>,
    prefix: String,
}

impl RedisPubSub {
    /// Publish through an already connected client.
    #[must_use]
    pub fn new(publisher: Arc<Client>, prefix: impl Into<String>) -> Self {
        Self {
            publisher,
            prefix: prefix.into(),
        }
    }

    /// Publish an event for a user.
    pub async fn publish_event(&self, user_id: &str, event: &StreamEvent) -> Result<(), RedisError> {
        let envelope = PubSubEvent {
            user_id: user_id.to_string(),
            event: event.clone(),
        };
        let payload = serde_json::to_string(&envelope).map_err(|e| {
            RedisError::new(
                RedisErrorKind::InvalidArgument,
                format!("Serialization error: {e}"),
            )
        })?;

        let _: () = self
            .publisher
            .publish(channels::user(&self.prefix, user_id), payload.clone())
            .await?;
        let _: () = self
            .publisher
            .publish(channels::notifications(&self.prefix), payload)
            .await?;

        debug!(user_id, ?event, "Published Pub/Sub event");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for RedisPubSub {
    async fn publish(&self, user_id: &str, event: &StreamEvent) -> AppResult<()> {
        self.publish_event(user_id, event)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_names() {
        assert_eq!(channels::notifications("quizzes"), "quizzes:notifications");
        assert_eq!(channels::user("quizzes", "u1"), "quizzes:user:u1");
    }

    #[test]
    fn test_envelope_serialization() {
        let envelope = PubSubEvent {
            user_id: "u1".to_string(),
            event: StreamEvent::RequestResolved {
                request_id: "r1".to_string(),
                company_id: "acme".to_string(),
                status: "approved".to_string(),
            },
        };

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"userId\":\"u1\""));
        assert!(json.contains("\"type\":\"requestResolved\""));

        let parsed: PubSubEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, envelope);
    }
}
