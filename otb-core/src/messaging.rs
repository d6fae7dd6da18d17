//! Async messaging channel.
//!
//! Delivers lifecycle notifications through an external bot/messaging
//! provider, independent of whether the user is connected to the live
//! push stream. A user is reachable only if an identity mapping exists;
//! a permanently failed identity (blocked/revoked on the provider side)
//! is cleared so later dispatches stop retrying it.

use async_trait::async_trait;
use reqwest::StatusCode;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::entities::messenger_identity::MessengerIdentity;
use crate::entities::UserId;

/// Why a provider send failed.
#[derive(Debug, Error)]
pub enum SendFailure {
    /// The identity is dead: the provider will never accept messages
    /// for this chat again.
    #[error("recipient unreachable permanently: {0}")]
    Permanent(String),

    /// Anything else — network trouble, provider hiccup, rate limit.
    #[error("transient delivery failure: {0}")]
    Transient(String),
}

/// Provider seam for the messaging channel.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SendFailure>;
}

/// HTTP bot-API provider.
pub struct BotMessenger {
    http_client: reqwest::Client,
    api_base: String,
    token: String,
}

impl BotMessenger {
    pub fn new(api_base: String, token: String) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_base,
            token,
        }
    }
}

#[async_trait]
impl Messenger for BotMessenger {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<(), SendFailure> {
        let response = self
            .http_client
            .post(format!("{}/sendMessage", self.api_base))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| SendFailure::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(failure_for_status(status, body))
    }
}

/// Classify a provider error status.
///
/// 403 means the recipient blocked the bot or revoked the chat — dead
/// forever. Everything else is assumed recoverable.
fn failure_for_status(status: StatusCode, body: String) -> SendFailure {
    if status == StatusCode::FORBIDDEN {
        SendFailure::Permanent(format!("provider returned {status}: {body}"))
    } else {
        SendFailure::Transient(format!("provider returned {status}: {body}"))
    }
}

/// Outcome of a delivery attempt through the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagingOutcome {
    /// The provider accepted the message.
    Delivered,
    /// The user has no identity mapping; nothing was attempted.
    NoIdentity,
    /// The attempt failed (logged; permanent failures also cleared the
    /// mapping).
    Failed,
}

/// The async messaging channel: identity lookup plus provider delivery.
#[derive(Clone)]
pub struct MessagingChannel {
    pool: PgPool,
    messenger: Arc<dyn Messenger>,
}

impl MessagingChannel {
    pub fn new(pool: PgPool, messenger: Arc<dyn Messenger>) -> Self {
        Self { pool, messenger }
    }

    /// Attempt delivery to one user.
    ///
    /// Returns `Ok` for every attempt outcome; `Err` is reserved for
    /// database failures around the identity mapping.
    pub async fn deliver(&self, user_id: UserId, text: &str) -> Result<MessagingOutcome, sqlx::Error> {
        let Some(chat_id) = MessengerIdentity::chat_id_of(&self.pool, user_id).await? else {
            return Ok(MessagingOutcome::NoIdentity);
        };

        match self.messenger.send_text(&chat_id, text).await {
            Ok(()) => Ok(MessagingOutcome::Delivered),
            Err(SendFailure::Permanent(reason)) => {
                warn!(user_id, %reason, "clearing dead messenger identity");
                MessengerIdentity::clear(&self.pool, user_id).await?;
                Ok(MessagingOutcome::Failed)
            }
            Err(SendFailure::Transient(reason)) => {
                warn!(user_id, %reason, "messenger delivery failed");
                Ok(MessagingOutcome::Failed)
            }
        }
    }

    /// Users opted into broadcast announcements.
    pub async fn subscriber_ids(&self) -> Result<Vec<UserId>, sqlx::Error> {
        MessengerIdentity::subscriber_ids(&self.pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_permanent() {
        let failure = failure_for_status(StatusCode::FORBIDDEN, "bot was blocked".into());
        assert!(matches!(failure, SendFailure::Permanent(_)));
    }

    #[test]
    fn test_server_errors_are_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::NOT_FOUND,
        ] {
            let failure = failure_for_status(status, String::new());
            assert!(matches!(failure, SendFailure::Transient(_)), "{status}");
        }
    }
}
