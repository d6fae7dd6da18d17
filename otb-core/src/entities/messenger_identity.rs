//! External messaging identity mapping.
//!
//! Maps a user to the chat id under which the messenger provider knows
//! them. Established outside this engine (the bot's own onboarding);
//! cleared here when the provider reports the identity as revoked.

use sqlx::PgPool;

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MessengerIdentity {
    pub user_id: UserId,
    pub chat_id: String,
    pub subscribed: bool,
}

impl MessengerIdentity {
    /// Chat id for the user, or `None` when no identity is established.
    pub async fn chat_id_of(pool: &PgPool, user_id: UserId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT chat_id FROM messenger_identities WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Remove the mapping after a permanent delivery failure, so future
    /// dispatches stop retrying a dead identity.
    pub async fn clear(pool: &PgPool, user_id: UserId) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM messenger_identities WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Users opted into broadcast announcements (premiere audience).
    pub async fn subscriber_ids(pool: &PgPool) -> Result<Vec<UserId>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM messenger_identities WHERE subscribed",
        )
        .fetch_all(pool)
        .await
    }
}
