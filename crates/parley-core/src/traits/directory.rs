//! User and chat collaborator contracts.

use async_trait::async_trait;

use super::presence::PresenceLookup;
use crate::model::{Chat, Message, RelatedUser, Relation};
use crate::result::AppResult;
use crate::types::{MessageId, UserId};

/// Relationship-aware user lookups.
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Look up `ids` and decorate each with presence and the relationship
    /// found in `relations`. Presence is only shown for friends.
    async fn find_related_users_with_status(
        &self,
        ids: &[UserId],
        presence: &dyn PresenceLookup,
        relations: &[Relation],
    ) -> AppResult<Vec<RelatedUser>>;

    /// Current friends of `user_id`.
    async fn get_friend_ids(&self, user_id: UserId) -> AppResult<Vec<UserId>>;
}

/// Chat and message lookups.
#[async_trait]
pub trait ChatDirectory: Send + Sync + 'static {
    async fn get_chats_of_user(&self, user_id: UserId) -> AppResult<Vec<Chat>>;

    async fn get_messages_by_id(&self, ids: &[MessageId]) -> AppResult<Vec<Message>>;
}
