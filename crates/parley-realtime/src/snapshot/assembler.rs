//! Builds the "Ready" snapshot for a freshly authenticated connection.

use std::sync::Arc;

use tracing::debug;

use parley_core::model::{Chat, Identity, RelationStatus};
use parley_core::result::AppResult;
use parley_core::traits::{ChatDirectory, PresenceLookup, UserDirectory};
use parley_core::types::{MessageId, UserId};

use super::Snapshot;

/// Gathers chats, related users and last messages for one identity.
#[derive(Clone)]
pub struct SnapshotAssembler {
    users: Arc<dyn UserDirectory>,
    chats: Arc<dyn ChatDirectory>,
}

impl std::fmt::Debug for SnapshotAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotAssembler").finish()
    }
}

impl SnapshotAssembler {
    pub fn new(users: Arc<dyn UserDirectory>, chats: Arc<dyn ChatDirectory>) -> Self {
        Self { users, chats }
    }

    pub async fn build_snapshot(
        &self,
        identity: &Identity,
        presence: &dyn PresenceLookup,
    ) -> AppResult<Snapshot> {
        let chats = self.chats.get_chats_of_user(identity.id).await?;

        let related_ids = related_user_ids(identity, &chats);
        let last_message_ids: Vec<MessageId> =
            chats.iter().filter_map(|c| c.last_message_id).collect();

        if related_ids.is_empty() {
            debug!(user_id = %identity.id, "No related users, skipping lookups");
            return Ok(Snapshot {
                id: identity.id,
                username: identity.username.clone(),
                related_users: Vec::new(),
                chats,
                last_messages: Vec::new(),
                session_id: identity.session_id,
            });
        }

        let mut related_users = self
            .users
            .find_related_users_with_status(&related_ids, presence, identity.relations())
            .await?;
        for user in &mut related_users {
            user.online = user.online.gated(user.relationship);
        }

        let last_messages = if last_message_ids.is_empty() {
            Vec::new()
        } else {
            self.chats.get_messages_by_id(&last_message_ids).await?
        };

        debug!(
            user_id = %identity.id,
            related = related_users.len(),
            chats = chats.len(),
            "Snapshot assembled"
        );

        Ok(Snapshot {
            id: identity.id,
            username: identity.username.clone(),
            related_users,
            chats,
            last_messages,
            session_id: identity.session_id,
        })
    }
}

/// Relation ids plus every other chat participant, own id excluded, first-seen order.
fn related_user_ids(identity: &Identity, chats: &[Chat]) -> Vec<UserId> {
    let mut ids: Vec<UserId> = Vec::new();
    let relation_ids = identity.relations().iter().map(|r| r.id);
    let chat_ids = chats.iter().flat_map(|c| c.other_recipients(identity.id));
    for id in relation_ids.chain(chat_ids) {
        if id != identity.id && !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// Direct chats whose other participant is a friend. Their rooms are joined at connect.
pub fn friend_chats<'a>(identity: &'a Identity, chats: &'a [Chat]) -> impl Iterator<Item = &'a Chat> {
    chats.iter().filter(move |chat| {
        chat.is_direct()
            && chat
                .other_recipients(identity.id)
                .any(|id| identity.relation_to(id) == Some(RelationStatus::Friend))
    })
}
