//! Relationship lookups and friend operations.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{error, info};

use parley_core::error::AppError;
use parley_core::model::{Chat, RelatedUser, Relation, RelationStatus, User};
use parley_core::result::AppResult;
use parley_core::traits::{PresenceLookup, UserDirectory};
use parley_core::types::UserId;
use parley_database::repositories::{ChatRepository, UserRepository};
use parley_database::{Database, Tx, commit};
use parley_realtime::EventFanout;

use super::relations::{AddFriendPlan, plan_add_friend, plan_remove_friend};
use crate::context::RequestContext;

/// Outcome of a friend operation, echoed to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct FriendResult {
    /// The other user.
    pub user_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// The direct chat, when the operation produced a friendship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<Chat>,
    pub message: String,
}

/// How the receiver of a friend request is named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FriendTarget {
    Id(UserId),
    /// Matched ignoring ASCII case.
    Username(String),
}

/// Committed add-friend change, carried out of the transaction for emission.
enum Added {
    Accepted { chat: Chat },
    Requested { sender_name: String },
}

/// Handles relationship reads and friend requests.
#[derive(Debug, Clone)]
pub struct UserService {
    /// Store handle for multi-row writes.
    db: Database,
    user_repo: Arc<UserRepository>,
    chat_repo: Arc<ChatRepository>,
    /// Real-time emission.
    fanout: Arc<EventFanout>,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        db: Database,
        user_repo: Arc<UserRepository>,
        chat_repo: Arc<ChatRepository>,
        fanout: Arc<EventFanout>,
    ) -> Self {
        Self {
            db,
            user_repo,
            chat_repo,
            fanout,
        }
    }

    /// Send or accept a friend request from the current user to `target`.
    ///
    /// Both relation rows and, on accept, the direct chat are committed
    /// together before anything is emitted.
    pub async fn add_friend(&self, ctx: &RequestContext, target: FriendTarget) -> AppResult<FriendResult> {
        let sender_id = ctx.user_id;
        let mut tx = self.db.begin().await?;

        let receiver = match &target {
            FriendTarget::Id(id) => self.user_repo.find_by_id_in_tx(&mut tx, *id).await?,
            FriendTarget::Username(name) => self.user_repo.find_by_username_in_tx(&mut tx, name).await?,
        }
        .ok_or_else(|| AppError::not_found("User not found."))?;
        let receiver_id = receiver.id;
        if receiver_id == sender_id {
            return Err(AppError::conflict("You can't add yourself as a friend."));
        }

        let plan = plan_add_friend(receiver.relation_to(sender_id))?;
        let sender = self.load_user(&mut tx, sender_id).await?;

        let added = match plan {
            AddFriendPlan::Accept => {
                self.set_pair(&mut tx, (sender_id, RelationStatus::Friend), (receiver_id, RelationStatus::Friend))
                    .await?;
                let chat = match self
                    .chat_repo
                    .find_direct_between_in_tx(&mut tx, sender_id, receiver_id)
                    .await?
                {
                    Some(chat) => chat,
                    None => {
                        let chat = Chat::direct(sender_id, receiver_id);
                        self.chat_repo.create_in_tx(&mut tx, &chat).await?;
                        chat
                    }
                };
                Added::Accepted { chat }
            }
            AddFriendPlan::Request => {
                self.set_pair(
                    &mut tx,
                    (sender_id, RelationStatus::Outgoing),
                    (receiver_id, RelationStatus::Incoming),
                )
                .await?;
                Added::Requested { sender_name: sender.username }
            }
        };
        commit(tx).await?;

        let receiver_name = receiver.username;
        match added {
            Added::Accepted { chat } => {
                info!(user_id = %sender_id, friend_id = %receiver_id, chat_id = %chat.id, "Friend request accepted");
                self.after_commit(
                    self.fanout.emit_friend_added(sender_id, receiver_id, &chat),
                    "friend_added",
                );
                Ok(FriendResult {
                    user_id: receiver_id,
                    username: Some(receiver_name),
                    chat: Some(chat),
                    message: AddFriendPlan::Accept.message().to_string(),
                })
            }
            Added::Requested { sender_name } => {
                info!(user_id = %sender_id, receiver_id = %receiver_id, "Friend request sent");
                self.after_commit(
                    self.fanout.emit_friend_request(
                        (sender_id, &sender_name),
                        (receiver_id, &receiver_name),
                    ),
                    "friend_request",
                );
                Ok(FriendResult {
                    user_id: receiver_id,
                    username: Some(receiver_name),
                    chat: None,
                    message: AddFriendPlan::Request.message().to_string(),
                })
            }
        }
    }

    /// Remove a friend, cancel an outgoing request, or decline an incoming one.
    pub async fn remove_friend(&self, ctx: &RequestContext, receiver_id: UserId) -> AppResult<FriendResult> {
        let sender_id = ctx.user_id;
        let mut tx = self.db.begin().await?;

        let prior = self.user_repo.relation_in_tx(&mut tx, sender_id, receiver_id).await?;
        let plan = plan_remove_friend(prior)?;
        self.user_repo.remove_relation_in_tx(&mut tx, sender_id, receiver_id).await?;
        self.user_repo.remove_relation_in_tx(&mut tx, receiver_id, sender_id).await?;
        let chat_id = self
            .chat_repo
            .find_direct_between_in_tx(&mut tx, sender_id, receiver_id)
            .await?
            .map(|c| c.id);
        commit(tx).await?;

        info!(user_id = %sender_id, other_id = %receiver_id, prior = ?plan.prior, "Relation removed");
        self.after_commit(
            self.fanout
                .emit_friend_removed(sender_id, receiver_id, plan.prior, plan.message, chat_id),
            "friend_removed",
        );

        Ok(FriendResult {
            user_id: receiver_id,
            username: None,
            chat: None,
            message: plan.message.to_string(),
        })
    }

    /// The profile of an existing user.
    pub async fn get_user(&self, user_id: UserId) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))
    }

    async fn load_user(&self, tx: &mut Tx<'_>, id: UserId) -> AppResult<User> {
        self.user_repo
            .find_by_id_in_tx(tx, id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))
    }

    /// Write the state each side holds toward the other.
    async fn set_pair(
        &self,
        tx: &mut Tx<'_>,
        (a, a_status): (UserId, RelationStatus),
        (b, b_status): (UserId, RelationStatus),
    ) -> AppResult<()> {
        self.user_repo.set_relation_in_tx(tx, a, b, a_status).await?;
        self.user_repo.set_relation_in_tx(tx, b, a, b_status).await
    }

    /// The write is already committed; a failed emission is only logged.
    fn after_commit<T>(&self, emitted: AppResult<T>, what: &str) {
        if let Err(e) = emitted {
            error!(event = what, error = %e, "Emission after commit failed");
        }
    }
}

#[async_trait]
impl UserDirectory for UserService {
    async fn find_related_users_with_status(
        &self,
        ids: &[UserId],
        presence: &dyn PresenceLookup,
        relations: &[Relation],
    ) -> AppResult<Vec<RelatedUser>> {
        let users = self.user_repo.find_many(ids).await?;
        Ok(users
            .into_iter()
            .map(|user| {
                let relationship = relations.iter().find(|r| r.id == user.id).map(|r| r.status);
                RelatedUser {
                    id: user.id,
                    online: presence.online_status(user.id).gated(relationship),
                    username: user.username,
                    relationship,
                }
            })
            .collect())
    }

    async fn get_friend_ids(&self, user_id: UserId) -> AppResult<Vec<UserId>> {
        Ok(self.get_user(user_id).await?.friend_ids())
    }
}
