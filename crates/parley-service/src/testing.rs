//! Shared fixture for service tests: a migrated in-memory database, a wired
//! hub, and a token validator that accepts a user id as its token.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;

use parley_core::config::realtime::RealtimeConfig;
use parley_core::error::AppError;
use parley_core::model::{Chat, Identity, Relation, RelationStatus, User};
use parley_core::result::AppResult;
use parley_core::traits::TokenValidator;
use parley_core::types::{SessionId, UserId};
use parley_database::{Database, commit};
use parley_database::repositories::{ChatRepository, MessageRepository, UserRepository};
use parley_realtime::connection::{ConnectionHandle, ConnectionSink, Handshake};
use parley_realtime::message::ServerEvent;
use parley_realtime::{Gateway, RealtimeHub};

use crate::chat::ChatService;
use crate::context::RequestContext;
use crate::user::{FriendTarget, UserService};

pub(crate) fn ctx(user_id: UserId) -> RequestContext {
    RequestContext::new(user_id, SessionId::new(), user_id.to_string())
}

struct IdTokens {
    users: Arc<UserRepository>,
}

#[async_trait]
impl TokenValidator for IdTokens {
    async fn validate_token(&self, token: &str, include_profile: bool) -> AppResult<Identity> {
        let id: UserId = token
            .parse()
            .map_err(|_| AppError::authentication("Invalid token"))?;
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found."))?;
        Ok(Identity {
            id: user.id,
            username: user.username,
            session_id: SessionId::new(),
            relations: include_profile.then_some(user.relations),
        })
    }
}

pub(crate) struct Fixture {
    pub db: Database,
    pub hub: RealtimeHub,
    pub gateway: Gateway,
    pub users: Arc<UserService>,
    pub chats: Arc<ChatService>,
    pub chat_repo: Arc<ChatRepository>,
    user_repo: Arc<UserRepository>,
}

pub(crate) async fn fixture() -> Fixture {
    let db = Database::in_memory().await.unwrap();
    let hub = RealtimeHub::new(RealtimeConfig::default());
    let user_repo = Arc::new(UserRepository::new(db.clone()));
    let chat_repo = Arc::new(ChatRepository::new(db.clone()));
    let users = Arc::new(UserService::new(
        db.clone(),
        user_repo.clone(),
        chat_repo.clone(),
        hub.fanout.clone(),
    ));
    let chats = Arc::new(ChatService::new(
        db.clone(),
        chat_repo.clone(),
        Arc::new(MessageRepository::new(db.clone())),
        user_repo.clone(),
        hub.fanout.clone(),
    ));
    let tokens = Arc::new(IdTokens { users: user_repo.clone() });
    let gateway = hub.gateway(tokens, users.clone(), chats.clone());
    Fixture {
        db,
        hub,
        gateway,
        users,
        chats,
        chat_repo,
        user_repo,
    }
}

impl Fixture {
    pub(crate) async fn user(&self, username: &str) -> UserId {
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            password_hash: String::new(),
            relations: Vec::new(),
            created_at: Utc::now(),
        };
        self.user_repo.create(user).await.unwrap().id
    }

    /// Open a socket for `user_id` and swallow its `Ready`.
    pub(crate) async fn listen(&self, user_id: UserId) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let handshake = Handshake {
            auth_token: Some(user_id.to_string()),
            authorization: None,
        };
        let (sink, mut rx) = ConnectionSink::channel(64);
        let handle = self.gateway.connect(&handshake, sink).await.unwrap();
        let ready = drain(&mut rx);
        assert!(ready[0].is_ready());
        (handle, rx)
    }

    pub(crate) async fn make_friends(&self, a: UserId, b: UserId) -> Chat {
        self.users.add_friend(&ctx(a), FriendTarget::Id(b)).await.unwrap();
        self.users
            .add_friend(&ctx(b), FriendTarget::Id(a))
            .await
            .unwrap()
            .chat
            .unwrap()
    }

    pub(crate) async fn chat_between(&self, a: UserId, b: UserId) -> Chat {
        let chat = Chat::direct(a, b);
        self.chat_repo.create(&chat).await.unwrap();
        chat
    }

    /// Write one side of a relation directly.
    pub(crate) async fn set_relation(&self, owner: UserId, other: UserId, status: RelationStatus) {
        let mut tx = self.db.begin().await.unwrap();
        self.user_repo
            .set_relation_in_tx(&mut tx, owner, other, status)
            .await
            .unwrap();
        commit(tx).await.unwrap();
    }

    pub(crate) async fn relation(&self, owner: UserId, other: UserId) -> Option<RelationStatus> {
        self.relations(owner)
            .await
            .into_iter()
            .find(|r| r.id == other)
            .map(|r| r.status)
    }

    pub(crate) async fn relations(&self, owner: UserId) -> Vec<Relation> {
        self.user_repo
            .find_by_id(owner)
            .await
            .unwrap()
            .map(|u| u.relations)
            .unwrap_or_default()
    }
}

pub(crate) fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        events.push(ServerEvent::from_frame(&frame).unwrap());
    }
    events
}
