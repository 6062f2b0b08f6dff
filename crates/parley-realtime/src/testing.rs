//! In-memory collaborators and wiring helpers shared by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use parley_core::config::realtime::RealtimeConfig;
use parley_core::error::AppError;
use parley_core::model::{Chat, Identity, Message, RelatedUser, Relation, RelationStatus};
use parley_core::result::AppResult;
use parley_core::traits::{ChatDirectory, PresenceLookup, TokenValidator, UserDirectory};
use parley_core::types::{MessageId, SessionId, UserId};

use crate::connection::authenticator::Handshake;
use crate::connection::handle::{ConnectionHandle, ConnectionSink};
use crate::gateway::Gateway;
use crate::message::types::ServerEvent;
use crate::server::RealtimeHub;

pub(crate) fn identity_with(username: &str, relations: Vec<Relation>) -> Identity {
    Identity {
        id: UserId::new(),
        username: username.to_string(),
        session_id: SessionId::new(),
        relations: Some(relations),
    }
}

/// Parks one friend-list lookup until the test lets it go.
#[derive(Default)]
pub(crate) struct LookupGate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub(crate) struct FakeUsers {
    users: Mutex<HashMap<UserId, (String, Vec<Relation>)>>,
    related_calls: AtomicUsize,
    gate: Mutex<Option<Arc<LookupGate>>>,
}

impl FakeUsers {
    pub(crate) fn add(&self, username: &str, relations: Vec<Relation>) -> UserId {
        let id = UserId::new();
        self.insert(id, username, relations);
        id
    }

    pub(crate) fn insert(&self, id: UserId, username: &str, relations: Vec<Relation>) {
        self.users
            .lock()
            .unwrap()
            .insert(id, (username.to_string(), relations));
    }

    /// Mirror a friendship on both sides.
    pub(crate) fn befriend(&self, a: UserId, b: UserId) {
        let mut users = self.users.lock().unwrap();
        for (owner, other) in [(a, b), (b, a)] {
            if let Some((_, relations)) = users.get_mut(&owner) {
                relations.retain(|r| r.id != other);
                relations.push(Relation { id: other, status: RelationStatus::Friend });
            }
        }
    }

    /// Drop the friendship on both sides.
    pub(crate) fn unfriend(&self, a: UserId, b: UserId) {
        let mut users = self.users.lock().unwrap();
        for (owner, other) in [(a, b), (b, a)] {
            if let Some((_, relations)) = users.get_mut(&owner) {
                relations.retain(|r| r.id != other);
            }
        }
    }

    /// The next `get_friend_ids` call signals `entered` and waits for `release`.
    pub(crate) fn hold_next_friend_lookup(&self) -> Arc<LookupGate> {
        let gate = Arc::new(LookupGate::default());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub(crate) fn related_calls(&self) -> usize {
        self.related_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserDirectory for FakeUsers {
    async fn find_related_users_with_status(
        &self,
        ids: &[UserId],
        presence: &dyn PresenceLookup,
        relations: &[Relation],
    ) -> AppResult<Vec<RelatedUser>> {
        self.related_calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| {
                let (username, _) = users.get(id)?;
                let relationship = relations.iter().find(|r| r.id == *id).map(|r| r.status);
                Some(RelatedUser {
                    id: *id,
                    username: username.clone(),
                    online: presence.online_status(*id),
                    relationship,
                })
            })
            .collect())
    }

    async fn get_friend_ids(&self, user_id: UserId) -> AppResult<Vec<UserId>> {
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        let users = self.users.lock().unwrap();
        let (_, relations) = users
            .get(&user_id)
            .ok_or_else(|| AppError::not_found("User not found."))?;
        Ok(relations
            .iter()
            .filter(|r| r.status == RelationStatus::Friend)
            .map(|r| r.id)
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeChats {
    chats: Mutex<Vec<Chat>>,
    messages: Mutex<Vec<Message>>,
    chat_list_calls: AtomicUsize,
    message_calls: AtomicUsize,
}

impl FakeChats {
    pub(crate) fn add_chat(&self, chat: Chat) {
        self.chats.lock().unwrap().push(chat);
    }

    pub(crate) fn add_message(&self, message: Message) {
        self.messages.lock().unwrap().push(message);
    }

    pub(crate) fn chat_list_calls(&self) -> usize {
        self.chat_list_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn message_calls(&self) -> usize {
        self.message_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatDirectory for FakeChats {
    async fn get_chats_of_user(&self, user_id: UserId) -> AppResult<Vec<Chat>> {
        self.chat_list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .chats
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.has_recipient(user_id))
            .cloned()
            .collect())
    }

    async fn get_messages_by_id(&self, ids: &[MessageId]) -> AppResult<Vec<Message>> {
        self.message_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }
}

/// Token store keyed by the raw token string.
#[derive(Default)]
pub(crate) struct FakeTokens {
    identities: Mutex<HashMap<String, Identity>>,
    delay: Option<Duration>,
}

impl FakeTokens {
    pub(crate) fn slow(delay: Duration) -> Self {
        Self {
            identities: Mutex::default(),
            delay: Some(delay),
        }
    }

    pub(crate) fn issue(&self, identity: &Identity) -> String {
        let token = format!("token-{}", identity.session_id);
        self.identities
            .lock()
            .unwrap()
            .insert(token.clone(), identity.clone());
        token
    }

    pub(crate) fn revoke(&self, token: &str) {
        self.identities.lock().unwrap().remove(token);
    }
}

#[async_trait]
impl TokenValidator for FakeTokens {
    async fn validate_token(&self, token: &str, include_profile: bool) -> AppResult<Identity> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let mut identity = self
            .identities
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::not_found("Session not found."))?;
        if !include_profile {
            identity.relations = None;
        }
        Ok(identity)
    }
}

/// A fully wired hub backed by fakes.
pub(crate) struct Harness {
    pub hub: RealtimeHub,
    pub gateway: Gateway,
    pub users: Arc<FakeUsers>,
    pub chats: Arc<FakeChats>,
    pub tokens: Arc<FakeTokens>,
}

pub(crate) fn harness() -> Harness {
    harness_with(RealtimeConfig::default(), FakeTokens::default())
}

pub(crate) fn harness_with(config: RealtimeConfig, tokens: FakeTokens) -> Harness {
    let hub = RealtimeHub::new(config);
    let users = Arc::new(FakeUsers::default());
    let chats = Arc::new(FakeChats::default());
    let tokens = Arc::new(tokens);
    let gateway = hub.gateway(tokens.clone(), users.clone(), chats.clone());
    Harness {
        hub,
        gateway,
        users,
        chats,
        tokens,
    }
}

impl Harness {
    /// Register `identity` with the user fake so disconnect lookups find it.
    pub(crate) fn enroll(&self, identity: &Identity) {
        self.users
            .insert(identity.id, &identity.username, identity.relations().to_vec());
    }

    /// Open a connection for `identity` through the gateway.
    pub(crate) async fn connect(
        &self,
        identity: &Identity,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let token = self.tokens.issue(identity);
        let handshake = Handshake {
            auth_token: None,
            authorization: Some(format!("Bearer {token}")),
        };
        let (sink, rx) = ConnectionSink::channel(32);
        let handle = self.gateway.connect(&handshake, sink).await.unwrap();
        (handle, rx)
    }
}

/// Everything currently queued on a connection, decoded.
pub(crate) fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        events.push(ServerEvent::from_frame(&frame).unwrap());
    }
    events
}
