//! Implementations for the service the app needs.
//!

use crate::core::catalog::Catalog;
use crate::core::router;
use crate::core::session::{ChatMessage, ChatSessionStore, QUICK_REPLIES, QuickReply, SessionLocks};
use crate::core::traits::{ChatService, ContactService, TextGenerator};
use crate::infrastructure::entities;
use crate::infrastructure::traits::{ContactRepository, KeyValueStore};
use async_trait::async_trait;
use di::{Ref, injectable};
use log::{error, info};
use uuid::Uuid;

#[injectable(ChatService)]
pub struct MyChatService {
    storage: Ref<dyn KeyValueStore>,
    locks: Ref<SessionLocks>,
    catalog: Ref<Catalog>,
    generator: Ref<dyn TextGenerator>,
}

impl MyChatService {
    pub fn new(
        storage: Ref<dyn KeyValueStore>,
        locks: Ref<SessionLocks>,
        catalog: Ref<Catalog>,
        generator: Ref<dyn TextGenerator>,
    ) -> Self {
        Self {
            storage,
            locks,
            catalog,
            generator,
        }
    }

    fn session(&self, session_id: Uuid) -> ChatSessionStore {
        ChatSessionStore::new(self.storage.clone(), &self.locks, session_id)
    }
}

#[async_trait]
impl ChatService for MyChatService {
    async fn history(&self, session_id: Uuid) -> Vec<ChatMessage> {
        self.session(session_id).load().await
    }

    async fn post_user_message(
        &self,
        session_id: Uuid,
        text: String,
    ) -> Result<ChatMessage, ()> {
        let session = self.session(session_id);
        let message = ChatMessage::user(text);

        session.append(message.clone()).await?;
        if session.hide_quick_replies().await.is_err() {
            error!("failed to hide quick replies for session {session_id}");
        }

        Ok(message)
    }

    async fn reply(&self, session_id: Uuid, text: &str) -> ChatMessage {
        let reply = router::route(text, &self.catalog, &*self.generator).await;
        let message = ChatMessage::bot(reply);

        if self.session(session_id).append(message.clone()).await.is_err() {
            error!("failed to store bot reply for session {session_id}");
        }

        message
    }

    async fn reset(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, ()> {
        info!("resetting chat session {session_id}");
        self.session(session_id).reset().await
    }

    async fn quick_replies(&self, session_id: Uuid) -> Vec<QuickReply> {
        if self.session(session_id).quick_replies_visible().await {
            QUICK_REPLIES.to_vec()
        } else {
            Vec::new()
        }
    }
}

#[injectable(ContactService)]
pub struct MyContactService {
    repo: Ref<dyn ContactRepository>,
}

#[async_trait]
impl ContactService for MyContactService {
    async fn submit(
        &self,
        submission: entities::NewContactMessage,
    ) -> Result<entities::ContactMessage, ()> {
        let stored = self.repo.create_contact_message(submission).await?;
        info!("stored contact message {} from {}", stored.id, stored.email);
        Ok(stored)
    }
}
