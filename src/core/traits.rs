//! DI "Interfaces"

use crate::core::assistant::AssistantError;
use crate::core::session::{ChatMessage, QuickReply};
use crate::infrastructure::entities;
use async_trait::async_trait;
use uuid::Uuid;

/// Source of free-form text for questions the keyword rules don't cover.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AssistantError>;
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Loads the transcript of a chat session, seeding it on first use.
    async fn history(&self, session_id: Uuid) -> Vec<ChatMessage>;

    /// Appends the user's message to the transcript and hides the quick replies.
    ///
    /// Returns `Err` if the transcript could not be written.
    async fn post_user_message(
        &self,
        session_id: Uuid,
        text: String,
    ) -> Result<ChatMessage, ()>;

    /// Answers `text` and appends the answer to the transcript.
    ///
    /// Always produces a reply. A failure to persist it is logged, not returned.
    async fn reply(&self, session_id: Uuid, text: &str) -> ChatMessage;

    /// Replaces the transcript with the reset greeting.
    async fn reset(&self, session_id: Uuid) -> Result<Vec<ChatMessage>, ()>;

    /// Quick replies to offer, empty once the conversation has moved on.
    async fn quick_replies(&self, session_id: Uuid) -> Vec<QuickReply>;

    /// Runs a whole chat turn without streaming.
    async fn send_message(
        &self,
        session_id: Uuid,
        text: String,
    ) -> Result<(ChatMessage, ChatMessage), ()> {
        let user_message = self.post_user_message(session_id, text).await?;
        let bot_message = self.reply(session_id, &user_message.text).await;
        Ok((user_message, bot_message))
    }
}

#[async_trait]
pub trait ContactService: Send + Sync {
    /// Stores a contact form submission.
    ///
    /// Returns `Err` if the database rejected it.
    async fn submit(
        &self,
        submission: entities::NewContactMessage,
    ) -> Result<entities::ContactMessage, ()>;
}
