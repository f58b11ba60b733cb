//! Chat transcript persistence
//!
//! A transcript is stored as a JSON list of `{role, text, timestamp}` records under one key of a
//! [`KeyValueStore`]. Writes always replace the whole list.

use crate::infrastructure::traits::KeyValueStore;
use chrono::{DateTime, Utc};
use di::{Ref, inject, injectable};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use uuid::Uuid;

pub const HISTORY_KEY: &str = "duraChatHistory";

pub const GREETING: &str = "Halo! Saya DuraBot, asisten toko bangunan. Ada yang bisa saya bantu?";
pub const RESET_GREETING: &str = "Chat telah di-reset. Ada yang bisa dibantu lagi?";

/// Quick replies are only offered on a fresh transcript.
const QUICK_REPLY_MAX_MESSAGES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            created_at: Utc::now(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// On-disk shape of a transcript entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredChatMessage {
    role: Sender,
    text: String,
    #[serde(default)]
    timestamp: Option<String>,
}

impl From<&ChatMessage> for StoredChatMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.sender,
            text: message.text.clone(),
            timestamp: Some(message.created_at.to_rfc3339()),
        }
    }
}

impl From<StoredChatMessage> for ChatMessage {
    fn from(stored: StoredChatMessage) -> Self {
        let created_at = stored
            .timestamp
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Self {
            sender: stored.role,
            text: stored.text,
            created_at,
        }
    }
}

pub fn encode_transcript(messages: &[ChatMessage]) -> Result<String, serde_json::Error> {
    let stored: Vec<StoredChatMessage> = messages.iter().map(StoredChatMessage::from).collect();
    serde_json::to_string(&stored)
}

pub fn decode_transcript(raw: &str) -> Result<Vec<ChatMessage>, serde_json::Error> {
    let stored: Vec<StoredChatMessage> = serde_json::from_str(raw)?;
    Ok(stored.into_iter().map(ChatMessage::from).collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickReplyCategory {
    Price,
    Discount,
    Stock,
    Search,
    Recommendation,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuickReply {
    pub label: &'static str,
    pub category: QuickReplyCategory,
}

pub const QUICK_REPLIES: [QuickReply; 6] = [
    QuickReply {
        label: "Produk termurah",
        category: QuickReplyCategory::Price,
    },
    QuickReply {
        label: "Produk diskon",
        category: QuickReplyCategory::Discount,
    },
    QuickReply {
        label: "Stok habis",
        category: QuickReplyCategory::Stock,
    },
    QuickReply {
        label: "Cari Bata Hebel",
        category: QuickReplyCategory::Search,
    },
    QuickReply {
        label: "Rekomendasi",
        category: QuickReplyCategory::Recommendation,
    },
    QuickReply {
        label: "Kategori besi",
        category: QuickReplyCategory::Category,
    },
];

/// One mutex per chat session, shared by every request that touches that session.
///
/// Entries only live while some request holds the lock handle. Finished sessions are pruned
/// when a new one is tracked.
#[derive(Default)]
pub struct SessionLocks {
    locks: Mutex<HashMap<Uuid, Weak<tokio::sync::Mutex<()>>>>,
}

#[injectable]
impl SessionLocks {
    #[inject]
    pub fn create() -> SessionLocks {
        SessionLocks::default()
    }
}

impl SessionLocks {
    pub fn for_session(&self, session_id: Uuid) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(lock) = locks.get(&session_id).and_then(Weak::upgrade) {
            return lock;
        }

        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(tokio::sync::Mutex::new(()));
        locks.insert(session_id, Arc::downgrade(&lock));
        lock
    }

    /// Number of sessions with a live lock handle.
    pub fn tracked(&self) -> usize {
        let locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.values().filter(|lock| lock.strong_count() > 0).count()
    }
}

/// Transcript of a single chat session.
pub struct ChatSessionStore {
    storage: Ref<dyn KeyValueStore>,
    lock: Arc<tokio::sync::Mutex<()>>,
    history_key: String,
    quick_replies_key: String,
}

impl ChatSessionStore {
    pub fn new(storage: Ref<dyn KeyValueStore>, locks: &SessionLocks, session_id: Uuid) -> Self {
        Self {
            storage,
            lock: locks.for_session(session_id),
            history_key: format!("{HISTORY_KEY}:{session_id}"),
            quick_replies_key: format!("{HISTORY_KEY}:{session_id}:quickReplies"),
        }
    }

    /// Loads the transcript, seeding it with the greeting when nothing usable is stored.
    ///
    /// If the storage cannot be read, the greeting is returned without being written back.
    pub async fn load(&self) -> Vec<ChatMessage> {
        let _guard = self.lock.lock().await;
        self.read()
            .await
            .unwrap_or_else(|_| vec![ChatMessage::bot(GREETING)])
    }

    /// Appends a message and writes the whole transcript back.
    pub async fn append(&self, message: ChatMessage) -> Result<Vec<ChatMessage>, ()> {
        let _guard = self.lock.lock().await;
        let mut messages = self.read().await?;
        messages.push(message);
        self.save(&messages).await?;
        Ok(messages)
    }

    /// Replaces the transcript with the reset greeting and re-enables quick replies.
    pub async fn reset(&self) -> Result<Vec<ChatMessage>, ()> {
        let _guard = self.lock.lock().await;
        let messages = vec![ChatMessage::bot(RESET_GREETING)];
        self.save(&messages).await?;
        self.storage
            .set(&self.quick_replies_key, true.to_string())
            .await?;
        Ok(messages)
    }

    pub async fn quick_replies_visible(&self) -> bool {
        let _guard = self.lock.lock().await;
        let enabled = match self.storage.get(&self.quick_replies_key).await {
            Ok(Some(flag)) => flag != "false",
            Ok(None) => true,
            Err(()) => {
                warn!("quick reply flag unreadable for {}", self.history_key);
                false
            }
        };

        enabled
            && self
                .read()
                .await
                .is_ok_and(|messages| messages.len() <= QUICK_REPLY_MAX_MESSAGES)
    }

    pub async fn hide_quick_replies(&self) -> Result<(), ()> {
        let _guard = self.lock.lock().await;
        self.storage
            .set(&self.quick_replies_key, false.to_string())
            .await
    }

    /// Reads the stored transcript. Only a missing or unreadable transcript is replaced by
    /// the seeded greeting, a storage failure is returned as is.
    async fn read(&self) -> Result<Vec<ChatMessage>, ()> {
        if let Some(raw) = self.storage.get(&self.history_key).await? {
            match decode_transcript(&raw) {
                Ok(messages) => return Ok(messages),
                Err(e) => warn!("discarding unreadable chat history {}: {e}", self.history_key),
            }
        }

        let seeded = vec![ChatMessage::bot(GREETING)];
        // a failed write only means the greeting is seeded again next time
        let _ = self.save(&seeded).await;
        Ok(seeded)
    }

    async fn save(&self, messages: &[ChatMessage]) -> Result<(), ()> {
        let encoded = encode_transcript(messages).map_err(|e| error!("{e}"))?;
        self.storage.set(&self.history_key, encoded).await
    }
}
