//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::entities;
use async_trait::async_trait;

/// String key-value storage. Transcripts are stored through this.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ()>;

    /// Inserts or overwrites the value for `key`.
    async fn set(&self, key: &str, value: String) -> Result<(), ()>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create_contact_message(
        &self,
        message: entities::NewContactMessage,
    ) -> Result<entities::ContactMessage, ()>;
}
