//! DB Repository abstractions

use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::{ContactMessage, KeyValueEntry, NewContactMessage};
use crate::infrastructure::traits::{ContactRepository, KeyValueStore};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::error;

#[injectable(ContactRepository)]
pub struct DbContactRepository {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl ContactRepository for DbContactRepository {
    async fn create_contact_message(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessage, ()> {
        sqlx::query_as(
            "INSERT INTO contact (name, email, subject, message, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(message.name)
        .bind(message.email)
        .bind(message.subject)
        .bind(message.message)
        .bind(Utc::now())
        .fetch_one(&**self.connection)
        .await
        .map_err(|e| error!("{e}"))
    }
}

#[injectable(KeyValueStore)]
pub struct DbKeyValueStore {
    connection: Ref<DatabaseConnection>,
}

#[async_trait]
impl KeyValueStore for DbKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ()> {
        let entry: Option<KeyValueEntry> =
            sqlx::query_as("SELECT entry_key, value, updated_at FROM kv_store WHERE entry_key = ?")
                .bind(key)
                .fetch_optional(&**self.connection)
                .await
                .map_err(|e| error!("{e}"))?;

        Ok(entry.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ()> {
        sqlx::query(
            "INSERT INTO kv_store (entry_key, value, updated_at) VALUES (?, ?, ?) ON CONFLICT(entry_key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&**self.connection)
        .await
        .map(|_| ())
        .map_err(|e| error!("{e}"))
    }
}
