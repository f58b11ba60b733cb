//! In-process key-value store

use crate::infrastructure::traits::KeyValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ()> {
        let entries = self.entries.read().map_err(|_| ())?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), ()> {
        let mut entries = self.entries.write().map_err(|_| ())?;
        entries.insert(key.to_owned(), value);
        Ok(())
    }
}
