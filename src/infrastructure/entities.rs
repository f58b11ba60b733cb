//! Database entities

use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A contact form submission as received. Missing fields are left to the NOT NULL constraints.
#[derive(Debug, Clone, Default)]
pub struct NewContactMessage {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, FromRow)]
pub struct KeyValueEntry {
    pub entry_key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
}
