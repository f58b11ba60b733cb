//! Pooled SQLite connection

use crate::config::Settings;
use di::inject;
use di::injectable;
use sqlx::SqlitePool;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::SqlitePoolOptions;
use std::ops::Deref;
use std::sync::Mutex;

/// Pool handed to every `DatabaseConnection` while set. The server installs it at startup
/// through [`DatabaseConnection::open`], integration tests share an in-memory database with
/// the DI container through [`DatabaseConnection::set_test_pool`].
static SHARED_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create() -> DatabaseConnection {
        let connection = Self::shared_pool().unwrap_or_else(|| {
            let settings = Settings::from_env();
            Self::connect(&settings.database_url)
                .expect("DATABASE_URL is validated by DatabaseConnection::open at startup")
        });

        DatabaseConnection { connection }
    }
}

impl DatabaseConnection {
    /// Creates a lazy pool for `url`. Fails when the URL is not a valid SQLite connection string.
    pub fn connect(url: &str) -> Result<SqlitePool, sqlx::Error> {
        SqlitePoolOptions::new().max_connections(5).connect_lazy(url)
    }

    /// Opens the pool for `url` and shares it with every connection the container creates.
    pub fn open(url: &str) -> Result<(), sqlx::Error> {
        let pool = Self::connect(url)?;
        Self::install(Some(pool));
        Ok(())
    }

    /// Applies the migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!().run(&self.connection).await
    }

    pub fn set_test_pool(pool: SqlitePool) {
        Self::install(Some(pool));
    }

    pub fn clear_test_pool() {
        Self::install(None);
    }

    fn install(pool: Option<SqlitePool>) {
        *SHARED_POOL.lock().unwrap_or_else(|p| p.into_inner()) = pool;
    }

    fn shared_pool() -> Option<SqlitePool> {
        SHARED_POOL.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}
