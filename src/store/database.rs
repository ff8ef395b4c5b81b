use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use super::{StoreError, StoredRecord, SubmissionStore};
use crate::submission::{ContactMessage, WaitlistEntry};

const MAX_CONNECTIONS: u32 = 5;

/// Submissions stored as rows of a SQL database.
#[derive(Debug)]
pub struct DatabaseStore {
    pool: SqlitePool,
}

impl DatabaseStore {
    /// Opens the database at `url`, creating it and its tables when missing.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        info!("database backend ready");
        Ok(store)
    }

    async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS waitlist (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL,
                role TEXT NOT NULL,
                sport TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS contact (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at DATETIME NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for DatabaseStore {
    async fn add_waitlist(
        &self,
        entry: WaitlistEntry,
    ) -> Result<StoredRecord<WaitlistEntry>, StoreError> {
        let created_at = Utc::now();
        let id = sqlx::query(
            "INSERT INTO waitlist (email, role, sport, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.email)
        .bind(&entry.role)
        .bind(&entry.sport)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(id, "waitlist row inserted");
        Ok(StoredRecord {
            id: Some(id),
            entry,
            created_at,
        })
    }

    async fn add_contact(
        &self,
        message: ContactMessage,
    ) -> Result<StoredRecord<ContactMessage>, StoreError> {
        let created_at = Utc::now();
        let id = sqlx::query(
            "INSERT INTO contact (name, email, message, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.message)
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        debug!(id, "contact row inserted");
        Ok(StoredRecord {
            id: Some(id),
            entry: message,
            created_at,
        })
    }

    async fn waitlist_count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM waitlist")
            .fetch_one(&self.pool)
            .await?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("database connections closed");
    }
}
