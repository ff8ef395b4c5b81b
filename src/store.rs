//! Persistence of form submissions.
//!
//! The gateway talks to a single [`SubmissionStore`], chosen once at startup from the
//! configured [`StorageBackend`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::config::StorageBackend;
use crate::http::config::HttpConfig;
use crate::sheets::SheetsError;
use crate::submission::{ContactMessage, WaitlistEntry};

pub mod database;
pub mod spreadsheet;

use database::DatabaseStore;
use spreadsheet::SpreadsheetStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: `{0}`")]
    Database(#[from] sqlx::Error),
    #[error("spreadsheet error: `{0}`")]
    Spreadsheet(#[from] SheetsError),
    #[error("setting up spreadsheet client: `{0}`")]
    SpreadsheetSetup(String),
    #[error("storage task failed: `{0}`")]
    Task(#[from] tokio::task::JoinError),
    #[error("store is closed")]
    Closed,
}

/// A submission as persisted by a backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord<T> {
    /// Identifier assigned by the backend, if it assigns any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(flatten)]
    pub entry: T,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn add_waitlist(
        &self,
        entry: WaitlistEntry,
    ) -> Result<StoredRecord<WaitlistEntry>, StoreError>;

    async fn add_contact(
        &self,
        message: ContactMessage,
    ) -> Result<StoredRecord<ContactMessage>, StoreError>;

    async fn waitlist_count(&self) -> Result<u64, StoreError>;

    /// Releases the backend resources. Called once, on shutdown.
    async fn close(&self);
}

/// Builds the store for the configured backend.
pub async fn connect(
    backend: &StorageBackend,
    http_config: HttpConfig,
) -> Result<Arc<dyn SubmissionStore>, StoreError> {
    match backend {
        StorageBackend::Database(config) => {
            Ok(Arc::new(DatabaseStore::connect(&config.url).await?))
        }
        StorageBackend::Spreadsheet(config) => Ok(Arc::new(
            SpreadsheetStore::connect(config.to_owned(), http_config).await?,
        )),
    }
}
