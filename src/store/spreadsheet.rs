use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::task;
use tracing::{debug, info};

use super::{StoreError, StoredRecord, SubmissionStore};
use crate::authenticator::HttpAuthenticator;
use crate::config::SpreadsheetConfig;
use crate::http::client::HttpClient;
use crate::http::config::HttpConfig;
use crate::jwt::claims::SPREADSHEETS_SCOPE;
use crate::jwt::signer::JwtSignerImpl;
use crate::sheets::{SheetsApi, SheetsClient};
use crate::submission::{ContactMessage, WaitlistEntry};
use crate::token_retriever::TokenRetrieverWithCache;

pub const WAITLIST_RANGE: &str = "Waitlist!A:D";
pub const CONTACT_RANGE: &str = "Support!A:D";
/// First column of the waitlist tab, one cell per submitted row.
pub const WAITLIST_COUNT_RANGE: &str = "Waitlist!A:A";

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H:%M";

pub type GoogleSheetsClient = SheetsClient<
    HttpClient,
    TokenRetrieverWithCache<HttpAuthenticator<HttpClient>, JwtSignerImpl>,
>;

/// Submissions appended as rows of a spreadsheet.
///
/// The spreadsheet client is blocking, so every call runs on the blocking thread pool.
pub struct SpreadsheetStore<S> {
    api: Mutex<Option<Arc<S>>>,
    header_rows: u64,
}

impl SpreadsheetStore<GoogleSheetsClient> {
    /// Builds the authorized spreadsheet client described by `config`.
    pub async fn connect(
        config: SpreadsheetConfig,
        http_config: HttpConfig,
    ) -> Result<Self, StoreError> {
        let header_rows = config.header_rows;
        let client = task::spawn_blocking(move || build_client(config, http_config)).await??;
        info!(header_rows, "spreadsheet backend ready");
        Ok(Self::new(client, header_rows))
    }
}

fn build_client(
    config: SpreadsheetConfig,
    http_config: HttpConfig,
) -> Result<GoogleSheetsClient, StoreError> {
    let http_client =
        HttpClient::new(http_config).map_err(|e| StoreError::SpreadsheetSetup(e.to_string()))?;
    let jwt_signer = JwtSignerImpl::try_from(&config.private_key)
        .map_err(|e| StoreError::SpreadsheetSetup(e.to_string()))?;

    let authenticator = HttpAuthenticator::new(http_client.clone(), config.token_uri.clone());
    let token_retriever = TokenRetrieverWithCache::new(
        config.client_email,
        SPREADSHEETS_SCOPE.to_string(),
        config.token_uri,
        authenticator,
        jwt_signer,
    );

    Ok(SheetsClient::new(
        http_client,
        token_retriever,
        config.api_url,
        config.spreadsheet_id,
    ))
}

impl<S> SpreadsheetStore<S>
where
    S: SheetsApi + Send + Sync + 'static,
{
    pub fn new(api: S, header_rows: u64) -> Self {
        Self {
            api: Mutex::new(Some(Arc::new(api))),
            header_rows,
        }
    }

    fn api(&self) -> Result<Arc<S>, StoreError> {
        self.api
            .lock()
            .map_err(|_| StoreError::Closed)?
            .clone()
            .ok_or(StoreError::Closed)
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&S) -> Result<T, StoreError> + Send + 'static,
    {
        let api = self.api()?;
        task::spawn_blocking(move || f(&api)).await?
    }
}

#[async_trait]
impl<S> SubmissionStore for SpreadsheetStore<S>
where
    S: SheetsApi + Send + Sync + 'static,
{
    async fn add_waitlist(
        &self,
        entry: WaitlistEntry,
    ) -> Result<StoredRecord<WaitlistEntry>, StoreError> {
        let created_at = Utc::now();
        let row = waitlist_row(&entry, created_at);
        self.run(move |api| Ok(api.append_row(WAITLIST_RANGE, row)?))
            .await?;

        Ok(StoredRecord {
            id: None,
            entry,
            created_at,
        })
    }

    async fn add_contact(
        &self,
        message: ContactMessage,
    ) -> Result<StoredRecord<ContactMessage>, StoreError> {
        let created_at = Utc::now();
        let row = contact_row(&message, created_at);
        self.run(move |api| Ok(api.append_row(CONTACT_RANGE, row)?))
            .await?;

        Ok(StoredRecord {
            id: None,
            entry: message,
            created_at,
        })
    }

    async fn waitlist_count(&self) -> Result<u64, StoreError> {
        let rows = self
            .run(|api| Ok(api.count_rows(WAITLIST_COUNT_RANGE)?))
            .await?;
        debug!(rows, header_rows = self.header_rows, "waitlist rows read");

        Ok(rows.saturating_sub(self.header_rows))
    }

    async fn close(&self) {
        let api = self.api.lock().ok().and_then(|mut api| api.take());
        // The blocking HTTP client must not be dropped from async code.
        if let Some(api) = api {
            let _ = task::spawn_blocking(move || drop(api)).await;
        }
        info!("spreadsheet backend closed");
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

fn waitlist_row(entry: &WaitlistEntry, created_at: DateTime<Utc>) -> Vec<String> {
    vec![
        format_timestamp(created_at),
        entry.email.to_owned(),
        entry.role.to_owned(),
        entry.sport.to_owned(),
    ]
}

fn contact_row(message: &ContactMessage, created_at: DateTime<Utc>) -> Vec<String> {
    vec![
        format_timestamp(created_at),
        message.name.to_owned(),
        message.email.to_owned(),
        message.message.to_owned(),
    ]
}
