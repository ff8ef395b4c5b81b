//! Minimal client for the spreadsheet values API: append a row, count the rows of a range.

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request, Uri};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::http_client::{HttpClient, HttpClientError};
use crate::{TokenRetriever, TokenRetrieverError};

/// Default endpoint of the spreadsheets resource.
pub const DEFAULT_SHEETS_API_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("authorizing request: `{0}`")]
    Authorization(#[from] TokenRetrieverError),
    #[error("building request: `{0}`")]
    InvalidRequest(String),
    #[error("sending request: `{0}`")]
    HttpClient(#[from] HttpClientError),
    #[error("spreadsheet API error: Status code: `{0}`, Reason: `{1}`")]
    HttpResponseError(u16, String),
    #[error("unable to deserialize response: `{0}`")]
    DeserializeError(String),
}

/// Spreadsheet operations the gateway relies on.
#[cfg_attr(test, mockall::automock)]
pub trait SheetsApi {
    /// Appends `row` after the last row of the table found in `range`.
    fn append_row(&self, range: &str, row: Vec<String>) -> Result<(), SheetsError>;
    /// Counts the rows holding data in `range`.
    fn count_rows(&self, range: &str) -> Result<u64, SheetsError>;
}

/// Values returned when reading a range. Google omits `values` when the range is empty.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

pub struct SheetsClient<C, T> {
    http_client: C,
    token_retriever: T,
    base_url: Url,
    spreadsheet_id: String,
}

impl<C, T> SheetsClient<C, T>
where
    C: HttpClient,
    T: TokenRetriever,
{
    pub fn new(http_client: C, token_retriever: T, base_url: Url, spreadsheet_id: String) -> Self {
        Self {
            http_client,
            token_retriever,
            base_url,
            spreadsheet_id,
        }
    }

    /// URL of the `values` resource for `range`, with an optional custom method suffix
    /// (`:append`). The range is percent-encoded as a single path segment.
    fn values_url(&self, range: &str, method_suffix: &str) -> Result<Url, SheetsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidRequest(format!("invalid base url: {}", self.base_url)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{range}{method_suffix}"));
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, body: Vec<u8>) -> Result<Request<Vec<u8>>, SheetsError> {
        let token = self.token_retriever.retrieve()?;
        let uri = url
            .as_str()
            .parse::<Uri>()
            .map_err(|e| SheetsError::InvalidRequest(e.to_string()))?;

        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, token.to_string())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|e| SheetsError::InvalidRequest(e.to_string()))
    }

    fn send(&self, request: Request<Vec<u8>>) -> Result<Vec<u8>, SheetsError> {
        let response = self.http_client.send(request)?;
        let status = response.status();
        let body = response.into_body();

        if !status.is_success() {
            return Err(SheetsError::HttpResponseError(
                status.as_u16(),
                String::from_utf8_lossy(&body).to_string(),
            ));
        }
        Ok(body)
    }
}

impl<C, T> SheetsApi for SheetsClient<C, T>
where
    C: HttpClient,
    T: TokenRetriever,
{
    fn append_row(&self, range: &str, row: Vec<String>) -> Result<(), SheetsError> {
        let mut url = self.values_url(range, ":append")?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = serde_json::to_vec(&json!({ "values": [row] }))
            .map_err(|e| SheetsError::InvalidRequest(e.to_string()))?;

        let request = self.request(Method::POST, url, body)?;
        self.send(request)?;
        debug!(range, "row appended");
        Ok(())
    }

    fn count_rows(&self, range: &str) -> Result<u64, SheetsError> {
        let url = self.values_url(range, "")?;
        let request = self.request(Method::GET, url, Vec::new())?;
        let body = self.send(request)?;

        let value_range: ValueRange = serde_json::from_slice(&body)
            .map_err(|e| SheetsError::DeserializeError(e.to_string()))?;

        Ok(value_range.values.len() as u64)
    }
}
