use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, Uri};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

use crate::http_client::HttpClient;
use crate::token::AccessToken;

/// Default OAuth2 token endpoint for service accounts.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Error, Debug)]
pub enum AuthenticateError {
    #[error("unable to serialize request: `{0}`")]
    SerializeError(String),
    #[error("unable to deserialize token: `{0}`")]
    DeserializeError(String),
    #[error("token server error: Status code: `{0}`, Reason: `{1}`")]
    HttpResponseError(u16, String),
    #[error("http transport error: `{0}`")]
    HttpTransportError(String),
}

pub trait Authenticator {
    fn authenticate(
        &self,
        req: TokenRetrievalRequest,
    ) -> Result<TokenRetrievalResponse, AuthenticateError>;
}

/// Exchanges signed service-account assertions for access tokens.
pub struct HttpAuthenticator<C> {
    /// HTTP client
    http_client: C,
    /// Token endpoint URL
    url: Uri,
}

impl<C> HttpAuthenticator<C> {
    pub fn new(http_client: C, url: Uri) -> Self {
        Self { http_client, url }
    }
}

impl<C> Authenticator for HttpAuthenticator<C>
where
    C: HttpClient,
{
    /// Executes a form encoded POST request to the token endpoint and returns the decoded token
    /// response.
    fn authenticate(
        &self,
        req: TokenRetrievalRequest,
    ) -> Result<TokenRetrievalResponse, AuthenticateError> {
        let body = req.to_form_body();

        let request = http::Request::builder()
            .method(Method::POST)
            .uri(self.url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json")
            .body(body.into_bytes())
            .map_err(|e| AuthenticateError::SerializeError(e.to_string()))?;

        let response = self
            .http_client
            .send(request)
            .map_err(|e| AuthenticateError::HttpTransportError(e.to_string()))?;

        let body = String::from_utf8(response.body().clone()).map_err(|e| {
            AuthenticateError::DeserializeError(format!("invalid utf8 response: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AuthenticateError::HttpResponseError(
                response.status().as_u16(),
                body,
            ));
        }

        serde_json::from_str(body.as_str())
            .map_err(|e| AuthenticateError::DeserializeError(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GrantType {
    #[serde(rename = "urn:ietf:params:oauth:grant-type:jwt-bearer")]
    JwtBearer,
}

impl GrantType {
    fn as_str(&self) -> &'static str {
        match self {
            GrantType::JwtBearer => "urn:ietf:params:oauth:grant-type:jwt-bearer",
        }
    }
}

type Assertion = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRetrievalRequest {
    pub grant_type: GrantType,
    pub assertion: Assertion,
}

impl TokenRetrievalRequest {
    fn to_form_body(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", self.grant_type.as_str())
            .append_pair("assertion", &self.assertion)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TokenRetrievalResponse {
    pub access_token: AccessToken,
    /// The lifetime in seconds of the access token.
    pub expires_in: u64,
    pub token_type: String,
}
