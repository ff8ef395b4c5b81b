use crate::authenticator::{Authenticator, GrantType, TokenRetrievalRequest};
use crate::jwt::claims::Claims;
use crate::jwt::signer::JwtSigner;
use crate::token::Token;
use crate::{TokenRetriever, TokenRetrieverError};

use chrono::{TimeDelta, Utc};
use http::Uri;
use std::fmt;
use std::sync::Mutex;
use tracing::debug;

/// A signed assertion should live enough for the token endpoint to consume it.
pub(crate) const DEFAULT_JWT_CLAIM_EXP: TimeDelta = TimeDelta::seconds(300);

/// Retrieves access tokens for a service account, reusing the last one until it expires.
///
/// Each refresh signs a fresh assertion with the account's private key and exchanges it at the
/// token endpoint. A failed refresh is reported straight away.
pub struct TokenRetrieverWithCache<A, J>
where
    A: Authenticator,
    J: JwtSigner,
{
    client_email: String,
    scope: String,
    audience: Uri,
    tokens: Mutex<Option<Token>>,
    jwt_signer: J,
    authenticator: A,
}

impl<A, J> fmt::Debug for TokenRetrieverWithCache<A, J>
where
    A: Authenticator,
    J: JwtSigner,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRetrieverWithCache")
            .field("client_email", &self.client_email)
            .field("scope", &self.scope)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

impl<A, J> TokenRetriever for TokenRetrieverWithCache<A, J>
where
    A: Authenticator,
    J: JwtSigner,
{
    fn retrieve(&self) -> Result<Token, TokenRetrieverError> {
        let mut cached_token = self
            .tokens
            .lock()
            .map_err(|_| TokenRetrieverError::PoisonError)?;

        if let Some(token) = cached_token.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.to_owned());
        }

        let token = self.refresh_token().inspect_err(|e| {
            debug!("error refreshing token: {e}");
        })?;
        debug!(expires_at = %token.expires_at(), "authorization token refreshed");
        *cached_token = Some(token.to_owned());

        Ok(token)
    }
}

impl<A, J> TokenRetrieverWithCache<A, J>
where
    A: Authenticator,
    J: JwtSigner,
{
    /// Creates a new `TokenRetrieverWithCache` signing assertions for `client_email` with the
    /// given scope. The audience is the token endpoint the authenticator talks to.
    pub fn new(
        client_email: String,
        scope: String,
        audience: Uri,
        authenticator: A,
        jwt_signer: J,
    ) -> Self {
        Self {
            client_email,
            scope,
            audience,
            tokens: Mutex::new(None),
            jwt_signer,
            authenticator,
        }
    }

    fn refresh_token(&self) -> Result<Token, TokenRetrieverError> {
        let issued_at = Utc::now();
        let expires_at = issued_at + DEFAULT_JWT_CLAIM_EXP;

        let (iat, exp): (u64, u64) = issued_at
            .timestamp()
            .try_into()
            .ok()
            .zip(expires_at.timestamp().try_into().ok())
            .ok_or_else(|| {
                TokenRetrieverError::TokenRetrieverError("converting token timestamps".into())
            })?;

        let claims = Claims::new(
            self.client_email.to_owned(),
            self.scope.to_owned(),
            self.audience.to_owned(),
            iat,
            exp,
        );
        let signed_jwt = self.jwt_signer.sign(claims)?;

        let request = TokenRetrievalRequest {
            grant_type: GrantType::JwtBearer,
            assertion: signed_jwt.value().into(),
        };

        let response = self.authenticator.authenticate(request)?;

        Token::try_from(response)
    }
}
