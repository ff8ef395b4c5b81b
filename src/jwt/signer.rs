use std::fmt;

use super::{claims::Claims, error::JwtEncoderError, signed::SignedJwt};
use crate::key::PrivateKeyPem;
use local::{LocalPrivateKeySigner, LocalPrivateKeySignerError};
use thiserror::Error;

pub mod local;

/// A JWT signer.
#[cfg_attr(test, mockall::automock)]
pub trait JwtSigner {
    fn sign(&self, claims: Claims) -> Result<SignedJwt, JwtEncoderError>;
}

/// Enumerates all implementations for `JwtSigner` for static dispatching reasons.
pub enum JwtSignerImpl {
    Local(LocalPrivateKeySigner),
}

impl JwtSigner for JwtSignerImpl {
    fn sign(&self, claims: Claims) -> Result<SignedJwt, JwtEncoderError> {
        match self {
            Self::Local(local_signer) => local_signer.sign(claims),
        }
    }
}

#[derive(Error, Debug)]
pub enum JwtSignerImplError {
    #[error("building local private key JWT signer: `{0}`")]
    LocalPrivateKeySignerError(#[from] LocalPrivateKeySignerError),
}

impl TryFrom<&PrivateKeyPem> for JwtSignerImpl {
    type Error = JwtSignerImplError;

    fn try_from(private_key: &PrivateKeyPem) -> Result<Self, Self::Error> {
        Ok(Self::Local(LocalPrivateKeySigner::try_from(private_key)?))
    }
}

impl fmt::Debug for JwtSignerImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(local_signer) => f.debug_tuple("Local").field(local_signer).finish(),
        }
    }
}
