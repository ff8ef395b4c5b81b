//! Service-account assertions: the claims, the signer abstraction and its local implementation.

pub mod claims;
pub mod error;
pub mod signed;
pub mod signer;
