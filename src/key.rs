use std::fmt;

use crate::jwt::signer::local::{LocalPrivateKeySigner, LocalPrivateKeySignerError};

pub mod diagnostics;
pub mod normalizer;

pub use normalizer::{PEM_FOOTER, PEM_HEADER, normalize};

/// Represents a PEM-encoded private key "byte string".
#[derive(Clone, PartialEq)]
pub struct PrivateKeyPem(Vec<u8>);

impl<S: AsRef<[u8]>> From<S> for PrivateKeyPem {
    fn from(key: S) -> Self {
        PrivateKeyPem(key.as_ref().to_vec())
    }
}

impl PrivateKeyPem {
    /// Builds the key from a raw configuration value, normalizing it into a canonical PEM block.
    pub fn from_raw(raw: &str) -> Self {
        Self::from(normalize(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_slice()
    }
}

impl fmt::Debug for PrivateKeyPem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKeyPem: redacted")
    }
}

impl TryFrom<PrivateKeyPem> for LocalPrivateKeySigner {
    type Error = LocalPrivateKeySignerError;
    fn try_from(value: PrivateKeyPem) -> Result<Self, Self::Error> {
        Self::try_from(value.0)
    }
}

impl TryFrom<&PrivateKeyPem> for LocalPrivateKeySigner {
    type Error = LocalPrivateKeySignerError;
    fn try_from(value: &PrivateKeyPem) -> Result<Self, Self::Error> {
        Self::try_from(value.0.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::signer::local::test::RS256_PRIVATE_KEY;

    #[test]
    fn debug_output_never_contains_key_material() {
        let key = PrivateKeyPem::from(RS256_PRIVATE_KEY);
        let printed = format!("{key:?}");
        assert_eq!(printed, "PrivateKeyPem: redacted");
    }

    #[test]
    fn from_raw_normalizes_escaped_keys() {
        let escaped = RS256_PRIVATE_KEY.trim_end().replace('\n', "\\n");
        let key = PrivateKeyPem::from_raw(&escaped);
        assert_eq!(key.as_bytes(), RS256_PRIVATE_KEY.trim_end().as_bytes());
    }

    #[test]
    fn from_raw_empty_value_is_empty() {
        assert!(PrivateKeyPem::from_raw("").is_empty());
    }

    #[test]
    fn escaped_key_builds_a_signer() {
        let escaped = RS256_PRIVATE_KEY.replace('\n', "\\n");
        let signer = LocalPrivateKeySigner::try_from(PrivateKeyPem::from_raw(&escaped));
        assert!(signer.is_ok());
    }

    #[test]
    fn empty_key_is_rejected_by_the_signer() {
        let signer = LocalPrivateKeySigner::try_from(&PrivateKeyPem::from_raw(""));
        assert!(signer.is_err());
    }
}
