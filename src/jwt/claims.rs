use http::Uri;
use serde::{Deserialize, Serialize};

/// Scope granting read and write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// JWT Claims of a service-account assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Issuer. The service-account email will be used here.
    pub(crate) iss: String,
    /// Space delimited list of the requested permissions.
    pub(crate) scope: String,
    /// Audience. Full URL to the token endpoint.
    pub(crate) aud: String,
    /// Issued at (as UTC timestamp).
    pub(crate) iat: u64,
    /// Expiration time (as UTC timestamp).
    pub(crate) exp: u64,
}

impl Claims {
    /// Create a new Claims instance
    pub fn new(client_email: String, scope: String, aud: Uri, iat: u64, exp: u64) -> Self {
        Self {
            iss: client_email,
            scope,
            aud: aud.to_string(),
            iat,
            exp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_serialization() {
        let claims = Claims::new(
            "robot@project.iam.gserviceaccount.com".to_string(),
            SPREADSHEETS_SCOPE.to_string(),
            Uri::from_static("https://oauth2.googleapis.com/token"),
            1_700_000_000,
            1_700_000_300,
        );

        let serialized = serde_json::to_value(&claims).unwrap();

        assert_eq!(
            serialized,
            serde_json::json!({
                "iss": "robot@project.iam.gserviceaccount.com",
                "scope": "https://www.googleapis.com/auth/spreadsheets",
                "aud": "https://oauth2.googleapis.com/token",
                "iat": 1_700_000_000u64,
                "exp": 1_700_000_300u64,
            })
        );
    }
}
