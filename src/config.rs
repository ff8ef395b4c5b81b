//! Gateway configuration, read from environment variables.
//!
//! Lookups go through a `Fn(&str) -> Result<String, VarError>` so tests can supply their own
//! environment. Blank values are treated as unset.

use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use http::{HeaderValue, Uri};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::authenticator::DEFAULT_TOKEN_URI;
use crate::http::config::{HttpConfig, ProxyConfig, ProxyError};
use crate::key::PrivateKeyPem;
use crate::key::diagnostics::KeyDiagnostics;
use crate::sheets::DEFAULT_SHEETS_API_URL;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const STORAGE_BACKEND_ENV: &str = "STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const CLIENT_EMAIL_ENV: &str = "GOOGLE_SHEETS_CLIENT_EMAIL";
pub const PRIVATE_KEY_ENV: &str = "GOOGLE_SHEETS_PRIVATE_KEY";
pub const SPREADSHEET_ID_ENV: &str = "GOOGLE_SHEETS_SPREADSHEET_ID";
pub const HEADER_ROWS_ENV: &str = "GOOGLE_SHEETS_HEADER_ROWS";
pub const TOKEN_URI_ENV: &str = "GOOGLE_TOKEN_URI";
pub const SHEETS_API_URL_ENV: &str = "GOOGLE_SHEETS_API_URL";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";
pub const CORS_ALLOW_CREDENTIALS_ENV: &str = "CORS_ALLOW_CREDENTIALS";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable `{0}`")]
    Missing(&'static str),
    #[error("invalid value for `{name}`: {reason}")]
    Invalid { name: &'static str, reason: String },
    #[error("invalid proxy configuration: `{0}`")]
    Proxy(#[from] ProxyError),
}

fn invalid(name: &'static str, reason: impl fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        name,
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listener: Listener,
    pub cors: CorsConfig,
    pub backend: StorageBackend,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Listener {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AllowedOrigins {
    Any,
    List(Vec<HeaderValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorsConfig {
    pub allowed_origins: AllowedOrigins,
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: AllowedOrigins::List(Vec::new()),
            allow_credentials: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Database,
    Spreadsheet,
}

impl BackendKind {
    /// Variables that must be set for this backend.
    pub fn required_vars(&self) -> &'static [&'static str] {
        match self {
            Self::Database => &[DATABASE_URL_ENV],
            Self::Spreadsheet => &[CLIENT_EMAIL_ENV, PRIVATE_KEY_ENV, SPREADSHEET_ID_ENV],
        }
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "database" | "db" => Ok(Self::Database),
            "spreadsheet" | "sheets" => Ok(Self::Spreadsheet),
            other => Err(format!(
                "unknown backend `{other}`, expected `database` or `spreadsheet`"
            )),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Database(DatabaseConfig),
    Spreadsheet(SpreadsheetConfig),
}

impl StorageBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Database(_) => BackendKind::Database,
            Self::Spreadsheet(_) => BackendKind::Spreadsheet,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadsheetConfig {
    pub client_email: String,
    /// Already normalized into a canonical PEM block.
    pub private_key: PrivateKeyPem,
    pub spreadsheet_id: String,
    /// Rows at the top of the waitlist tab that are not submissions.
    pub header_rows: u64,
    pub token_uri: Uri,
    pub api_url: Url,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|name| std::env::var(name))
    }

    pub fn from_env_with<F>(env_var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let listener = Listener {
            host: optional(&env_var, HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&env_var, PORT_ENV, DEFAULT_PORT)?,
        };
        if listener.port == 0 {
            return Err(invalid(PORT_ENV, "port cannot be 0"));
        }

        let cors = cors_config(&env_var)?;

        let kind = match optional(&env_var, STORAGE_BACKEND_ENV) {
            Some(value) => value
                .parse::<BackendKind>()
                .map_err(|e| invalid(STORAGE_BACKEND_ENV, e))?,
            None => BackendKind::Database,
        };
        let backend = match kind {
            BackendKind::Database => StorageBackend::Database(DatabaseConfig {
                url: required(&env_var, DATABASE_URL_ENV)?,
            }),
            BackendKind::Spreadsheet => StorageBackend::Spreadsheet(spreadsheet_config(&env_var)?),
        };

        let proxy = ProxyConfig::default().with_env_aware_url(&env_var)?;
        let http = HttpConfig {
            proxy,
            ..Default::default()
        };

        debug!(backend = %kind, address = %listener.address(), "configuration loaded");
        Ok(Self {
            listener,
            cors,
            backend,
            http,
        })
    }
}

fn spreadsheet_config<F>(env_var: &F) -> Result<SpreadsheetConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let client_email = required(env_var, CLIENT_EMAIL_ENV)?;
    let spreadsheet_id = required(env_var, SPREADSHEET_ID_ENV)?;

    let raw_key = required(env_var, PRIVATE_KEY_ENV)?;
    let diagnostics = KeyDiagnostics::inspect(&raw_key);
    debug!(
        length = diagnostics.length,
        has_header = diagnostics.has_header,
        has_footer = diagnostics.has_footer,
        has_escaped_newlines = diagnostics.has_escaped_newlines,
        "private key read from environment"
    );
    let private_key = PrivateKeyPem::from_raw(&raw_key);

    let token_uri = optional(env_var, TOKEN_URI_ENV)
        .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string())
        .parse::<Uri>()
        .map_err(|e| invalid(TOKEN_URI_ENV, e))?;
    let api_url = Url::parse(
        &optional(env_var, SHEETS_API_URL_ENV)
            .unwrap_or_else(|| DEFAULT_SHEETS_API_URL.to_string()),
    )
    .map_err(|e| invalid(SHEETS_API_URL_ENV, e))?;

    Ok(SpreadsheetConfig {
        client_email,
        private_key,
        spreadsheet_id,
        header_rows: parse_or(env_var, HEADER_ROWS_ENV, 0)?,
        token_uri,
        api_url,
    })
}

fn cors_config<F>(env_var: &F) -> Result<CorsConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    let allow_credentials = parse_or(env_var, CORS_ALLOW_CREDENTIALS_ENV, false)?;

    let allowed_origins = match optional(env_var, CORS_ALLOWED_ORIGINS_ENV) {
        Some(value) if value.trim() == "*" => AllowedOrigins::Any,
        Some(value) => AllowedOrigins::List(
            value
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(|origin| {
                    HeaderValue::from_str(origin).map_err(|e| invalid(CORS_ALLOWED_ORIGINS_ENV, e))
                })
                .collect::<Result<_, _>>()?,
        ),
        None => AllowedOrigins::List(Vec::new()),
    };

    let wildcard_in_list = match &allowed_origins {
        AllowedOrigins::List(origins) => origins.iter().any(|origin| origin == "*"),
        AllowedOrigins::Any => false,
    };
    if wildcard_in_list {
        return Err(invalid(
            CORS_ALLOWED_ORIGINS_ENV,
            "`*` must be the only allowed origin",
        ));
    }

    if allow_credentials && allowed_origins == AllowedOrigins::Any {
        return Err(invalid(
            CORS_ALLOWED_ORIGINS_ENV,
            "`*` cannot be combined with credentials",
        ));
    }

    Ok(CorsConfig {
        allowed_origins,
        allow_credentials,
    })
}

/// Returns the value of `name`, or `None` when unset or blank.
pub(crate) fn optional<F>(env_var: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    env_var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required<F>(env_var: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
{
    optional(env_var, name).ok_or(ConfigError::Missing(name))
}

fn parse_or<F, T>(env_var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, VarError>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match optional(env_var, name) {
        Some(value) => value.trim().parse().map_err(|e| invalid(name, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;
    use crate::jwt::signer::local::test::RS256_PRIVATE_KEY;
    use crate::key::{PEM_FOOTER, PEM_HEADER};

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn database_defaults() {
        let config =
            Config::from_env_with(env(&[(DATABASE_URL_ENV, "sqlite://gateway.db")])).unwrap();

        assert_eq!(config.listener.address(), "0.0.0.0:5000");
        assert_eq!(config.cors, CorsConfig::default());
        assert_eq!(config.backend.kind(), BackendKind::Database);
        assert_matches!(config.backend, StorageBackend::Database(db) => {
            assert_eq!(db.url, "sqlite://gateway.db");
        });
        assert!(config.http.proxy.url_as_string().is_empty());
    }

    #[test]
    fn database_url_is_required() {
        assert_matches!(
            Config::from_env_with(env(&[(STORAGE_BACKEND_ENV, "database")])),
            Err(ConfigError::Missing(DATABASE_URL_ENV))
        );
    }

    #[test]
    fn spreadsheet_key_is_normalized() {
        let escaped = RS256_PRIVATE_KEY.replace('\n', "\\n");
        let config = Config::from_env_with(env(&[
            (STORAGE_BACKEND_ENV, "spreadsheet"),
            (CLIENT_EMAIL_ENV, "gateway@project.iam.gserviceaccount.com"),
            (PRIVATE_KEY_ENV, &escaped),
            (SPREADSHEET_ID_ENV, "spreadsheet-id"),
            (HEADER_ROWS_ENV, "1"),
        ]))
        .unwrap();

        assert_matches!(config.backend, StorageBackend::Spreadsheet(sheets) => {
            let key = String::from_utf8(sheets.private_key.as_bytes().to_vec()).unwrap();
            assert!(key.starts_with(&format!("{PEM_HEADER}\n")));
            assert!(key.ends_with(&format!("\n{PEM_FOOTER}")));
            assert!(!key.contains("\\n"));
            assert_eq!(sheets.header_rows, 1);
            assert_eq!(sheets.token_uri, DEFAULT_TOKEN_URI);
            assert_eq!(sheets.api_url.as_str(), DEFAULT_SHEETS_API_URL);
        });
    }

    #[rstest]
    #[case(CLIENT_EMAIL_ENV)]
    #[case(PRIVATE_KEY_ENV)]
    #[case(SPREADSHEET_ID_ENV)]
    fn spreadsheet_requires(#[case] missing: &'static str) {
        let vars: Vec<(&str, &str)> = [
            (STORAGE_BACKEND_ENV, "spreadsheet"),
            (CLIENT_EMAIL_ENV, "gateway@project.iam.gserviceaccount.com"),
            (PRIVATE_KEY_ENV, RS256_PRIVATE_KEY),
            (SPREADSHEET_ID_ENV, "spreadsheet-id"),
        ]
        .into_iter()
        .filter(|(name, _)| *name != missing)
        .collect();

        assert_matches!(
            Config::from_env_with(env(&vars)),
            Err(ConfigError::Missing(name)) if name == missing
        );
    }

    #[test]
    fn blank_private_key_is_missing() {
        assert_matches!(
            Config::from_env_with(env(&[
                (STORAGE_BACKEND_ENV, "spreadsheet"),
                (CLIENT_EMAIL_ENV, "gateway@project.iam.gserviceaccount.com"),
                (PRIVATE_KEY_ENV, "  "),
                (SPREADSHEET_ID_ENV, "spreadsheet-id"),
            ])),
            Err(ConfigError::Missing(PRIVATE_KEY_ENV))
        );
    }

    #[rstest]
    #[case(&[(PORT_ENV, "http")], PORT_ENV)]
    #[case(&[(PORT_ENV, "0")], PORT_ENV)]
    #[case(&[(STORAGE_BACKEND_ENV, "mongodb")], STORAGE_BACKEND_ENV)]
    #[case(&[(CORS_ALLOW_CREDENTIALS_ENV, "yes")], CORS_ALLOW_CREDENTIALS_ENV)]
    #[case(
        &[(CORS_ALLOWED_ORIGINS_ENV, "*"), (CORS_ALLOW_CREDENTIALS_ENV, "true")],
        CORS_ALLOWED_ORIGINS_ENV
    )]
    fn invalid_values(#[case] vars: &[(&str, &str)], #[case] expected: &'static str) {
        let mut vars = vars.to_vec();
        vars.push((DATABASE_URL_ENV, "sqlite://gateway.db"));

        assert_matches!(
            Config::from_env_with(env(&vars)),
            Err(ConfigError::Invalid { name, .. }) if name == expected
        );
    }

    #[test]
    fn cors_origin_list() {
        let config = Config::from_env_with(env(&[
            (DATABASE_URL_ENV, "sqlite://gateway.db"),
            (CORS_ALLOWED_ORIGINS_ENV, "https://example.com, http://localhost:3000,"),
            (CORS_ALLOW_CREDENTIALS_ENV, "true"),
        ]))
        .unwrap();

        assert_eq!(
            config.cors,
            CorsConfig {
                allowed_origins: AllowedOrigins::List(vec![
                    HeaderValue::from_static("https://example.com"),
                    HeaderValue::from_static("http://localhost:3000"),
                ]),
                allow_credentials: true,
            }
        );
    }

    #[test]
    fn cors_any_origin() {
        let config = Config::from_env_with(env(&[
            (DATABASE_URL_ENV, "sqlite://gateway.db"),
            (CORS_ALLOWED_ORIGINS_ENV, "*"),
        ]))
        .unwrap();

        assert_eq!(config.cors.allowed_origins, AllowedOrigins::Any);
    }

    #[test]
    fn listener_and_proxy_from_env() {
        let config = Config::from_env_with(env(&[
            (DATABASE_URL_ENV, "sqlite://gateway.db"),
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "8080"),
            ("HTTPS_PROXY", "http://proxy.internal:3128"),
        ]))
        .unwrap();

        assert_eq!(config.listener.address(), "127.0.0.1:8080");
        assert_eq!(
            config.http.proxy,
            ProxyConfig::new("http://proxy.internal:3128").unwrap()
        );
    }
}
