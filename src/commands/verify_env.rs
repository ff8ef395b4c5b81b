//! Report on the environment the gateway would start with.

use std::env::VarError;
use std::fmt;

use crate::config::{BackendKind, PRIVATE_KEY_ENV, STORAGE_BACKEND_ENV, optional};
use crate::key::diagnostics::KeyDiagnostics;

#[derive(Debug, Clone, PartialEq)]
pub struct EnvReport {
    pub backend: Result<BackendKind, String>,
    /// Required variables of the selected backend and whether each one is set.
    pub variables: Vec<(&'static str, bool)>,
    pub private_key: Option<KeyDiagnostics>,
}

impl EnvReport {
    pub fn collect<F>(env_var: F) -> Self
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        let backend = optional(&env_var, STORAGE_BACKEND_ENV)
            .map(|value| value.parse::<BackendKind>())
            .unwrap_or(Ok(BackendKind::Database));

        let variables: Vec<(&'static str, bool)> = backend
            .as_ref()
            .map(|kind| {
                kind.required_vars()
                    .iter()
                    .map(|name| (*name, optional(&env_var, name).is_some()))
                    .collect()
            })
            .unwrap_or_default();

        let private_key = match backend {
            Ok(BackendKind::Spreadsheet) => {
                optional(&env_var, PRIVATE_KEY_ENV).map(|raw| KeyDiagnostics::inspect(&raw))
            }
            _ => None,
        };

        Self {
            backend,
            variables,
            private_key,
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        self.variables
            .iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_ok(&self) -> bool {
        self.backend.is_ok() && self.missing().is_empty()
    }
}

impl fmt::Display for EnvReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Ok(kind) => writeln!(f, "Storage backend: {kind}")?,
            Err(e) => writeln!(f, "Storage backend: invalid ({e})")?,
        }

        for (name, present) in &self.variables {
            let state = if *present { "set" } else { "missing" };
            writeln!(f, "{name}: {state}")?;
        }

        if let Some(diagnostics) = &self.private_key {
            writeln!(f, "Private key:")?;
            for line in diagnostics.to_string().lines() {
                writeln!(f, "  {line}")?;
            }
            if !diagnostics.body_decodes {
                writeln!(f, "  warning: key body is not valid base64")?;
            }
        }

        if self.is_ok() {
            write!(f, "Environment OK")
        } else {
            write!(f, "Environment incomplete")
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{CLIENT_EMAIL_ENV, DATABASE_URL_ENV, SPREADSHEET_ID_ENV};
    use crate::jwt::signer::local::test::RS256_PRIVATE_KEY;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Result<String, VarError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned().ok_or(VarError::NotPresent)
    }

    #[test]
    fn database_backend_complete() {
        let report = EnvReport::collect(env(&[(DATABASE_URL_ENV, "sqlite://gateway.db")]));

        assert_eq!(report.backend, Ok(BackendKind::Database));
        assert_eq!(report.variables, vec![(DATABASE_URL_ENV, true)]);
        assert!(report.private_key.is_none());
        assert!(report.is_ok());
        assert!(report.to_string().ends_with("Environment OK"));
    }

    #[test]
    fn spreadsheet_backend_missing_id() {
        let escaped = RS256_PRIVATE_KEY.replace('\n', "\\n");
        let report = EnvReport::collect(env(&[
            (STORAGE_BACKEND_ENV, "spreadsheet"),
            (CLIENT_EMAIL_ENV, "gateway@project.iam.gserviceaccount.com"),
            (PRIVATE_KEY_ENV, &escaped),
        ]));

        assert!(!report.is_ok());
        assert_eq!(report.missing(), vec![SPREADSHEET_ID_ENV]);

        let diagnostics = report.private_key.as_ref().unwrap();
        assert!(diagnostics.has_header);
        assert!(diagnostics.has_escaped_newlines);
        assert!(diagnostics.body_decodes);

        let output = report.to_string();
        assert!(output.contains("GOOGLE_SHEETS_SPREADSHEET_ID: missing"));
        assert!(output.contains("  Contains BEGIN marker: true"));
        assert!(output.ends_with("Environment incomplete"));
    }

    #[test]
    fn report_never_prints_key_material() {
        let report = EnvReport::collect(env(&[
            (STORAGE_BACKEND_ENV, "spreadsheet"),
            (CLIENT_EMAIL_ENV, "gateway@project.iam.gserviceaccount.com"),
            (PRIVATE_KEY_ENV, RS256_PRIVATE_KEY),
            (SPREADSHEET_ID_ENV, "spreadsheet-id"),
        ]));

        assert!(report.is_ok());
        let output = report.to_string();
        for line in RS256_PRIVATE_KEY.lines().filter(|l| !l.is_empty() && !l.starts_with("-----")) {
            assert!(!output.contains(line));
        }
    }

    #[test]
    fn unknown_backend() {
        let report = EnvReport::collect(env(&[(STORAGE_BACKEND_ENV, "mongodb")]));

        assert!(report.backend.is_err());
        assert!(report.variables.is_empty());
        assert!(!report.is_ok());
        assert!(report.to_string().starts_with("Storage backend: invalid"));
    }
}
