use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::normalizer::{ESCAPED_NEWLINE, PEM_FOOTER, PEM_HEADER, body_base64};

/// Shape of a raw private key value, safe to print: it never carries any key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDiagnostics {
    pub length: usize,
    pub has_header: bool,
    pub has_footer: bool,
    pub has_escaped_newlines: bool,
    pub has_line_breaks: bool,
    /// Whether the body left after normalization is valid, non-empty base64.
    pub body_decodes: bool,
}

impl KeyDiagnostics {
    pub fn inspect(raw: &str) -> Self {
        let body = body_base64(raw);
        Self {
            length: raw.len(),
            has_header: raw.contains(PEM_HEADER),
            has_footer: raw.contains(PEM_FOOTER),
            has_escaped_newlines: raw.contains(ESCAPED_NEWLINE),
            has_line_breaks: raw.contains('\n'),
            body_decodes: !body.is_empty() && STANDARD.decode(body.as_bytes()).is_ok(),
        }
    }
}

impl fmt::Display for KeyDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Key length: {}", self.length)?;
        writeln!(f, "Contains BEGIN marker: {}", self.has_header)?;
        writeln!(f, "Contains END marker: {}", self.has_footer)?;
        writeln!(f, "Contains \\n: {}", self.has_escaped_newlines)?;
        writeln!(f, "Contains line breaks: {}", self.has_line_breaks)?;
        write!(f, "Body decodes as base64: {}", self.body_decodes)
    }
}
