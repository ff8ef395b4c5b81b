//! Form submissions accepted by the gateway.
//!
//! Payloads are deserialized leniently (every field optional) and then validated, so a missing
//! field and an empty one are reported the same way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum SubmissionError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// A waitlist sign-up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaitlistEntry {
    pub email: String,
    pub role: String,
    pub sport: String,
}

/// A message sent through the contact form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Raw waitlist payload as sent by the front end.
#[derive(Debug, Default, Deserialize)]
pub struct WaitlistForm {
    pub email: Option<String>,
    pub role: Option<String>,
    pub sport: Option<String>,
}

/// Raw contact payload as sent by the front end.
#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl TryFrom<WaitlistForm> for WaitlistEntry {
    type Error = SubmissionError;

    fn try_from(form: WaitlistForm) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let email = required("email", form.email, &mut missing);
        let role = required("role", form.role, &mut missing);
        let sport = required("sport", form.sport, &mut missing);

        match (email, role, sport) {
            (Some(email), Some(role), Some(sport)) => Ok(Self { email, role, sport }),
            _ => Err(SubmissionError::MissingFields(missing)),
        }
    }
}

impl TryFrom<ContactForm> for ContactMessage {
    type Error = SubmissionError;

    fn try_from(form: ContactForm) -> Result<Self, Self::Error> {
        let mut missing = Vec::new();
        let name = required("name", form.name, &mut missing);
        let email = required("email", form.email, &mut missing);
        let message = required("message", form.message, &mut missing);

        match (name, email, message) {
            (Some(name), Some(email), Some(message)) => Ok(Self {
                name,
                email,
                message,
            }),
            _ => Err(SubmissionError::MissingFields(missing)),
        }
    }
}

/// Keeps `value` when present and non-empty, recording `field` as missing otherwise.
fn required(
    field: &'static str,
    value: Option<String>,
    missing: &mut Vec<&'static str>,
) -> Option<String> {
    let value = value.filter(|v| !v.is_empty());
    if value.is_none() {
        missing.push(field);
    }
    value
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use rstest::rstest;

    use super::*;

    #[test]
    fn complete_waitlist_form() {
        let form: WaitlistForm =
            serde_json::from_str(r#"{"email":"ada@example.com","role":"athlete","sport":"tennis"}"#)
                .unwrap();

        assert_eq!(
            WaitlistEntry::try_from(form).unwrap(),
            WaitlistEntry {
                email: "ada@example.com".into(),
                role: "athlete".into(),
                sport: "tennis".into(),
            }
        );
    }

    #[rstest]
    #[case(r#"{}"#, vec!["email", "role", "sport"])]
    #[case(r#"{"email":"ada@example.com","role":"athlete"}"#, vec!["sport"])]
    #[case(r#"{"email":"","role":"athlete","sport":"tennis"}"#, vec!["email"])]
    #[case(r#"{"email":null,"role":"","sport":"tennis","extra":1}"#, vec!["email", "role"])]
    fn incomplete_waitlist_form(#[case] payload: &str, #[case] expected: Vec<&'static str>) {
        let form: WaitlistForm = serde_json::from_str(payload).unwrap();

        assert_matches!(
            WaitlistEntry::try_from(form),
            Err(SubmissionError::MissingFields(missing)) if missing == expected
        );
    }

    #[test]
    fn complete_contact_form() {
        let form = ContactForm {
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            message: Some("Hello!".into()),
        };

        let message = ContactMessage::try_from(form).unwrap();
        assert_eq!(message.name, "Ada");
        assert_eq!(message.message, "Hello!");
    }

    #[test]
    fn incomplete_contact_form() {
        let form = ContactForm {
            name: Some("Ada".into()),
            ..Default::default()
        };

        let error = ContactMessage::try_from(form).unwrap_err();
        assert_eq!(error.to_string(), "missing required fields: email, message");
    }
}
