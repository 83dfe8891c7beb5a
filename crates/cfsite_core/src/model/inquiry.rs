//! Product inquiry model.
//!
//! # Responsibility
//! - Define the inquiry record submitted by the public inquiry form.
//! - Validate and normalize form input before it reaches a backend.
//!
//! # Invariants
//! - `name`, `email` and `message` are non-empty after trimming.
//! - Optional fields are `None` rather than empty strings.
//! - New inquiries always start in `InquiryStatus::New`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub const NAME_MAX_CHARS: usize = 120;
pub const MESSAGE_MAX_CHARS: usize = 4000;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

/// Stable identifier of an inquiry.
pub type InquiryId = Uuid;

/// Follow-up state of an inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    /// Submitted and not yet handled.
    New,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl Display for InquiryStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Form input validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InquiryValidationError {
    EmptyName,
    NameTooLong { max_chars: usize },
    InvalidEmail(String),
    EmptyMessage,
    MessageTooLong { max_chars: usize },
}

impl Display for InquiryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name cannot be empty"),
            Self::NameTooLong { max_chars } => {
                write!(f, "name exceeds {max_chars} characters")
            }
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::EmptyMessage => write!(f, "message cannot be empty"),
            Self::MessageTooLong { max_chars } => {
                write!(f, "message exceeds {max_chars} characters")
            }
        }
    }
}

impl Error for InquiryValidationError {}

/// Raw inquiry form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInquiry {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    /// Product the customer asked about (slug or name).
    #[serde(default)]
    pub product: Option<String>,
    /// Event date as entered, typically `YYYY-MM-DD`.
    #[serde(default)]
    pub event_date: Option<String>,
    pub message: String,
}

impl NewInquiry {
    /// Returns a trimmed copy or the first validation failure.
    pub fn normalized(&self) -> Result<Self, InquiryValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(InquiryValidationError::EmptyName);
        }
        if name.chars().count() > NAME_MAX_CHARS {
            return Err(InquiryValidationError::NameTooLong {
                max_chars: NAME_MAX_CHARS,
            });
        }

        let email = self.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(InquiryValidationError::InvalidEmail(email.to_string()));
        }

        let message = self.message.trim();
        if message.is_empty() {
            return Err(InquiryValidationError::EmptyMessage);
        }
        if message.chars().count() > MESSAGE_MAX_CHARS {
            return Err(InquiryValidationError::MessageTooLong {
                max_chars: MESSAGE_MAX_CHARS,
            });
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_ascii_lowercase(),
            phone: normalize_optional(self.phone.as_deref()),
            company: normalize_optional(self.company.as_deref()),
            product: normalize_optional(self.product.as_deref()),
            event_date: normalize_optional(self.event_date.as_deref()),
            message: message.to_string(),
        })
    }
}

/// Stored inquiry as read back from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    /// Backend-assigned creation timestamp (ISO-8601).
    #[serde(default)]
    pub created_at: Option<String>,
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{InquiryStatus, InquiryValidationError, NewInquiry, NAME_MAX_CHARS};

    fn valid_input() -> NewInquiry {
        NewInquiry {
            name: "  Dana Reyes ".to_string(),
            email: " Dana@Example.com ".to_string(),
            phone: Some("   ".to_string()),
            company: Some(" Stagecraft Ltd ".to_string()),
            product: Some("led-wall".to_string()),
            event_date: None,
            message: " Need a quote for 3 days. ".to_string(),
        }
    }

    #[test]
    fn normalized_trims_and_drops_blank_optionals() {
        let normalized = valid_input().normalized().unwrap();
        assert_eq!(normalized.name, "Dana Reyes");
        assert_eq!(normalized.email, "dana@example.com");
        assert_eq!(normalized.phone, None);
        assert_eq!(normalized.company.as_deref(), Some("Stagecraft Ltd"));
        assert_eq!(normalized.message, "Need a quote for 3 days.");
    }

    #[test]
    fn normalized_rejects_invalid_input() {
        let mut input = valid_input();
        input.name = "   ".to_string();
        assert_eq!(input.normalized(), Err(InquiryValidationError::EmptyName));

        let mut input = valid_input();
        input.name = "x".repeat(NAME_MAX_CHARS + 1);
        assert!(matches!(
            input.normalized(),
            Err(InquiryValidationError::NameTooLong { .. })
        ));

        let mut input = valid_input();
        input.email = "not-an-email".to_string();
        assert!(matches!(
            input.normalized(),
            Err(InquiryValidationError::InvalidEmail(_))
        ));

        let mut input = valid_input();
        input.message = "\n".to_string();
        assert_eq!(
            input.normalized(),
            Err(InquiryValidationError::EmptyMessage)
        );
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(InquiryStatus::parse(" NEW "), Some(InquiryStatus::New));
        assert_eq!(InquiryStatus::parse("closed"), Some(InquiryStatus::Closed));
        assert_eq!(InquiryStatus::parse("archived"), None);
        assert_eq!(InquiryStatus::Contacted.to_string(), "contacted");
    }
}
