//! Customer records and their rule table.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::MAX_NAME_LENGTH;
use crate::record::{optional_text, required_text, FieldValue, Fields, Record, StructureError};
use crate::validation::rules::{RuleKind, ValidationRule};

/// Accepted phone formats: `+` followed by 7-15 digits, or `123-456-7890`.
pub const PHONE_PATTERN: &str = r"^(\+\d{7,15}|\d{3}-\d{3}-\d{4})$";

pub const MSG_EMAIL_INVALID: &str = "invalid email format";
pub const MSG_EMAIL_TAKEN: &str = "email already exists";
pub const MSG_PHONE_INVALID: &str = "invalid phone format, use +1234567890 or 123-456-7890";

static CUSTOMER_RULES: LazyLock<Vec<ValidationRule>> = LazyLock::new(|| {
    vec![
        ValidationRule::new("name", RuleKind::Required, "name is required"),
        ValidationRule::new(
            "name",
            RuleKind::MaxLength(MAX_NAME_LENGTH),
            format!("name must be at most {MAX_NAME_LENGTH} characters"),
        ),
        ValidationRule::new("email", RuleKind::Required, "email is required"),
        ValidationRule::new("email", RuleKind::Email, MSG_EMAIL_INVALID),
        ValidationRule::new("email", RuleKind::Unique, MSG_EMAIL_TAKEN),
        ValidationRule::new(
            "phone",
            RuleKind::Pattern(Regex::new(PHONE_PATTERN).expect("valid regex")),
            MSG_PHONE_INVALID,
        ),
    ]
});

/// The ordered rule table applied to every customer record.
pub fn customer_rules() -> &'static [ValidationRule] {
    &CUSTOMER_RULES
}

/// A candidate customer. Name is trimmed, email trimmed and lowercased, a
/// blank phone is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerRecord {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl CustomerRecord {
    pub fn new(name: &str, email: &str, phone: Option<&str>) -> Self {
        Self {
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            phone: phone
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
        }
    }
}

impl Record for CustomerRecord {
    const ENTITY: &'static str = "customer";

    fn from_fields(fields: &Fields) -> Result<Self, StructureError> {
        let name = required_text(fields, "name")?;
        let email = required_text(fields, "email")?;
        let phone = optional_text(fields, "phone")?;
        Ok(Self::new(&name, &email, phone.as_deref()))
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "name" => Some(FieldValue::Text(&self.name)),
            "email" => Some(FieldValue::Text(&self.email)),
            "phone" => self.phone.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}
