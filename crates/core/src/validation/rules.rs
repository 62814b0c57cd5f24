//! Validation rule, violation and uniqueness-key types.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Serialize;

use crate::money::Money;
use crate::record::FieldValue;

/// The predicate a rule applies to its field.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Present and, for text, not blank.
    Required,
    MinLength(usize),
    MaxLength(usize),
    /// An `@` followed by a valid domain.
    Email,
    Pattern(Regex),
    MinValue(i64),
    MaxValue(i64),
    MinMoney(Money),
    NonEmptyList,
    /// Not taken in storage and not claimed by an earlier accepted record.
    Unique,
}

impl RuleKind {
    /// Stable snake_case name, reported alongside violations.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Email => "email",
            Self::Pattern(_) => "regex_pattern",
            Self::MinValue(_) => "min_value",
            Self::MaxValue(_) => "max_value",
            Self::MinMoney(_) => "min_money",
            Self::NonEmptyList => "non_empty",
            Self::Unique => "unique",
        }
    }
}

/// A named, field-scoped predicate with a human-readable failure reason.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub field: &'static str,
    pub kind: RuleKind,
    pub message: Cow<'static, str>,
}

impl ValidationRule {
    pub fn new(field: &'static str, kind: RuleKind, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field,
            kind,
            message: message.into(),
        }
    }

    pub fn rule_type(&self) -> &'static str {
        self.kind.name()
    }
}

/// The first rule a record failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub rule_type: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn from_rule(rule: &ValidationRule) -> Self {
        Self {
            field: rule.field,
            rule_type: rule.rule_type(),
            message: rule.message.to_string(),
        }
    }
}

/// Values already taken for fields carrying a [`RuleKind::Unique`] rule.
///
/// Seeded from storage before a batch is validated; the coordinator claims
/// the keys of every accepted record so later duplicates in the same batch
/// are rejected. Keys compare trimmed and case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct UniqueKeys {
    taken: HashMap<&'static str, HashSet<String>>,
}

impl UniqueKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `values` of `field` as already present in storage.
    pub fn with_existing<I, S>(mut self, field: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = self.taken.entry(field).or_default();
        set.extend(values.into_iter().map(|v| normalize_key(v.as_ref())));
        self
    }

    pub fn is_taken(&self, field: &str, key: &str) -> bool {
        self.taken
            .get(field)
            .is_some_and(|set| set.contains(&normalize_key(key)))
    }

    pub fn claim(&mut self, field: &'static str, key: &str) {
        self.taken.entry(field).or_default().insert(normalize_key(key));
    }
}

/// The comparable key of a field value, if the value kind can be unique.
pub fn unique_key(value: &FieldValue<'_>) -> Option<String> {
    match value {
        FieldValue::Text(s) => Some((*s).to_string()),
        FieldValue::Integer(n) | FieldValue::Id(n) => Some(n.to_string()),
        _ => None,
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
