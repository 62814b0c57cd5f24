//! Typed candidate records.
//!
//! Every entity that can be ingested has its own statically declared record
//! type implementing [`Record`]. Building a record from a JSON field mapping
//! is the structural check: it fails only when a required field is missing
//! or carries a value of the wrong JSON type. Whether the values are
//! acceptable is decided later by the rule table.

use serde_json::{Map, Value};

use crate::money::Money;
use crate::types::{DbId, Timestamp};

/// A raw field mapping as submitted by a caller.
pub type Fields = Map<String, Value>;

/// A borrowed view of one typed field, handed to validation rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Money(Money),
    Id(DbId),
    Ids(&'a [DbId]),
    Timestamp(Timestamp),
}

/// A record could not be built from its field mapping.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("field '{field}' {problem}")]
pub struct StructureError {
    pub field: &'static str,
    pub problem: String,
}

impl StructureError {
    fn new(field: &'static str, problem: impl Into<String>) -> Self {
        Self {
            field,
            problem: problem.into(),
        }
    }
}

/// A candidate entity with named, typed fields.
pub trait Record: Sized {
    /// Entity name used in logs and error messages.
    const ENTITY: &'static str;

    /// Build the record from a raw field mapping, normalizing values.
    fn from_fields(fields: &Fields) -> Result<Self, StructureError>;

    /// Look up a field by name. `None` means the field is absent.
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;
}

fn present<'a>(fields: &'a Fields, name: &str) -> Option<&'a Value> {
    fields.get(name).filter(|v| !v.is_null())
}

pub(crate) fn required_text(fields: &Fields, name: &'static str) -> Result<String, StructureError> {
    optional_text(fields, name)?.ok_or_else(|| StructureError::new(name, "is required"))
}

pub(crate) fn optional_text(
    fields: &Fields,
    name: &'static str,
) -> Result<Option<String>, StructureError> {
    match present(fields, name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(StructureError::new(name, "must be a string")),
    }
}

pub(crate) fn required_money(fields: &Fields, name: &'static str) -> Result<Money, StructureError> {
    let value = present(fields, name).ok_or_else(|| StructureError::new(name, "is required"))?;
    Money::from_json(value).map_err(|e| StructureError::new(name, format!("is invalid: {e}")))
}

pub(crate) fn optional_integer(
    fields: &Fields,
    name: &'static str,
) -> Result<Option<i64>, StructureError> {
    match present(fields, name) {
        None => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| StructureError::new(name, "must be an integer")),
    }
}

fn id_from_value(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn required_id(fields: &Fields, name: &'static str) -> Result<DbId, StructureError> {
    let value = present(fields, name).ok_or_else(|| StructureError::new(name, "is required"))?;
    id_from_value(value).ok_or_else(|| StructureError::new(name, "must be an ID"))
}

pub(crate) fn required_id_list(
    fields: &Fields,
    name: &'static str,
) -> Result<Vec<DbId>, StructureError> {
    let value = present(fields, name).ok_or_else(|| StructureError::new(name, "is required"))?;
    let items = value
        .as_array()
        .ok_or_else(|| StructureError::new(name, "must be a list of IDs"))?;
    items
        .iter()
        .map(|item| {
            id_from_value(item).ok_or_else(|| StructureError::new(name, "must be a list of IDs"))
        })
        .collect()
}

pub(crate) fn optional_timestamp(
    fields: &Fields,
    name: &'static str,
) -> Result<Option<Timestamp>, StructureError> {
    match present(fields, name) {
        None => Ok(None),
        Some(Value::String(s)) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&chrono::Utc)))
            .map_err(|_| StructureError::new(name, "must be an RFC 3339 timestamp")),
        Some(_) => Err(StructureError::new(name, "must be an RFC 3339 timestamp")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_and_null_required_text_are_structural_errors() {
        let err = required_text(&fields(json!({})), "name").unwrap_err();
        assert_eq!(err.field, "name");
        assert_eq!(err.to_string(), "field 'name' is required");

        assert!(required_text(&fields(json!({"name": null})), "name").is_err());
        assert!(required_text(&fields(json!({"name": 7})), "name").is_err());
    }

    #[test]
    fn empty_string_is_structurally_present() {
        let text = required_text(&fields(json!({"name": ""})), "name").unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn ids_accept_numbers_and_numeric_strings() {
        let f = fields(json!({"customer_id": "12", "product_ids": [1, "2"]}));
        assert_eq!(required_id(&f, "customer_id").unwrap(), 12);
        assert_eq!(required_id_list(&f, "product_ids").unwrap(), vec![1, 2]);

        let bad = fields(json!({"product_ids": [1, "two"]}));
        assert!(required_id_list(&bad, "product_ids").is_err());
    }

    #[test]
    fn timestamps_must_be_rfc3339() {
        let f = fields(json!({"order_date": "2024-05-01T10:00:00Z"}));
        assert!(optional_timestamp(&f, "order_date").unwrap().is_some());

        let bad = fields(json!({"order_date": "yesterday"}));
        assert!(optional_timestamp(&bad, "order_date").is_err());
    }
}
