//! Composable filter predicates over whitelisted entity fields.
//!
//! A [`Predicate`] is a plain expression tree; it knows nothing about SQL.
//! The persistence layer renders it into a parameterized `WHERE` clause.
//! [`FilterSchema`] turns `field=value` / `field__op=value` query
//! parameters into a predicate, accepting only the fields an entity
//! declares.

use std::ops::Not;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::error::CoreError;
use crate::money::Money;
use crate::types::Timestamp;

/// Query parameters that are never treated as filters.
pub const RESERVED_PARAMS: &[&str] = &["limit", "offset", "order_by"];

/// The kind of value a filterable field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Money,
    Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Money(Money),
    Timestamp(Timestamp),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Money> for FilterValue {
    fn from(value: Money) -> Self {
        Self::Money(value)
    }
}

impl From<Timestamp> for FilterValue {
    fn from(value: Timestamp) -> Self {
        Self::Timestamp(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Case-insensitive substring match.
    IContains,
    StartsWith,
}

impl CompareOp {
    fn from_suffix(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "exact" | "eq" => Self::Eq,
            "gt" => Self::Gt,
            "gte" => Self::Gte,
            "lt" => Self::Lt,
            "lte" => Self::Lte,
            "icontains" => Self::IContains,
            "startswith" => Self::StartsWith,
            _ => return None,
        })
    }

    fn applies_to(self, kind: ValueKind) -> bool {
        match self {
            Self::IContains | Self::StartsWith => kind == ValueKind::Text,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: &'static str,
        op: CompareOp,
        value: FilterValue,
    },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(column: &'static str, op: CompareOp, value: impl Into<FilterValue>) -> Self {
        Self::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn gt(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn gte(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    pub fn lt(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn lte(column: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }

    pub fn icontains(column: &'static str, text: &str) -> Self {
        Self::compare(column, CompareOp::IContains, text)
    }

    pub fn starts_with(column: &'static str, text: &str) -> Self {
        Self::compare(column, CompareOp::StartsWith, text)
    }

    /// Conjunction, flattening nested `And`s.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, Self::And(mut right)) => {
                right.insert(0, left);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Disjunction, flattening nested `Or`s.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), right) => {
                left.push(right);
                Self::Or(left)
            }
            (left, Self::Or(mut right)) => {
                right.insert(0, left);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Conjunction of all `predicates`; `None` when there are none.
    pub fn all<I>(predicates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Predicate>,
    {
        predicates.into_iter().reduce(Predicate::and)
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

/// One filterable field: its public name, its column and its value kind.
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: ValueKind,
}

const fn field(name: &'static str, column: &'static str, kind: ValueKind) -> FilterField {
    FilterField { name, column, kind }
}

/// Sort order for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ordering {
    pub column: &'static str,
    pub descending: bool,
}

/// The filterable and sortable fields of one entity.
#[derive(Debug)]
pub struct FilterSchema {
    pub entity: &'static str,
    pub fields: &'static [FilterField],
    pub default_ordering: Ordering,
}

impl FilterSchema {
    fn lookup(&self, name: &str) -> Option<&FilterField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build a conjunction from query parameters.
    ///
    /// Keys are `field` (equality) or `field__op`. Reserved parameters are
    /// skipped. Unknown fields, unknown operators and unparsable values are
    /// validation errors.
    pub fn parse<'a, I>(&self, params: I) -> Result<Option<Predicate>, CoreError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut predicates = Vec::new();
        for (key, raw) in params {
            if RESERVED_PARAMS.contains(&key) {
                continue;
            }
            let (name, op) = match key.split_once("__") {
                Some((name, suffix)) => {
                    let op = CompareOp::from_suffix(suffix).ok_or_else(|| {
                        CoreError::Validation(format!("unknown filter operator '{suffix}'"))
                    })?;
                    (name, op)
                }
                None => (key, CompareOp::Eq),
            };
            let field = self.lookup(name).ok_or_else(|| {
                CoreError::Validation(format!(
                    "unknown filter field '{name}' for {}",
                    self.entity
                ))
            })?;
            if !op.applies_to(field.kind) {
                return Err(CoreError::Validation(format!(
                    "operator '{key}' is not supported for field '{name}'"
                )));
            }
            let value = parse_value(field, raw)?;
            predicates.push(Predicate::compare(field.column, op, value));
        }
        Ok(Predicate::all(predicates))
    }

    /// Parse `order_by` (`field` ascending, `-field` descending).
    pub fn ordering(&self, order_by: Option<&str>) -> Result<Ordering, CoreError> {
        let Some(spec) = order_by.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(self.default_ordering);
        };
        let (name, descending) = match spec.strip_prefix('-') {
            Some(name) => (name, true),
            None => (spec, false),
        };
        let field = self.lookup(name).ok_or_else(|| {
            CoreError::Validation(format!("cannot order {} by '{name}'", self.entity))
        })?;
        Ok(Ordering {
            column: field.column,
            descending,
        })
    }
}

fn parse_value(field: &FilterField, raw: &str) -> Result<FilterValue, CoreError> {
    let invalid = || {
        CoreError::Validation(format!(
            "invalid value '{raw}' for filter field '{}'",
            field.name
        ))
    };
    match field.kind {
        ValueKind::Text => Ok(FilterValue::Text(raw.to_string())),
        ValueKind::Integer => raw.trim().parse().map(FilterValue::Integer).map_err(|_| invalid()),
        ValueKind::Money => Money::parse(raw).map(FilterValue::Money).map_err(|_| invalid()),
        ValueKind::Timestamp => parse_timestamp(raw).map(FilterValue::Timestamp).ok_or_else(invalid),
    }
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` date meaning midnight UTC.
fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

pub static CUSTOMER_FILTERS: FilterSchema = FilterSchema {
    entity: "customers",
    fields: &[
        field("id", "id", ValueKind::Integer),
        field("name", "name", ValueKind::Text),
        field("email", "email", ValueKind::Text),
        field("phone", "phone", ValueKind::Text),
        field("created_at", "created_at", ValueKind::Timestamp),
    ],
    default_ordering: Ordering {
        column: "created_at",
        descending: true,
    },
};

pub static PRODUCT_FILTERS: FilterSchema = FilterSchema {
    entity: "products",
    fields: &[
        field("id", "id", ValueKind::Integer),
        field("name", "name", ValueKind::Text),
        field("price", "price_cents", ValueKind::Money),
        field("stock", "stock", ValueKind::Integer),
        field("created_at", "created_at", ValueKind::Timestamp),
    ],
    default_ordering: Ordering {
        column: "created_at",
        descending: true,
    },
};

pub static ORDER_FILTERS: FilterSchema = FilterSchema {
    entity: "orders",
    fields: &[
        field("id", "id", ValueKind::Integer),
        field("customer_id", "customer_id", ValueKind::Integer),
        field("customer_name", "customer_name", ValueKind::Text),
        field("total_amount", "total_amount_cents", ValueKind::Money),
        field("order_date", "order_date", ValueKind::Timestamp),
    ],
    default_ordering: Ordering {
        column: "order_date",
        descending: true,
    },
};
