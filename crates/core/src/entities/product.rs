//! Product records and their rule table.

use std::sync::LazyLock;

use serde::Serialize;

use super::MAX_NAME_LENGTH;
use crate::money::Money;
use crate::record::{
    optional_integer, required_money, required_text, FieldValue, Fields, Record, StructureError,
};
use crate::validation::rules::{RuleKind, ValidationRule};

/// Smallest price a product may carry.
pub const MIN_PRICE: Money = Money::from_cents(1);

static PRODUCT_RULES: LazyLock<Vec<ValidationRule>> = LazyLock::new(|| {
    vec![
        ValidationRule::new("name", RuleKind::Required, "name is required"),
        ValidationRule::new(
            "name",
            RuleKind::MaxLength(MAX_NAME_LENGTH),
            format!("name must be at most {MAX_NAME_LENGTH} characters"),
        ),
        ValidationRule::new("price", RuleKind::MinMoney(MIN_PRICE), "price must be positive"),
        ValidationRule::new("stock", RuleKind::MinValue(0), "stock cannot be negative"),
        ValidationRule::new(
            "stock",
            RuleKind::MaxValue(i64::from(i32::MAX)),
            "stock is too large",
        ),
    ]
});

/// The ordered rule table applied to every product record.
pub fn product_rules() -> &'static [ValidationRule] {
    &PRODUCT_RULES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub name: String,
    pub price: Money,
    pub stock: i64,
}

impl ProductRecord {
    pub fn new(name: &str, price: Money, stock: i64) -> Self {
        Self {
            name: name.trim().to_string(),
            price,
            stock,
        }
    }
}

impl Record for ProductRecord {
    const ENTITY: &'static str = "product";

    fn from_fields(fields: &Fields) -> Result<Self, StructureError> {
        let name = required_text(fields, "name")?;
        let price = required_money(fields, "price")?;
        let stock = optional_integer(fields, "stock")?.unwrap_or(0);
        Ok(Self::new(&name, price, stock))
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "name" => Some(FieldValue::Text(&self.name)),
            "price" => Some(FieldValue::Money(self.price)),
            "stock" => Some(FieldValue::Integer(self.stock)),
            _ => None,
        }
    }
}
