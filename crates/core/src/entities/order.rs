//! Order records, their rule table and total computation.

use std::collections::HashSet;
use std::sync::LazyLock;

use serde::Serialize;

use crate::error::CoreError;
use crate::money::Money;
use crate::record::{
    optional_timestamp, required_id, required_id_list, FieldValue, Fields, Record, StructureError,
};
use crate::types::{DbId, Timestamp};
use crate::validation::rules::{RuleKind, ValidationRule};

static ORDER_RULES: LazyLock<Vec<ValidationRule>> = LazyLock::new(|| {
    vec![ValidationRule::new(
        "product_ids",
        RuleKind::NonEmptyList,
        "at least one product must be selected",
    )]
});

/// The ordered rule table applied to every order record.
pub fn order_rules() -> &'static [ValidationRule] {
    &ORDER_RULES
}

/// A candidate order. Product IDs are de-duplicated, keeping first
/// occurrence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRecord {
    pub customer_id: DbId,
    pub product_ids: Vec<DbId>,
    pub order_date: Option<Timestamp>,
}

impl OrderRecord {
    pub fn new(customer_id: DbId, product_ids: Vec<DbId>, order_date: Option<Timestamp>) -> Self {
        let mut seen = HashSet::new();
        let product_ids = product_ids.into_iter().filter(|id| seen.insert(*id)).collect();
        Self {
            customer_id,
            product_ids,
            order_date,
        }
    }
}

impl Record for OrderRecord {
    const ENTITY: &'static str = "order";

    fn from_fields(fields: &Fields) -> Result<Self, StructureError> {
        Ok(Self::new(
            required_id(fields, "customer_id")?,
            required_id_list(fields, "product_ids")?,
            optional_timestamp(fields, "order_date")?,
        ))
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "customer_id" => Some(FieldValue::Id(self.customer_id)),
            "product_ids" => Some(FieldValue::Ids(&self.product_ids)),
            "order_date" => self.order_date.map(FieldValue::Timestamp),
            _ => None,
        }
    }
}

/// IDs in `requested` that are missing from `found`, in request order.
pub fn missing_ids(requested: &[DbId], found: &[DbId]) -> Vec<DbId> {
    let found: HashSet<DbId> = found.iter().copied().collect();
    requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id))
        .collect()
}

/// Exact sum of product prices.
pub fn compute_total<I>(prices: I) -> Result<Money, CoreError>
where
    I: IntoIterator<Item = Money>,
{
    prices
        .into_iter()
        .try_fold(Money::ZERO, Money::checked_add)
        .ok_or_else(|| CoreError::Validation("order total is out of range".to_string()))
}
