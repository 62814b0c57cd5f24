//! Product entity model and DTOs.

use crm_core::entities::product::ProductRecord;
use crm_core::error::CoreError;
use crm_core::money::Money;
use crm_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A product row from the `products` table. Price is stored in cents.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    #[sqlx(rename = "price_cents", try_from = "i64")]
    pub price: Money,
    pub stock: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Column values for an insert or a full-row update.
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub name: String,
    pub price: Money,
    pub stock: i32,
}

impl TryFrom<&ProductRecord> for CreateProduct {
    type Error = CoreError;

    fn try_from(record: &ProductRecord) -> Result<Self, Self::Error> {
        let stock = i32::try_from(record.stock)
            .map_err(|_| CoreError::Validation("stock is too large".to_string()))?;
        Ok(Self {
            name: record.name.clone(),
            price: record.price,
            stock,
        })
    }
}

/// DTO for updating a product. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
}

impl UpdateProduct {
    /// Merge onto `existing`, producing the record to re-validate.
    pub fn apply_to(&self, existing: &Product) -> ProductRecord {
        ProductRecord::new(
            self.name.as_deref().unwrap_or(&existing.name),
            self.price.unwrap_or(existing.price),
            self.stock.unwrap_or(i64::from(existing.stock)),
        )
    }
}
