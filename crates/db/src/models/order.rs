//! Order entity model and DTOs.

use crm_core::money::Money;
use crm_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::customer::Customer;
use crate::models::product::Product;

/// An order row from the `orders` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub customer_id: DbId,
    #[sqlx(rename = "total_amount_cents", try_from = "i64")]
    pub total_amount: Money,
    pub order_date: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An order together with its customer and products, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Customer,
    pub products: Vec<Product>,
}

/// Values for a new order. The total is computed by the caller from the
/// current product prices.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub customer_id: DbId,
    pub product_ids: Vec<DbId>,
    pub total_amount: Money,
    /// Defaults to the current time if omitted.
    pub order_date: Option<Timestamp>,
}

/// A product linked to an order.
#[derive(Debug, Clone, FromRow)]
pub struct OrderProductRow {
    pub order_id: DbId,
    #[sqlx(flatten)]
    pub product: Product,
}
