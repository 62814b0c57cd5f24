//! Repository for the `orders` and `order_products` tables.

use std::collections::HashMap;

use crm_core::filter::{Ordering, Predicate};
use crm_core::types::DbId;
use sqlx::PgPool;

use super::CustomerRepo;
use crate::filter_sql::{bind_filters, list_statement};
use crate::models::order::{CreateOrder, Order, OrderDetail, OrderProductRow};
use crate::models::product::Product;
use crate::pagination::Page;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, customer_id, total_amount_cents, order_date, created_at, updated_at";

/// Orders joined with their customer's name, so listings can filter on it.
const ORDERS_WITH_CUSTOMER: &str = "(SELECT o.*, c.name AS customer_name
     FROM orders o JOIN customers c ON c.id = o.customer_id) AS orders";

/// Provides create/read/delete operations for orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Insert an order and its product links in one transaction.
    ///
    /// Product links keep the order of `input.product_ids`.
    pub async fn create(pool: &PgPool, input: &CreateOrder) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (customer_id, total_amount_cents, order_date)
             VALUES ($1, $2, COALESCE($3, NOW()))
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(input.customer_id)
            .bind(input.total_amount.cents())
            .bind(input.order_date)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO order_products (order_id, product_id, position)
             SELECT $1, product_id, position::INTEGER
             FROM UNNEST($2::BIGINT[]) WITH ORDINALITY AS t(product_id, position)",
        )
        .bind(order.id)
        .bind(&input.product_ids)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Find an order by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List orders matching `filter`, sorted and paged.
    pub async fn list(
        pool: &PgPool,
        filter: Option<&Predicate>,
        ordering: Ordering,
        page: Page,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let base = format!("SELECT {COLUMNS} FROM {ORDERS_WITH_CUSTOMER}");
        let (query, values) = list_statement(&base, filter, ordering);
        bind_filters(sqlx::query_as::<_, Order>(&query), &values)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool)
            .await
    }

    /// Products linked to any of `order_ids`, in link order per order.
    pub async fn products_for_orders(
        pool: &PgPool,
        order_ids: &[DbId],
    ) -> Result<Vec<OrderProductRow>, sqlx::Error> {
        sqlx::query_as::<_, OrderProductRow>(
            "SELECT op.order_id, p.id, p.name, p.price_cents, p.stock, p.created_at, p.updated_at
             FROM order_products op
             JOIN products p ON p.id = op.product_id
             WHERE op.order_id = ANY($1)
             ORDER BY op.order_id, op.position",
        )
        .bind(order_ids)
        .fetch_all(pool)
        .await
    }

    /// Attach customer and products to each order, preserving order.
    pub async fn details(
        pool: &PgPool,
        orders: Vec<Order>,
    ) -> Result<Vec<OrderDetail>, sqlx::Error> {
        let order_ids: Vec<DbId> = orders.iter().map(|o| o.id).collect();
        let mut customer_ids: Vec<DbId> = orders.iter().map(|o| o.customer_id).collect();
        customer_ids.sort_unstable();
        customer_ids.dedup();

        let customers: HashMap<DbId, _> = CustomerRepo::find_by_ids(pool, &customer_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut products: HashMap<DbId, Vec<Product>> = HashMap::new();
        for row in Self::products_for_orders(pool, &order_ids).await? {
            products.entry(row.order_id).or_default().push(row.product);
        }

        orders
            .into_iter()
            .map(|order| -> Result<OrderDetail, sqlx::Error> {
                // The foreign key cascades, so a missing customer means the
                // order was deleted concurrently.
                let customer = customers
                    .get(&order.customer_id)
                    .cloned()
                    .ok_or(sqlx::Error::RowNotFound)?;
                let products = products.remove(&order.id).unwrap_or_default();
                Ok(OrderDetail {
                    order,
                    customer,
                    products,
                })
            })
            .collect()
    }

    /// Delete an order and its product links. Returns `true` if a row was
    /// removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
