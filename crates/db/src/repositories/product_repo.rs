//! Repository for the `products` table.

use crm_core::filter::{Ordering, Predicate};
use crm_core::types::DbId;
use sqlx::PgPool;

use crate::filter_sql::{bind_filters, list_statement};
use crate::models::product::{CreateProduct, Product};
use crate::pagination::Page;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, price_cents, stock, created_at, updated_at";

/// Provides CRUD operations for products.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a new product, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, price_cents, stock)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(input.price.cents())
            .bind(input.stock)
            .fetch_one(pool)
            .await
    }

    /// Insert several validated products in one transaction, returning the
    /// created rows in input order. Either all rows are written or none.
    pub async fn insert_many(
        pool: &PgPool,
        inputs: &[CreateProduct],
    ) -> Result<Vec<Product>, sqlx::Error> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "INSERT INTO products (name, price_cents, stock)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );

        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let row = sqlx::query_as::<_, Product>(&query)
                .bind(&input.name)
                .bind(input.price.cents())
                .bind(input.stock)
                .fetch_one(&mut *tx)
                .await?;
            created.push(row);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Find a product by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find all products whose ID is in `ids`. Order is unspecified.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = ANY($1)");
        sqlx::query_as::<_, Product>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Find the oldest product with exactly this name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE name = $1 ORDER BY id LIMIT 1");
        sqlx::query_as::<_, Product>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// List products matching `filter`, sorted and paged.
    pub async fn list(
        pool: &PgPool,
        filter: Option<&Predicate>,
        ordering: Ordering,
        page: Page,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let base = format!("SELECT {COLUMNS} FROM products");
        let (query, values) = list_statement(&base, filter, ordering);
        bind_filters(sqlx::query_as::<_, Product>(&query), &values)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool)
            .await
    }

    /// Replace every column of a product with `input`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CreateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET name = $2, price_cents = $3, stock = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.price.cents())
            .bind(input.stock)
            .fetch_optional(pool)
            .await
    }

    /// Delete a product. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
