//! Repository for the `customers` table.

use crm_core::filter::{Ordering, Predicate};
use crm_core::types::DbId;
use sqlx::{Connection, PgPool};

use super::InsertOutcome;
use crate::filter_sql::{bind_filters, list_statement};
use crate::is_unique_violation;
use crate::models::customer::{CreateCustomer, Customer};
use crate::pagination::Page;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, email, phone, created_at, updated_at";

/// Provides CRUD operations for customers.
pub struct CustomerRepo;

impl CustomerRepo {
    /// Insert a new customer, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateCustomer) -> Result<Customer, sqlx::Error> {
        let query = format!(
            "INSERT INTO customers (name, email, phone)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .fetch_one(pool)
            .await
    }

    /// Insert validated customers one by one inside a single transaction.
    ///
    /// Each row gets its own savepoint, so a row that hits the email
    /// constraint is rolled back alone and reported as
    /// [`InsertOutcome::Duplicate`]. Any other error aborts the whole write.
    pub async fn insert_each<I>(
        pool: &PgPool,
        rows: I,
    ) -> Result<Vec<(usize, InsertOutcome<Customer>)>, sqlx::Error>
    where
        I: IntoIterator<Item = (usize, CreateCustomer)>,
    {
        let query = format!(
            "INSERT INTO customers (name, email, phone)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );

        let rows: Vec<(usize, CreateCustomer)> = rows.into_iter().collect();
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = pool.begin().await?;
        let mut outcomes = Vec::with_capacity(rows.len());
        for (index, input) in rows {
            let mut savepoint = tx.begin().await?;
            let inserted = sqlx::query_as::<_, Customer>(&query)
                .bind(&input.name)
                .bind(&input.email)
                .bind(&input.phone)
                .fetch_one(&mut *savepoint)
                .await;
            match inserted {
                Ok(row) => {
                    savepoint.commit().await?;
                    outcomes.push((index, InsertOutcome::Inserted(row)));
                }
                Err(e) if is_unique_violation(&e) => {
                    savepoint.rollback().await?;
                    outcomes.push((index, InsertOutcome::Duplicate));
                }
                Err(e) => return Err(e),
            }
        }
        tx.commit().await?;
        Ok(outcomes)
    }

    /// Find a customer by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find all customers whose ID is in `ids`. Order is unspecified.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE id = ANY($1)");
        sqlx::query_as::<_, Customer>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Find a customer by (normalized) email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customers WHERE email = $1");
        sqlx::query_as::<_, Customer>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Which of `emails` are already stored, ignoring the customer
    /// `exclude_id` (the row being updated).
    pub async fn existing_emails(
        pool: &PgPool,
        emails: &[String],
        exclude_id: Option<DbId>,
    ) -> Result<Vec<String>, sqlx::Error> {
        if emails.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, String>(
            "SELECT email FROM customers
             WHERE lower(email) = ANY($1)
               AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(emails)
        .bind(exclude_id)
        .fetch_all(pool)
        .await
    }

    /// List customers matching `filter`, sorted and paged.
    pub async fn list(
        pool: &PgPool,
        filter: Option<&Predicate>,
        ordering: Ordering,
        page: Page,
    ) -> Result<Vec<Customer>, sqlx::Error> {
        let base = format!("SELECT {COLUMNS} FROM customers");
        let (query, values) = list_statement(&base, filter, ordering);
        bind_filters(sqlx::query_as::<_, Customer>(&query), &values)
            .bind(page.limit)
            .bind(page.offset)
            .fetch_all(pool)
            .await
    }

    /// Replace every column of a customer with `input`.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &CreateCustomer,
    ) -> Result<Option<Customer>, sqlx::Error> {
        let query = format!(
            "UPDATE customers SET name = $2, email = $3, phone = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .fetch_optional(pool)
            .await
    }

    /// Delete a customer and, through the foreign key, their orders.
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
