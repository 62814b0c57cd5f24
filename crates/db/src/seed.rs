//! Demo data for local development.
//!
//! Seeding is get-or-create: products are matched by name and customers by
//! email, so running it twice leaves the database unchanged.

use crm_core::entities::customer::CustomerRecord;
use crm_core::money::Money;
use sqlx::PgPool;

use crate::models::customer::CreateCustomer;
use crate::models::product::CreateProduct;
use crate::repositories::{CustomerRepo, ProductRepo};

/// How many rows a seeding run created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub products_created: usize,
    pub customers_created: usize,
}

fn demo_products() -> [CreateProduct; 3] {
    [
        ("Laptop", 99_999, 10),
        ("Mouse", 2_550, 100),
        ("Keyboard", 4_500, 50),
    ]
    .map(|(name, cents, stock)| CreateProduct {
        name: name.to_string(),
        price: Money::from_cents(cents),
        stock,
    })
}

fn demo_customers() -> [CustomerRecord; 2] {
    [
        CustomerRecord::new("Alice", "alice@example.com", Some("+1234567890")),
        CustomerRecord::new("Bob", "bob@example.com", Some("123-456-7890")),
    ]
}

/// Create the demo products and customers that do not exist yet.
pub async fn run(pool: &PgPool) -> Result<SeedReport, sqlx::Error> {
    let mut report = SeedReport::default();

    for product in demo_products() {
        if ProductRepo::find_by_name(pool, &product.name).await?.is_none() {
            ProductRepo::create(pool, &product).await?;
            tracing::info!(name = %product.name, "Seeded product");
            report.products_created += 1;
        }
    }

    for record in demo_customers() {
        if CustomerRepo::find_by_email(pool, &record.email).await?.is_none() {
            CustomerRepo::create(pool, &CreateCustomer::from(&record)).await?;
            tracing::info!(email = %record.email, "Seeded customer");
            report.customers_created += 1;
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crm_core::entities::customer::customer_rules;
    use crm_core::entities::product::{product_rules, ProductRecord};
    use crm_core::validation::evaluator::validate_record;
    use crm_core::validation::rules::UniqueKeys;

    #[test]
    fn demo_data_passes_the_rule_tables() {
        for customer in demo_customers() {
            assert!(validate_record(&customer, customer_rules(), &UniqueKeys::new()).is_ok());
        }
        for product in demo_products() {
            let record = ProductRecord::new(&product.name, product.price, i64::from(product.stock));
            assert!(validate_record(&record, product_rules(), &UniqueKeys::new()).is_ok());
        }
    }
}
