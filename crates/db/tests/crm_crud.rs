//! Repository tests against a real PostgreSQL database.
//!
//! Each test gets a fresh database with migrations applied. They need
//! `DATABASE_URL` to point at a server and are skipped by default; run them
//! with `cargo test -p crm-db -- --ignored`.

use crm_core::entities::customer::CustomerRecord;
use crm_core::filter::{Predicate, CUSTOMER_FILTERS, ORDER_FILTERS, PRODUCT_FILTERS};
use crm_core::money::Money;
use crm_db::models::customer::CreateCustomer;
use crm_db::models::order::CreateOrder;
use crm_db::models::product::CreateProduct;
use crm_db::pagination::Page;
use crm_db::repositories::{CustomerRepo, InsertOutcome, OrderRepo, ProductRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_customer(name: &str, email: &str) -> CreateCustomer {
    CreateCustomer::from(&CustomerRecord::new(name, email, None))
}

fn new_product(name: &str, cents: i64, stock: i32) -> CreateProduct {
    CreateProduct {
        name: name.to_string(),
        price: Money::from_cents(cents),
        stock,
    }
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_customer_crud(pool: PgPool) {
    let created = CustomerRepo::create(&pool, &new_customer("Alice", "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(created.email, "alice@example.com");

    let found = CustomerRepo::find_by_id(&pool, created.id).await.unwrap();
    assert_eq!(found.as_ref().map(|c| c.id), Some(created.id));

    let updated = CustomerRepo::update(&pool, created.id, &new_customer("Alicia", "alice@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "Alicia");

    assert!(CustomerRepo::delete(&pool, created.id).await.unwrap());
    assert!(!CustomerRepo::delete(&pool, created.id).await.unwrap());
    assert!(CustomerRepo::find_by_id(&pool, created.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_duplicate_email_rejected(pool: PgPool) {
    CustomerRepo::create(&pool, &new_customer("Sam", "sam@example.com"))
        .await
        .unwrap();
    let err = CustomerRepo::create(&pool, &new_customer("Sam 2", "sam@example.com"))
        .await
        .unwrap_err();
    assert!(crm_db::is_unique_violation(&err));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_existing_emails_excludes_self(pool: PgPool) {
    let alice = CustomerRepo::create(&pool, &new_customer("Alice", "alice@example.com"))
        .await
        .unwrap();
    let emails = vec!["alice@example.com".to_string(), "nobody@example.com".to_string()];

    let taken = CustomerRepo::existing_emails(&pool, &emails, None).await.unwrap();
    assert_eq!(taken, vec!["alice@example.com".to_string()]);

    let taken = CustomerRepo::existing_emails(&pool, &emails, Some(alice.id))
        .await
        .unwrap();
    assert!(taken.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_insert_each_isolates_duplicates(pool: PgPool) {
    CustomerRepo::create(&pool, &new_customer("Existing", "taken@example.com"))
        .await
        .unwrap();

    let outcomes = CustomerRepo::insert_each(
        &pool,
        vec![
            (0, new_customer("Ann", "ann@example.com")),
            (2, new_customer("Racer", "taken@example.com")),
            (3, new_customer("Bo", "bo@example.com")),
        ],
    )
    .await
    .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[0], (0, InsertOutcome::Inserted(_))));
    assert_eq!(outcomes[1], (2, InsertOutcome::Duplicate));
    assert!(matches!(outcomes[2], (3, InsertOutcome::Inserted(_))));

    let all = CustomerRepo::list(&pool, None, CUSTOMER_FILTERS.default_ordering, Page::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_customer_list_filters(pool: PgPool) {
    for (name, email) in [("Alice", "alice@example.com"), ("Bob", "bob@example.com")] {
        CustomerRepo::create(&pool, &new_customer(name, email)).await.unwrap();
    }

    let filter = CUSTOMER_FILTERS
        .parse([("name__icontains", "LIC")])
        .unwrap();
    let found = CustomerRepo::list(
        &pool,
        filter.as_ref(),
        CUSTOMER_FILTERS.default_ordering,
        Page::default(),
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Alice");
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_product_price_round_trips_as_cents(pool: PgPool) {
    let product = ProductRepo::create(&pool, &new_product("Laptop", 99_999, 10))
        .await
        .unwrap();
    assert_eq!(product.price, Money::from_cents(99_999));
    assert_eq!(product.price.to_string(), "999.99");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_product_list_sorted_by_price(pool: PgPool) {
    ProductRepo::insert_many(
        &pool,
        &[
            new_product("Laptop", 99_999, 10),
            new_product("Mouse", 2_550, 100),
            new_product("Keyboard", 4_500, 50),
        ],
    )
    .await
    .unwrap();

    let filter = PRODUCT_FILTERS.parse([("price__lt", "100")]).unwrap();
    let ordering = PRODUCT_FILTERS.ordering(Some("-price")).unwrap();
    let found = ProductRepo::list(&pool, filter.as_ref(), ordering, Page::default())
        .await
        .unwrap();
    let names: Vec<_> = found.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Keyboard", "Mouse"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_negative_stock_violates_check(pool: PgPool) {
    let result = ProductRepo::create(&pool, &new_product("Broken", 100, -1)).await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_order_create_and_details(pool: PgPool) {
    let alice = CustomerRepo::create(&pool, &new_customer("Alice", "alice@example.com"))
        .await
        .unwrap();
    let products = ProductRepo::insert_many(
        &pool,
        &[new_product("Laptop", 99_999, 10), new_product("Mouse", 2_550, 100)],
    )
    .await
    .unwrap();

    let order = OrderRepo::create(
        &pool,
        &CreateOrder {
            customer_id: alice.id,
            product_ids: vec![products[1].id, products[0].id],
            total_amount: Money::from_cents(102_549),
            order_date: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(order.total_amount.to_string(), "1025.49");

    let details = OrderRepo::details(&pool, vec![order.clone()]).await.unwrap();
    assert_eq!(details[0].customer.id, alice.id);
    let linked: Vec<_> = details[0].products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(linked, vec!["Mouse", "Laptop"]);

    let filter = ORDER_FILTERS.parse([("customer_name", "Alice")]).unwrap();
    let listed = OrderRepo::list(
        &pool,
        filter.as_ref(),
        ORDER_FILTERS.default_ordering,
        Page::default(),
    )
    .await
    .unwrap();
    assert_eq!(listed, vec![order]);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_deleting_customer_cascades_orders(pool: PgPool) {
    let bob = CustomerRepo::create(&pool, &new_customer("Bob", "bob@example.com"))
        .await
        .unwrap();
    let product = ProductRepo::create(&pool, &new_product("Mouse", 2_550, 100))
        .await
        .unwrap();
    let order = OrderRepo::create(
        &pool,
        &CreateOrder {
            customer_id: bob.id,
            product_ids: vec![product.id],
            total_amount: product.price,
            order_date: None,
        },
    )
    .await
    .unwrap();

    assert!(CustomerRepo::delete(&pool, bob.id).await.unwrap());
    assert!(OrderRepo::find_by_id(&pool, order.id).await.unwrap().is_none());
    assert!(OrderRepo::products_for_orders(&pool, &[order.id])
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_seed_is_idempotent(pool: PgPool) {
    let first = crm_db::seed::run(&pool).await.unwrap();
    assert_eq!(first.products_created, 3);
    assert_eq!(first.customers_created, 2);

    let second = crm_db::seed::run(&pool).await.unwrap();
    assert_eq!(second, crm_db::seed::SeedReport::default());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_filter_predicate_negation(pool: PgPool) {
    for (name, email) in [("Alice", "alice@example.com"), ("Bob", "bob@example.com")] {
        CustomerRepo::create(&pool, &new_customer(name, email)).await.unwrap();
    }
    let filter = !Predicate::starts_with("email", "ali");
    let found = CustomerRepo::list(
        &pool,
        Some(&filter),
        CUSTOMER_FILTERS.default_ordering,
        Page::default(),
    )
    .await
    .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Bob");
}
