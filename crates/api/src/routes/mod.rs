pub mod customers;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Every resource is registered here explicitly:
///
/// ```text
/// /customers                 list, create
/// /customers/bulk            bulk ingestion
/// /customers/{id}            get, update, delete
///
/// /products                  list, create
/// /products/bulk             bulk ingestion
/// /products/{id}             get, update, delete
///
/// /orders                    list, create
/// /orders/{id}               get, delete
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/products", products::router())
        .nest("/orders", orders::router())
}
