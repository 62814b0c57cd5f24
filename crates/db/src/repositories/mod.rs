//! Repository structs, one per table. Every method takes the pool (or a
//! connection) as its first argument and returns `sqlx::Error` unchanged.

mod customer_repo;
mod order_repo;
mod product_repo;

pub use customer_repo::CustomerRepo;
pub use order_repo::OrderRepo;
pub use product_repo::ProductRepo;

/// Result of inserting one row of a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome<T> {
    Inserted(T),
    /// The row collided with a unique constraint and was rolled back.
    Duplicate,
}
