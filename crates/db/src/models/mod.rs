//! Row structs and DTOs, one module per table.

pub mod customer;
pub mod order;
pub mod product;
