//! Record types and rule tables for each CRM entity.

pub mod customer;
pub mod order;
pub mod product;

/// Maximum length of a customer or product name in characters.
pub const MAX_NAME_LENGTH: usize = 255;
