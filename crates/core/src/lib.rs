//! Domain core for the CRM backend.
//!
//! Record types, the rule table per entity, the record validator, the bulk
//! ingestion coordinator and the filter predicate builder. Nothing in this
//! crate touches the database or HTTP.

pub mod entities;
pub mod error;
pub mod filter;
pub mod money;
pub mod record;
pub mod types;
pub mod validation;
