//! Record validation engine.
//!
//! Provides rule types, a pure-logic evaluator for a single record, and the
//! bulk ingestion coordinator that applies it across a batch.

pub mod evaluator;
pub mod ingest;
pub mod rules;
