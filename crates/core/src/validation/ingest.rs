//! Bulk ingestion coordinator.
//!
//! Takes a submitted batch, builds a typed record from every element,
//! validates each record independently and reports one outcome per record
//! in input order. A structurally malformed batch fails as a whole; a record
//! that fails a rule is only rejected.

use serde::Serialize;
use serde_json::Value;

use super::evaluator::validate_record;
use super::rules::{unique_key, FieldViolation, RuleKind, UniqueKeys, ValidationRule};
use crate::error::CoreError;
use crate::record::Record;

/// Whether a record made it through validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Accepted,
    Rejected {
        reason: String,
        field: &'static str,
        rule: &'static str,
    },
}

/// The outcome for the record at `index` of the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordOutcome<R> {
    pub index: usize,
    #[serde(flatten)]
    pub status: OutcomeStatus,
    #[serde(skip)]
    pub record: R,
}

impl<R> RecordOutcome<R> {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, OutcomeStatus::Accepted)
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::Accepted => None,
            OutcomeStatus::Rejected { reason, .. } => Some(reason),
        }
    }
}

/// Accepted/rejected counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
}

/// Ordered per-record outcomes of one ingestion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult<R> {
    pub summary: BatchSummary,
    pub outcomes: Vec<RecordOutcome<R>>,
}

impl<R> BatchResult<R> {
    fn from_outcomes(outcomes: Vec<RecordOutcome<R>>) -> Self {
        let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
        Self {
            summary: BatchSummary {
                total: outcomes.len(),
                accepted,
                rejected: outcomes.len() - accepted,
            },
            outcomes,
        }
    }

    /// Accepted records with their batch index, in input order.
    pub fn accepted(&self) -> impl Iterator<Item = (usize, &R)> {
        self.outcomes
            .iter()
            .filter(|o| o.is_accepted())
            .map(|o| (o.index, &o.record))
    }

    /// Downgrade an accepted record to rejected after the fact, e.g. when
    /// storage refuses it. Returns `false` if `index` is out of range or the
    /// record was already rejected.
    pub fn reject(&mut self, index: usize, violation: FieldViolation) -> bool {
        let Some(outcome) = self.outcomes.get_mut(index) else {
            return false;
        };
        if !outcome.is_accepted() {
            return false;
        }
        outcome.status = OutcomeStatus::Rejected {
            reason: violation.message,
            field: violation.field,
            rule: violation.rule_type,
        };
        self.summary.accepted -= 1;
        self.summary.rejected += 1;
        true
    }
}

/// Parse every element of `batch` into a record.
///
/// Fails with [`CoreError::MalformedBatch`] if `batch` is not an array, an
/// element is not an object, or a record is structurally incomplete. No
/// partial result is produced.
pub fn parse_batch<R: Record>(batch: &Value) -> Result<Vec<R>, CoreError> {
    let items = batch
        .as_array()
        .ok_or_else(|| CoreError::malformed(None, "batch must be a list of records"))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let fields = item.as_object().ok_or_else(|| {
                CoreError::malformed(Some(index), format!("record {index} is not an object"))
            })?;
            R::from_fields(fields)
                .map_err(|e| CoreError::malformed(Some(index), format!("record {index}: {e}")))
        })
        .collect()
}

/// Validate already-parsed records and collect one outcome per record.
///
/// Accepted records claim their unique keys, so a later record with the same
/// key is rejected by the `Unique` rule.
pub fn validate_batch<R: Record>(
    records: Vec<R>,
    rules: &[ValidationRule],
    mut keys: UniqueKeys,
) -> BatchResult<R> {
    let unique_fields: Vec<&'static str> = rules
        .iter()
        .filter(|r| matches!(r.kind, RuleKind::Unique))
        .map(|r| r.field)
        .collect();

    let outcomes = records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let status = match validate_record(&record, rules, &keys) {
                Ok(()) => {
                    for &field in &unique_fields {
                        if let Some(key) = record.field(field).as_ref().and_then(unique_key) {
                            keys.claim(field, &key);
                        }
                    }
                    OutcomeStatus::Accepted
                }
                Err(violation) => OutcomeStatus::Rejected {
                    reason: violation.message,
                    field: violation.field,
                    rule: violation.rule_type,
                },
            };
            RecordOutcome {
                index,
                status,
                record,
            }
        })
        .collect();

    BatchResult::from_outcomes(outcomes)
}

/// Parse and validate a whole batch.
pub fn ingest<R: Record>(
    batch: &Value,
    rules: &[ValidationRule],
    keys: UniqueKeys,
) -> Result<BatchResult<R>, CoreError> {
    let records = parse_batch::<R>(batch)?;
    Ok(validate_batch(records, rules, keys))
}
