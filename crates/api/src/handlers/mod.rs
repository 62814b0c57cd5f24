pub mod customers;
pub mod orders;
pub mod products;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use crm_core::error::CoreError;
use crm_core::record::{Fields, Record};
use crm_core::validation::ingest::{BatchSummary, RecordOutcome};
use crm_core::validation::rules::FieldViolation;
use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Payload of a bulk ingestion response.
///
/// `results` holds one outcome per submitted record in input order;
/// `created` holds the stored rows of the accepted records.
#[derive(Debug, Serialize)]
pub struct BulkResponse<R: Serialize, T: Serialize> {
    pub summary: BatchSummary,
    pub results: Vec<RecordOutcome<R>>,
    pub created: Vec<T>,
}

/// Extract the record list stored under `key` from a bulk request body.
///
/// A body that is not JSON, not an object, or lacks `key` is a malformed
/// batch.
pub(crate) fn batch_payload(
    body: Result<Json<Value>, JsonRejection>,
    key: &str,
) -> Result<Value, CoreError> {
    let Json(mut body) = body.map_err(|rejection| {
        CoreError::malformed(None, format!("request body is not valid JSON: {rejection}"))
    })?;
    body.as_object_mut()
        .and_then(|obj| obj.remove(key))
        .ok_or_else(|| {
            CoreError::malformed(None, format!("request body must be an object with a '{key}' list"))
        })
}

/// Refuse batches larger than the configured maximum.
pub(crate) fn check_batch_size(len: usize, max: usize) -> AppResult<()> {
    if len > max {
        return Err(AppError::BadRequest(format!(
            "batch of {len} records exceeds the maximum of {max}"
        )));
    }
    Ok(())
}

/// Build a single record from a request body, reporting structural
/// problems as validation errors.
pub(crate) fn record_from_body<R: Record>(fields: &Fields) -> AppResult<R> {
    R::from_fields(fields).map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}

/// Map a rule failure on a single-record write to an HTTP error: a taken
/// unique value is a conflict, anything else a validation error.
pub(crate) fn violation_error(violation: FieldViolation) -> AppError {
    if violation.rule_type == "unique" {
        AppError::Core(CoreError::Conflict(violation.message))
    } else {
        AppError::Core(CoreError::Validation(violation.message))
    }
}

pub(crate) fn log_summary(entity: &'static str, summary: &BatchSummary) {
    tracing::info!(
        entity,
        total = summary.total,
        accepted = summary.accepted,
        rejected = summary.rejected,
        "Bulk ingestion finished"
    );
}
