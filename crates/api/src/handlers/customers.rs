//! Handlers for the `/customers` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use crm_core::entities::customer::{customer_rules, CustomerRecord, MSG_EMAIL_TAKEN};
use crm_core::error::CoreError;
use crm_core::filter::CUSTOMER_FILTERS;
use crm_core::record::{Fields, Record};
use crm_core::types::DbId;
use crm_core::validation::evaluator::validate_record;
use crm_core::validation::ingest::{parse_batch, validate_batch};
use crm_core::validation::rules::{FieldViolation, RuleKind, UniqueKeys};
use crm_db::models::customer::{CreateCustomer, Customer, UpdateCustomer};
use crm_db::repositories::{CustomerRepo, InsertOutcome};
use serde_json::Value;

use super::{
    batch_payload, check_batch_size, log_summary, record_from_body, violation_error, BulkResponse,
};
use crate::error::{AppError, AppResult};
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Customer",
        id,
    })
}

/// Storage-backed uniqueness state for `emails`, ignoring customer
/// `exclude_id`.
async fn email_keys(
    state: &AppState,
    emails: &[String],
    exclude_id: Option<DbId>,
) -> AppResult<UniqueKeys> {
    let existing = CustomerRepo::existing_emails(&state.pool, emails, exclude_id).await?;
    Ok(UniqueKeys::new().with_existing("email", existing))
}

/// GET /api/v1/customers
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<DataResponse<Vec<Customer>>>> {
    let spec = ListParams::new(params).resolve(&CUSTOMER_FILTERS)?;
    let customers =
        CustomerRepo::list(&state.pool, spec.filter.as_ref(), spec.ordering, spec.page).await?;
    Ok(Json(DataResponse { data: customers }))
}

/// POST /api/v1/customers
///
/// Runs the same rule table as bulk ingestion. A taken email is a 409.
pub async fn create(
    State(state): State<AppState>,
    Json(fields): Json<Fields>,
) -> AppResult<(StatusCode, Json<DataResponse<Customer>>)> {
    let record: CustomerRecord = record_from_body(&fields)?;
    let keys = email_keys(&state, std::slice::from_ref(&record.email), None).await?;
    validate_record(&record, customer_rules(), &keys).map_err(violation_error)?;

    let customer = CustomerRepo::create(&state.pool, &CreateCustomer::from(&record)).await?;
    tracing::info!(customer_id = customer.id, "Customer created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: customer })))
}

/// POST /api/v1/customers/bulk
///
/// Validates every record independently and stores the accepted ones.
/// Rejected records are reported in `results` and do not affect the rest.
pub async fn bulk_create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<BulkResponse<CustomerRecord, Customer>>>> {
    let batch = batch_payload(body, "customers")?;
    let records = parse_batch::<CustomerRecord>(&batch)?;
    check_batch_size(records.len(), state.config.max_batch_size)?;

    let emails: Vec<String> = records.iter().map(|r| r.email.clone()).collect();
    let keys = email_keys(&state, &emails, None).await?;
    let mut result = validate_batch(records, customer_rules(), keys);

    let rows: Vec<(usize, CreateCustomer)> = result
        .accepted()
        .map(|(index, record)| (index, CreateCustomer::from(record)))
        .collect();

    // A concurrent writer can still take an email between the lookup above
    // and the insert; those rows come back as duplicates.
    let mut created = Vec::with_capacity(rows.len());
    for (index, outcome) in CustomerRepo::insert_each(&state.pool, rows).await? {
        match outcome {
            InsertOutcome::Inserted(customer) => created.push(customer),
            InsertOutcome::Duplicate => {
                result.reject(
                    index,
                    FieldViolation {
                        field: "email",
                        rule_type: RuleKind::Unique.name(),
                        message: MSG_EMAIL_TAKEN.to_string(),
                    },
                );
            }
        }
    }

    log_summary(CustomerRecord::ENTITY, &result.summary);
    Ok(Json(DataResponse {
        data: BulkResponse {
            summary: result.summary,
            results: result.outcomes,
            created,
        },
    }))
}

/// GET /api/v1/customers/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Customer>>> {
    let customer = CustomerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: customer }))
}

/// PUT /api/v1/customers/{id}
///
/// Unset fields keep their stored value; the merged customer is validated
/// again before it is written.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateCustomer>,
) -> AppResult<Json<DataResponse<Customer>>> {
    let existing = CustomerRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let record = input.apply_to(&existing);
    let keys = email_keys(&state, std::slice::from_ref(&record.email), Some(id)).await?;
    validate_record(&record, customer_rules(), &keys).map_err(violation_error)?;

    let customer = CustomerRepo::update(&state.pool, id, &CreateCustomer::from(&record))
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: customer }))
}

/// DELETE /api/v1/customers/{id}
///
/// Also removes the customer's orders.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if CustomerRepo::delete(&state.pool, id).await? {
        tracing::info!(customer_id = id, "Customer deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
