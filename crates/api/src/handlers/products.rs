//! Handlers for the `/products` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use crm_core::entities::product::{product_rules, ProductRecord};
use crm_core::error::CoreError;
use crm_core::filter::PRODUCT_FILTERS;
use crm_core::record::{Fields, Record};
use crm_core::types::DbId;
use crm_core::validation::evaluator::validate_record;
use crm_core::validation::ingest::{parse_batch, validate_batch};
use crm_core::validation::rules::UniqueKeys;
use crm_db::models::product::{CreateProduct, Product, UpdateProduct};
use crm_db::repositories::ProductRepo;
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
        entity: "Product",
        id,
    })
}

/// GET /api/v1/products
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<DataResponse<Vec<Product>>>> {
    let spec = ListParams::new(params).resolve(&PRODUCT_FILTERS)?;
    let products =
        ProductRepo::list(&state.pool, spec.filter.as_ref(), spec.ordering, spec.page).await?;
    Ok(Json(DataResponse { data: products }))
}

/// POST /api/v1/products
pub async fn create(
    State(state): State<AppState>,
    Json(fields): Json<Fields>,
) -> AppResult<(StatusCode, Json<DataResponse<Product>>)> {
    let record: ProductRecord = record_from_body(&fields)?;
    validate_record(&record, product_rules(), &UniqueKeys::new()).map_err(violation_error)?;

    let product = ProductRepo::create(&state.pool, &CreateProduct::try_from(&record)?).await?;
    tracing::info!(product_id = product.id, "Product created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// POST /api/v1/products/bulk
///
/// Accepted products are written in one transaction.
pub async fn bulk_create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<DataResponse<BulkResponse<ProductRecord, Product>>>> {
    let batch = batch_payload(body, "products")?;
    let records = parse_batch::<ProductRecord>(&batch)?;
    check_batch_size(records.len(), state.config.max_batch_size)?;

    let result = validate_batch(records, product_rules(), UniqueKeys::new());
    let rows = result
        .accepted()
        .map(|(_, record)| CreateProduct::try_from(record))
        .collect::<Result<Vec<_>, CoreError>>()?;
    let created = ProductRepo::insert_many(&state.pool, &rows).await?;

    log_summary(ProductRecord::ENTITY, &result.summary);
    Ok(Json(DataResponse {
        data: BulkResponse {
            summary: result.summary,
            results: result.outcomes,
            created,
        },
    }))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Product>>> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: product }))
}

/// PUT /api/v1/products/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<Product>>> {
    let existing = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let record = input.apply_to(&existing);
    validate_record(&record, product_rules(), &UniqueKeys::new()).map_err(violation_error)?;

    let product = ProductRepo::update(&state.pool, id, &CreateProduct::try_from(&record)?)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: product }))
}

/// DELETE /api/v1/products/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if ProductRepo::delete(&state.pool, id).await? {
        tracing::info!(product_id = id, "Product deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
