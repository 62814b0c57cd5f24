//! Handlers for the `/orders` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use crm_core::entities::order::{compute_total, missing_ids, order_rules, OrderRecord};
use crm_core::error::CoreError;
use crm_core::filter::ORDER_FILTERS;
use crm_core::record::Fields;
use crm_core::types::DbId;
use crm_core::validation::evaluator::validate_record;
use crm_core::validation::rules::UniqueKeys;
use crm_db::models::order::{CreateOrder, OrderDetail};
use crm_db::repositories::{CustomerRepo, OrderRepo, ProductRepo};

use super::{record_from_body, violation_error};
use crate::error::{AppError, AppResult};
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Order",
        id,
    })
}

/// Load the full detail of one stored order.
async fn detail(state: &AppState, id: DbId) -> AppResult<OrderDetail> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    OrderRepo::details(&state.pool, vec![order])
        .await?
        .pop()
        .ok_or_else(|| not_found(id))
}

/// GET /api/v1/orders
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<DataResponse<Vec<OrderDetail>>>> {
    let spec = ListParams::new(params).resolve(&ORDER_FILTERS)?;
    let orders =
        OrderRepo::list(&state.pool, spec.filter.as_ref(), spec.ordering, spec.page).await?;
    let details = OrderRepo::details(&state.pool, orders).await?;
    Ok(Json(DataResponse { data: details }))
}

/// POST /api/v1/orders
///
/// The customer and every product must exist. The total is the sum of the
/// current product prices.
pub async fn create(
    State(state): State<AppState>,
    Json(fields): Json<Fields>,
) -> AppResult<(StatusCode, Json<DataResponse<OrderDetail>>)> {
    let record: OrderRecord = record_from_body(&fields)?;
    validate_record(&record, order_rules(), &UniqueKeys::new()).map_err(violation_error)?;

    if CustomerRepo::find_by_id(&state.pool, record.customer_id)
        .await?
        .is_none()
    {
        return Err(CoreError::Validation("invalid customer ID".to_string()).into());
    }

    let products = ProductRepo::find_by_ids(&state.pool, &record.product_ids).await?;
    let found: Vec<DbId> = products.iter().map(|p| p.id).collect();
    let missing = missing_ids(&record.product_ids, &found);
    if !missing.is_empty() {
        let ids: Vec<String> = missing.iter().map(DbId::to_string).collect();
        return Err(
            CoreError::Validation(format!("invalid product ID: {}", ids.join(", "))).into(),
        );
    }

    let total_amount = compute_total(products.iter().map(|p| p.price))?;
    let order = OrderRepo::create(
        &state.pool,
        &CreateOrder {
            customer_id: record.customer_id,
            product_ids: record.product_ids,
            total_amount,
            order_date: record.order_date,
        },
    )
    .await?;
    tracing::info!(order_id = order.id, total = %order.total_amount, "Order created");

    let detail = detail(&state, order.id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: detail })))
}

/// GET /api/v1/orders/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<OrderDetail>>> {
    Ok(Json(DataResponse {
        data: detail(&state, id).await?,
    }))
}

/// DELETE /api/v1/orders/{id}
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    if OrderRepo::delete(&state.pool, id).await? {
        tracing::info!(order_id = id, "Order deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
