//! Order API Handlers

use axum::extract::{Path, Query, State};
use shared::error::{ApiResponse, AppResult};
use shared::models::{OrderCreate, OrderDetail, OrderUpdate};
use shared::paging::Page;

use crate::api::PagingParams;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppJson;
use crate::utils::validation::parse_id;

/// POST /api/orders
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    AppJson(payload): AppJson<OrderCreate>,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order = state.orders.create_order(user.id, payload).await?;
    Ok(ApiResponse::success(order))
}

/// GET /api/orders?page&limit&query
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(params): Query<PagingParams>,
) -> AppResult<ApiResponse<Page<OrderDetail>>> {
    let page = state.orders.get_orders(user.id, params.into()).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order_id = parse_id(&id, "orderId")?;
    let order = state.orders.get_order_by_id(user.id, order_id).await?;
    Ok(ApiResponse::success(order))
}

/// PUT /api/orders/{id}
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<OrderUpdate>,
) -> AppResult<ApiResponse<OrderDetail>> {
    let order_id = parse_id(&id, "orderId")?;
    let order = state
        .orders
        .update_order_by_id(user.id, order_id, payload)
        .await?;
    Ok(ApiResponse::success(order))
}

/// DELETE /api/orders/{id} - archive (cancel) an order
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let order_id = parse_id(&id, "orderId")?;
    let canceled = state.orders.cancel_order_by_id(user.id, order_id).await?;
    Ok(ApiResponse::success(canceled))
}
