//! Product API Handlers

use axum::extract::{Path, Query, State};
use shared::error::{ApiResponse, AppResult};
use shared::models::{Product, ProductCreate, ProductUpdate};
use shared::paging::Page;

use crate::api::PagingParams;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppJson;
use crate::utils::validation::parse_id;

/// POST /api/products
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    AppJson(payload): AppJson<ProductCreate>,
) -> AppResult<ApiResponse<Product>> {
    let product = state.products.create_product(user.id, payload).await?;
    Ok(ApiResponse::success(product))
}

/// GET /api/products?page&limit&query - caller's products
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(params): Query<PagingParams>,
) -> AppResult<ApiResponse<Page<Product>>> {
    let page = state.products.get_products(user.id, params.into()).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/products/{id} - public
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Product>> {
    let product_id = parse_id(&id, "productId")?;
    let product = state.products.get_product_by_id(product_id).await?;
    Ok(ApiResponse::success(product))
}

/// PUT /api/products/{id}
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ProductUpdate>,
) -> AppResult<ApiResponse<Product>> {
    let product_id = parse_id(&id, "productId")?;
    let product = state
        .products
        .update_product_by_id(user.id, product_id, payload)
        .await?;
    Ok(ApiResponse::success(product))
}

/// DELETE /api/products/{id} - archive
pub async fn archive(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let product_id = parse_id(&id, "productId")?;
    let archived = state
        .products
        .archive_product_by_id(user.id, product_id)
        .await?;
    Ok(ApiResponse::success(archived))
}
