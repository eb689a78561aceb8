//! 商品处理器
//!
//! 顺序固定：请求体校验（提取器）→ 解析 id → 调用服务 → 组装响应。

use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Json,
};

use super::{
    id::{IdError, ProductId},
    model::{
        CreateProductInput, ProductListResponse, ProductResponse, ProductUpdatedResponse,
        UpdateProductInput,
    },
};
use crate::app::AppState;
use crate::core::{error::CoreError, response::MessageResponse, validation::Validated};

pub const PRODUCT_NOT_FOUND: &str = "Product not found";
pub const PRODUCT_UPDATED: &str = "Product updated successfully";
pub const PRODUCT_REMOVED: &str = "Product removed successfully";

/// The raw `:id` segment. Taken as a `Result` so an unreadable segment is
/// decoded after the body, and fails the same way as a malformed id.
type IdSegment = Result<Path<String>, PathRejection>;

fn decode_id(segment: IdSegment) -> Result<ProductId, CoreError> {
    let Path(raw) = segment.map_err(|rejection| IdError::Unreadable(rejection.body_text()))?;
    Ok(raw.parse()?)
}

fn not_found(id: &ProductId) -> CoreError {
    CoreError::NotFound(format!("{PRODUCT_NOT_FOUND}: {id}"))
}

pub async fn create_product(
    State(state): State<AppState>,
    Validated(input): Validated<CreateProductInput>,
) -> Result<(StatusCode, Json<ProductResponse>), CoreError> {
    let product = state.product_service.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(ProductResponse { product })))
}

pub async fn get_product(
    State(state): State<AppState>,
    id: IdSegment,
) -> Result<Json<ProductResponse>, CoreError> {
    let id = decode_id(id)?;
    let product = state
        .product_service
        .get_product(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(ProductResponse { product }))
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductListResponse>, CoreError> {
    let products = state.product_service.list_products().await?;
    Ok(Json(ProductListResponse { products }))
}

pub async fn update_product(
    State(state): State<AppState>,
    id: IdSegment,
    Validated(patch): Validated<UpdateProductInput>,
) -> Result<Json<ProductUpdatedResponse>, CoreError> {
    let id = decode_id(id)?;
    let product = state
        .product_service
        .update_product(&id, patch)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(ProductUpdatedResponse {
        message: PRODUCT_UPDATED.to_string(),
        product,
    }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    id: IdSegment,
) -> Result<Json<MessageResponse>, CoreError> {
    let id = decode_id(id)?;
    state
        .product_service
        .delete_product(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(MessageResponse::new(PRODUCT_REMOVED)))
}
