use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    error::AppResult,
    models::{ProductDetail, ProductSummary},
    response::ApiResponse,
    routes::params::ProductSearchQuery,
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{handle}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("q" = Option<String>, Query, description = "Free-text title search")
    ),
    responses(
        (status = 200, description = "Product listing", body = ApiResponse<Vec<ProductSummary>>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductSearchQuery>,
) -> AppResult<Json<ApiResponse<Vec<ProductSummary>>>> {
    let resp =
        product_service::list_products(&state.commerce, query.q.as_deref(), &state.shutdown)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{handle}",
    params(
        ("handle" = String, Path, description = "Product handle")
    ),
    responses(
        (status = 200, description = "Product detail", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let resp = product_service::get_product(&state.commerce, &handle, &state.shutdown).await?;
    Ok(Json(resp))
}
