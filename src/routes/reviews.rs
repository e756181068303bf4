use axum::{Json, Router, extract::{Query, State}, routing::get};

use crate::{
    error::AppResult,
    marketing::Review,
    response::ApiResponse,
    routes::params::ReviewsQuery,
    services::marketing_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_reviews))
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(
        ("product_id" = String, Query, description = "Catalog product ID")
    ),
    responses(
        (status = 200, description = "Reviews for a product", body = ApiResponse<Vec<Review>>),
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> AppResult<Json<ApiResponse<Vec<Review>>>> {
    let resp = marketing_service::product_reviews(&state.marketing, &query.product_id).await?;
    Ok(Json(resp))
}
